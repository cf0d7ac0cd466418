//! Progress reporting decoupled from any particular frontend.
//!
//! The orchestrator never prints; it hands incumbent snapshots to an
//! injected observer, gated by a wall-clock throttle.

use log::info;
use std::time::{Duration, Instant};

/// Snapshot handed to observers when the search reports an incumbent.
#[derive(Debug, Clone)]
pub struct ProgressEvent {
    /// Wall-clock time since the search started.
    pub elapsed: Duration,
    /// Incumbents seen so far, this one included.
    pub incumbents_seen: u64,
    /// Current best objective; `None` before a first incumbent exists.
    pub best_objective: Option<f64>,
}

/// Receives incumbent notifications during a solve.
///
/// Callbacks run synchronously on the solving thread and must stay cheap;
/// anything slow or blocking stalls the search.
pub trait ProgressObserver: Send {
    fn on_incumbent(&mut self, event: &ProgressEvent);
}

/// Gates callbacks to at most one per wall-clock interval. The first
/// callback fires only after a full interval has passed, matching the
/// interactive reporter this replaces.
pub struct Throttle {
    interval: Duration,
    last_fired: Instant,
}

impl Throttle {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last_fired: Instant::now(),
        }
    }

    /// True when enough wall-clock time has passed since the last accepted
    /// event; accepting resets the window.
    pub fn ready(&mut self, now: Instant) -> bool {
        if now.duration_since(self.last_fired) >= self.interval {
            self.last_fired = now;
            true
        } else {
            false
        }
    }
}

/// Writes throttled progress lines to the log.
pub struct LogProgress;

impl ProgressObserver for LogProgress {
    fn on_incumbent(&mut self, event: &ProgressEvent) {
        let objective = event
            .best_objective
            .map(|o| format!("{o:.0}"))
            .unwrap_or_else(|| "unknown".to_string());
        info!(
            "[{:6.1}s] incumbents: {:5} | current objective: {}",
            event.elapsed.as_secs_f64(),
            event.incumbents_seen,
            objective
        );
    }
}

/// Counts callbacks and remembers the latest event.
#[derive(Default)]
pub struct CountingProgress {
    pub events: u64,
    pub last: Option<ProgressEvent>,
}

impl ProgressObserver for CountingProgress {
    fn on_incumbent(&mut self, event: &ProgressEvent) {
        self.events += 1;
        self.last = Some(event.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn throttle_gates_by_interval() {
        let mut throttle = Throttle::new(Duration::from_millis(100));
        let start = Instant::now();
        assert!(!throttle.ready(start));
        assert!(!throttle.ready(start + Duration::from_millis(50)));
        assert!(throttle.ready(start + Duration::from_millis(150)));
        // window resets on acceptance
        assert!(!throttle.ready(start + Duration::from_millis(200)));
        assert!(throttle.ready(start + Duration::from_millis(260)));
    }

    #[test]
    fn zero_interval_always_fires() {
        let mut throttle = Throttle::new(Duration::ZERO);
        let start = Instant::now();
        assert!(throttle.ready(start));
        assert!(throttle.ready(start));
    }

    #[test]
    fn counting_observer_records_events() {
        let mut observer = CountingProgress::default();
        observer.on_incumbent(&ProgressEvent {
            elapsed: Duration::from_secs(1),
            incumbents_seen: 1,
            best_objective: Some(4.0),
        });
        observer.on_incumbent(&ProgressEvent {
            elapsed: Duration::from_secs(2),
            incumbents_seen: 2,
            best_objective: Some(3.0),
        });
        assert_eq!(observer.events, 2);
        assert_eq!(observer.last.as_ref().unwrap().best_objective, Some(3.0));
    }
}
