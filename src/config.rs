use serde::{Deserialize, Serialize};

// Solver parameters (defaults; callers can override per request)
pub const DEFAULT_MAX_TIME_SECONDS: f64 = 60.0;
pub const DEFAULT_NUM_WORKERS: u32 = 8;
pub const DEFAULT_PROGRESS_INTERVAL: f64 = 5.0;

/// Search tunables for one solve run.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SolverConfig {
    /// Wall-clock budget for the search.
    pub time_limit_seconds: f64,
    /// Parallel search workers handed to the engine.
    pub worker_count: u32,
    /// Minimum spacing between two progress callbacks.
    pub progress_interval_seconds: f64,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            time_limit_seconds: DEFAULT_MAX_TIME_SECONDS,
            worker_count: DEFAULT_NUM_WORKERS,
            progress_interval_seconds: DEFAULT_PROGRESS_INTERVAL,
        }
    }
}

/// Weights for the soft-preference terms of the objective.
/// A weight of zero disables the corresponding term entirely.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PenaltyWeights {
    /// Per additional class sharing a room beyond the first.
    pub class_mix_per_extra_class: f64,
    /// Per unused bed (0 = don't care).
    pub empty_bed: f64,
    /// Safety net for a mixed-gender room; must stay at zero violations.
    pub cross_gender_room: f64,
    /// Per additional teacher in a shared room (prefers single rooms).
    pub teacher_shared_room: f64,
    /// Teacher placed on a corridor without their home class.
    pub teacher_wrong_corridor: f64,
    /// Per additional corridor a class is spread over beyond the first.
    pub class_split_across_corridors: f64,
}

impl Default for PenaltyWeights {
    fn default() -> Self {
        Self {
            class_mix_per_extra_class: 3.0,
            empty_bed: 0.0,
            cross_gender_room: 1000.0,
            teacher_shared_room: 2.0,
            teacher_wrong_corridor: 5.0,
            class_split_across_corridors: 4.0,
        }
    }
}
