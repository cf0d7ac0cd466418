use itertools::Itertools;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt;

// Type aliases for clarity
pub type PersonId = String;
pub type RoomId = String;
pub type ClassId = String;
pub type CorridorId = String;

/// Gender as tracked on the trip roster. Rooms are single-gender.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
pub enum Gender {
    #[serde(rename = "m")]
    M,
    #[serde(rename = "w")]
    W,
}

/// Whether a person travels as a student or as supervising staff.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Student,
    Teacher,
}

/// A person to be placed in exactly one room.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Person {
    pub id: PersonId,
    pub name: String,
    pub gender: Gender,
    pub role: Role,
    /// Class membership for students; for teachers a home-class affinity.
    #[serde(default)]
    pub class_id: Option<ClassId>,
    /// Upper bound on the total occupancy of whatever room this person gets.
    #[serde(default)]
    pub small_group_max: Option<u32>,
}

/// A room with a fixed number of beds, grouped onto a corridor.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Room {
    pub id: RoomId,
    pub name: String,
    pub capacity: u32,
    pub corridor: CorridorId,
}

/// Two people that must never share a room.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ForbiddenPair {
    pub a: PersonId,
    pub b: PersonId,
}

/// The complete input for one assignment run.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignmentInput {
    pub people: Vec<Person>,
    pub rooms: Vec<Room>,
    #[serde(default)]
    pub forbidden_pairs: Vec<ForbiddenPair>,
    /// Corridor labels; derived from the rooms when omitted.
    #[serde(default)]
    pub corridors: Option<Vec<CorridorId>>,
    /// Teachers that must end up on a given corridor.
    #[serde(default)]
    pub required_teachers: HashMap<CorridorId, Vec<PersonId>>,
}

impl AssignmentInput {
    /// Corridor labels for this run, falling back to the distinct labels
    /// present in the room inventory.
    pub fn corridor_labels(&self) -> Vec<CorridorId> {
        if let Some(corridors) = &self.corridors {
            if !corridors.is_empty() {
                return corridors.clone();
            }
        }
        self.rooms
            .iter()
            .map(|r| r.corridor.clone())
            .unique()
            .sorted()
            .collect()
    }
}

/// Snapshot of a person as placed in the final allocation.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Occupant {
    pub id: PersonId,
    pub name: String,
    pub gender: Gender,
    pub role: Role,
    pub class_id: Option<ClassId>,
}

/// Room id -> occupants, for occupied rooms only.
pub type Allocation = BTreeMap<RoomId, Vec<Occupant>>;

/// How the search terminated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SolveStatus {
    /// Proven best assignment.
    Optimal,
    /// Best assignment found before the time limit ran out.
    Feasible,
    /// The hard constraints admit no assignment.
    Infeasible,
    /// Time ran out before any assignment was found.
    Unknown,
}

impl SolveStatus {
    pub fn has_allocation(self) -> bool {
        matches!(self, SolveStatus::Optimal | SolveStatus::Feasible)
    }
}

/// Bookkeeping about one solve run.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SolveStats {
    pub solve_time_s: f64,
    pub incumbents_seen: u64,
    pub persons: usize,
    pub rooms: usize,
}

/// Describes a soft preference the final assignment could not honor.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UnmetSoftConstraint {
    pub constraint_type: String,
    pub description: String,
}

impl fmt::Display for UnmetSoftConstraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.constraint_type, self.description)
    }
}

/// The final output of the solver.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignmentResult {
    /// Absent when the run terminated without a usable assignment.
    pub allocation: Option<Allocation>,
    /// Achieved weighted-penalty total; absent without an allocation.
    pub objective: Option<f64>,
    pub status: SolveStatus,
    pub stats: SolveStats,
    pub unmet_soft_constraints: Vec<UnmetSoftConstraint>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn person_wire_format() {
        let p: Person = serde_json::from_str(
            r#"{"id":"s1","name":"Ali","gender":"m","role":"student","classId":"7a"}"#,
        )
        .unwrap();
        assert_eq!(p.gender, Gender::M);
        assert_eq!(p.role, Role::Student);
        assert_eq!(p.class_id.as_deref(), Some("7a"));
        assert_eq!(p.small_group_max, None);
    }

    #[test]
    fn corridors_derived_from_rooms() {
        let input: AssignmentInput = serde_json::from_str(
            r#"{
                "people": [],
                "rooms": [
                    {"id":"r201","name":"Sonnenaufgang","capacity":4,"corridor":"B"},
                    {"id":"r101","name":"Sternschnuppe","capacity":4,"corridor":"A"},
                    {"id":"r102","name":"Mondlicht","capacity":3,"corridor":"A"}
                ]
            }"#,
        )
        .unwrap();
        assert_eq!(input.corridor_labels(), vec!["A".to_string(), "B".to_string()]);
        assert!(input.forbidden_pairs.is_empty());
        assert!(input.required_teachers.is_empty());
    }

    #[test]
    fn explicit_corridor_list_wins() {
        let input = AssignmentInput {
            people: vec![],
            rooms: vec![],
            forbidden_pairs: vec![],
            corridors: Some(vec!["C".into(), "A".into()]),
            required_teachers: HashMap::new(),
        };
        assert_eq!(input.corridor_labels(), vec!["C".to_string(), "A".to_string()]);
    }
}
