//! Recomputes the weighted penalty total from a finished allocation.
//!
//! The solver reports the objective the engine achieved; this module
//! derives the same figure directly from the room lists, both as a
//! consistency check and to name each soft preference the assignment
//! could not honor.

use crate::config::PenaltyWeights;
use crate::data::{
    Allocation, AssignmentInput, ClassId, CorridorId, Gender, Occupant, Role, Room, RoomId,
    UnmetSoftConstraint,
};
use std::collections::{BTreeMap, BTreeSet, HashMap};

/// Weighted penalty total plus one entry per violated preference.
#[derive(Debug, Clone, Default)]
pub struct PenaltyBreakdown {
    pub total: f64,
    pub unmet: Vec<UnmetSoftConstraint>,
}

impl PenaltyBreakdown {
    fn charge(&mut self, amount: f64, constraint_type: &str, description: String) {
        self.total += amount;
        self.unmet.push(UnmetSoftConstraint {
            constraint_type: constraint_type.to_string(),
            description,
        });
    }
}

/// Scores `allocation` against the soft preferences.
pub fn assess(
    allocation: &Allocation,
    input: &AssignmentInput,
    weights: &PenaltyWeights,
) -> PenaltyBreakdown {
    let mut breakdown = PenaltyBreakdown::default();
    let room_by_id: HashMap<&str, &Room> = input.rooms.iter().map(|r| (r.id.as_str(), r)).collect();

    // corridors each class actually ended up on, from student occupants
    let mut class_corridors: BTreeMap<&ClassId, BTreeSet<&CorridorId>> = BTreeMap::new();
    for (room_id, occupants) in allocation {
        let Some(room) = room_by_id.get(room_id.as_str()) else {
            continue;
        };
        for occupant in occupants {
            if occupant.role == Role::Student {
                if let Some(class_id) = &occupant.class_id {
                    class_corridors
                        .entry(class_id)
                        .or_default()
                        .insert(&room.corridor);
                }
            }
        }
    }

    for (room_id, occupants) in allocation {
        per_room_penalties(&mut breakdown, weights, room_id, occupants);
    }

    if weights.empty_bed > 0.0 {
        for room in &input.rooms {
            let occupied = allocation.get(&room.id).map_or(0, Vec::len);
            let free = room.capacity.saturating_sub(occupied as u32);
            if free > 0 {
                breakdown.charge(
                    weights.empty_bed * free as f64,
                    "Empty Beds",
                    format!("Room {} has {} unused bed(s).", room.id, free),
                );
            }
        }
    }

    if weights.teacher_wrong_corridor > 0.0 {
        for (room_id, occupants) in allocation {
            let Some(room) = room_by_id.get(room_id.as_str()) else {
                continue;
            };
            for occupant in occupants {
                if occupant.role != Role::Teacher {
                    continue;
                }
                let Some(class_id) = &occupant.class_id else {
                    continue;
                };
                // teachers whose class has no placed students carry no target
                let Some(corridors) = class_corridors.get(class_id) else {
                    continue;
                };
                if !corridors.contains(&room.corridor) {
                    breakdown.charge(
                        weights.teacher_wrong_corridor,
                        "Teacher Corridor Affinity",
                        format!(
                            "Teacher {} is on corridor {}, but class {} has no student there.",
                            occupant.id, room.corridor, class_id
                        ),
                    );
                }
            }
        }
    }

    if weights.class_split_across_corridors > 0.0 {
        for (class_id, corridors) in &class_corridors {
            if corridors.len() > 1 {
                breakdown.charge(
                    weights.class_split_across_corridors * (corridors.len() - 1) as f64,
                    "Class Split Across Corridors",
                    format!(
                        "Class {} is spread over {} corridors.",
                        class_id,
                        corridors.len()
                    ),
                );
            }
        }
    }

    breakdown
}

fn per_room_penalties(
    breakdown: &mut PenaltyBreakdown,
    weights: &PenaltyWeights,
    room_id: &RoomId,
    occupants: &[Occupant],
) {
    if weights.class_mix_per_extra_class > 0.0 {
        let classes: BTreeSet<&ClassId> = occupants
            .iter()
            .filter(|o| o.role == Role::Student)
            .filter_map(|o| o.class_id.as_ref())
            .collect();
        if classes.len() > 1 {
            breakdown.charge(
                weights.class_mix_per_extra_class * (classes.len() - 1) as f64,
                "Class Mix",
                format!("Room {} mixes {} classes.", room_id, classes.len()),
            );
        }
    }

    if weights.cross_gender_room > 0.0 {
        let has_m = occupants.iter().any(|o| o.gender == Gender::M);
        let has_w = occupants.iter().any(|o| o.gender == Gender::W);
        if has_m && has_w {
            breakdown.charge(
                weights.cross_gender_room,
                "Cross-Gender Room",
                format!("Room {} houses both genders.", room_id),
            );
        }
    }

    if weights.teacher_shared_room > 0.0 {
        let teachers = occupants.iter().filter(|o| o.role == Role::Teacher).count();
        if teachers > 1 {
            breakdown.charge(
                weights.teacher_shared_room * (teachers - 1) as f64,
                "Teacher Room Sharing",
                format!("Room {} houses {} teachers.", room_id, teachers),
            );
        }
    }
}
