use crate::config::{PenaltyWeights, SolverConfig};
use crate::data::{
    Allocation, AssignmentInput, AssignmentResult, ClassId, Gender, Occupant, Person, Role, Room,
    SolveStats, SolveStatus,
};
use crate::linear;
use crate::progress::{ProgressEvent, ProgressObserver, Throttle};
use crate::score;
use good_lp::{
    Constraint, Expression, ProblemVariables, ResolutionError, Solution, SolverModel, Variable,
    constraint, default_solver, variable,
};
use itertools::Itertools;
use log::{info, warn};
use std::collections::HashMap;
use std::time::{Duration, Instant};

/// Assigns every person to a room with the HiGHS MILP solver, honoring the
/// hard house rules and minimizing the weighted soft-preference penalties.
///
/// Fails fast on input the model could not represent faithfully (nothing to
/// assign, duplicate ids, zero capacities). Infeasibility and timeouts are
/// not errors; they come back as the result's status.
pub fn solve(
    input: &AssignmentInput,
    weights: &PenaltyWeights,
    config: &SolverConfig,
    observer: &mut dyn ProgressObserver,
) -> Result<AssignmentResult, String> {
    check_input(input)?;

    let persons: Vec<&Person> = input.people.iter().collect();
    let rooms: Vec<&Room> = input.rooms.iter().collect();
    let person_index: HashMap<&str, usize> = persons
        .iter()
        .enumerate()
        .map(|(i, p)| (p.id.as_str(), i))
        .collect();

    let student_idx: Vec<usize> = indices_with_role(&persons, Role::Student);
    let teacher_idx: Vec<usize> = indices_with_role(&persons, Role::Teacher);

    // classes come from students only; teachers merely point at one
    let classes: Vec<ClassId> = student_idx
        .iter()
        .filter_map(|&p| persons[p].class_id.clone())
        .unique()
        .sorted()
        .collect();
    let class_index: HashMap<&str, usize> = classes
        .iter()
        .enumerate()
        .map(|(i, k)| (k.as_str(), i))
        .collect();
    let class_members: Vec<Vec<usize>> = classes
        .iter()
        .map(|k| {
            student_idx
                .iter()
                .copied()
                .filter(|&p| persons[p].class_id.as_deref() == Some(k.as_str()))
                .collect()
        })
        .collect();

    let corridors = input.corridor_labels();
    let corridor_rooms: Vec<Vec<usize>> = corridors
        .iter()
        .map(|c| {
            rooms
                .iter()
                .enumerate()
                .filter(|(_, r)| &r.corridor == c)
                .map(|(i, _)| i)
                .collect()
        })
        .collect();

    // model setup
    info!(
        "Setting up MILP model with {} people, {} rooms, {} corridors, and {} classes...",
        persons.len(),
        rooms.len(),
        corridors.len(),
        classes.len()
    );
    let mut vars = ProblemVariables::new();
    let mut cons: Vec<Constraint> = Vec::new();

    // x[p][r]: person p sleeps in room r
    let x: Vec<Vec<Variable>> = persons
        .iter()
        .map(|_| rooms.iter().map(|_| vars.add(variable().binary())).collect())
        .collect();
    // y[r][g]: room r houses gender g (indexed by gender_slot)
    let y: Vec<[Variable; 2]> = rooms
        .iter()
        .map(|_| [vars.add(variable().binary()), vars.add(variable().binary())])
        .collect();
    // z[r][k]: room r houses at least one member of class k (lower bound only)
    let z: Vec<Vec<Variable>> = rooms
        .iter()
        .map(|_| classes.iter().map(|_| vars.add(variable().binary())).collect())
        .collect();
    let has_teacher: Vec<Variable> = rooms.iter().map(|_| vars.add(variable().binary())).collect();
    let has_student: Vec<Variable> = rooms.iter().map(|_| vars.add(variable().binary())).collect();

    let occupancy: Vec<Expression> = (0..rooms.len())
        .map(|r| (0..persons.len()).map(|p| x[p][r]).sum())
        .collect();

    // 1) every person gets exactly one room
    for p in 0..persons.len() {
        let placements: Expression = (0..rooms.len()).map(|r| x[p][r]).sum();
        cons.push(constraint!(placements == 1));
    }

    // 2) capacities
    for (r, room) in rooms.iter().enumerate() {
        let occ = occupancy[r].clone();
        cons.push(constraint!(occ <= room.capacity as f64));
    }

    // 3) single gender per room, teachers included
    for r in 0..rooms.len() {
        cons.push(constraint!(y[r][0] + y[r][1] <= 1));
        for (p, person) in persons.iter().enumerate() {
            let slot = gender_slot(person.gender);
            cons.push(constraint!(x[p][r] <= y[r][slot]));
        }
    }

    // 4) forbidden pairs; unknown ids are the data layer's problem, skip them
    for pair in &input.forbidden_pairs {
        let (Some(&a), Some(&b)) = (
            person_index.get(pair.a.as_str()),
            person_index.get(pair.b.as_str()),
        ) else {
            continue;
        };
        for r in 0..rooms.len() {
            cons.push(constraint!(x[a][r] + x[b][r] <= 1));
        }
    }

    // 5) small-group cap: occupancy - k <= cap * (1 - x[p][r]), rearranged
    for (p, person) in persons.iter().enumerate() {
        let Some(kmax) = person.small_group_max else {
            continue;
        };
        for (r, room) in rooms.iter().enumerate() {
            let occ = occupancy[r].clone();
            let presence = (room.capacity as f64) * x[p][r];
            cons.push(constraint!(occ + presence <= (kmax + room.capacity) as f64));
        }
    }

    // 6) at least one teacher per corridor, plus concretely required teachers
    for (c, corridor) in corridors.iter().enumerate() {
        let rooms_on_c = &corridor_rooms[c];
        if !teacher_idx.is_empty() && !rooms_on_c.is_empty() {
            let mut contributors: Vec<Variable> = Vec::new();
            for &t in &teacher_idx {
                for &r in rooms_on_c {
                    contributors.push(x[t][r]);
                }
            }
            let coverage: Expression = contributors.into_iter().sum();
            cons.push(constraint!(coverage >= 1));
        }
        for teacher_id in input.required_teachers.get(corridor).into_iter().flatten() {
            let Some(&t) = person_index.get(teacher_id.as_str()) else {
                continue;
            };
            if !teacher_idx.contains(&t) {
                continue;
            }
            // an empty corridor makes this 0 == 1, correctly infeasible
            let placements: Expression = rooms_on_c.iter().map(|&r| x[t][r]).sum();
            cons.push(constraint!(placements == 1));
        }
    }

    // 7) z[r][k] rises as soon as any member of class k is in the room
    for r in 0..rooms.len() {
        for (k, members) in class_members.iter().enumerate() {
            for &p in members {
                cons.push(constraint!(z[r][k] >= x[p][r]));
            }
        }
    }

    // 8) hard role separation: teachers and students never share a room
    for r in 0..rooms.len() {
        for &t in &teacher_idx {
            cons.push(constraint!(has_teacher[r] >= x[t][r]));
        }
        for &s in &student_idx {
            cons.push(constraint!(has_student[r] >= x[s][r]));
        }
        cons.push(constraint!(has_teacher[r] + has_student[r] <= 1));
    }

    // --- corridor presence flags ---

    // class_on[c][k]: class k has a student somewhere on corridor c.
    // Exact OR in both directions: the mismatch term below rewards an
    // inflated flag, so the one-sided form would let the engine fake
    // class presence on a teacher's corridor.
    let mut class_on: Vec<Vec<Variable>> = Vec::with_capacity(corridors.len());
    for c in 0..corridors.len() {
        let mut row = Vec::with_capacity(classes.len());
        for members in &class_members {
            let mut contributors: Vec<Variable> = Vec::new();
            for &r in &corridor_rooms[c] {
                for &p in members {
                    contributors.push(x[p][r]);
                }
            }
            row.push(linear::or_indicator(&mut vars, &mut cons, &contributors));
        }
        class_on.push(row);
    }

    // teacher_on[(t, c)]: teacher t sleeps on corridor c
    let mut teacher_on: HashMap<(usize, usize), Variable> = HashMap::new();
    for &t in &teacher_idx {
        for c in 0..corridors.len() {
            let contributors: Vec<Variable> = corridor_rooms[c].iter().map(|&r| x[t][r]).collect();
            teacher_on.insert(
                (t, c),
                linear::or_indicator(&mut vars, &mut cons, &contributors),
            );
        }
    }

    // objective
    let mut objective_terms: Vec<Expression> = Vec::new();

    // a) extra classes per room
    if weights.class_mix_per_extra_class > 0.0 && !classes.is_empty() {
        for r in 0..rooms.len() {
            let occupied = linear::occupancy_indicator(&mut vars, &mut cons, &occupancy[r], persons.len());
            let classes_in_room: Expression = (0..classes.len()).map(|k| z[r][k]).sum();
            let extra_classes = linear::count_beyond_one(
                &mut vars,
                &mut cons,
                classes_in_room,
                classes.len().saturating_sub(1),
            );
            // an empty room hosts no classes, whatever z floats to
            let gate = (classes.len() as f64) * occupied;
            cons.push(constraint!(gate - extra_classes >= 0));
            objective_terms.push(weights.class_mix_per_extra_class * extra_classes);
        }
    }

    // b) free beds (optional)
    if weights.empty_bed > 0.0 {
        for (r, room) in rooms.iter().enumerate() {
            let empty_beds = Expression::from(room.capacity as f64) - occupancy[r].clone();
            objective_terms.push(weights.empty_bed * empty_beds);
        }
    }

    // c) cross-gender safety net; the hard separation keeps this at zero
    if weights.cross_gender_room > 0.0 {
        for r in 0..rooms.len() {
            let both_genders = linear::and(&mut vars, &mut cons, y[r][0], y[r][1]);
            objective_terms.push(weights.cross_gender_room * both_genders);
        }
    }

    // d) teachers prefer single rooms
    if weights.teacher_shared_room > 0.0 && !teacher_idx.is_empty() {
        for r in 0..rooms.len() {
            let teachers_in_room: Expression = teacher_idx.iter().map(|&t| x[t][r]).sum();
            let extra_teachers = linear::count_beyond_one(
                &mut vars,
                &mut cons,
                teachers_in_room,
                teacher_idx.len(),
            );
            objective_terms.push(weights.teacher_shared_room * extra_teachers);
        }
    }

    // e) teacher on a corridor without their home class
    if weights.teacher_wrong_corridor > 0.0 {
        for &t in &teacher_idx {
            let Some(k) = persons[t]
                .class_id
                .as_deref()
                .and_then(|k| class_index.get(k).copied())
            else {
                continue;
            };
            for c in 0..corridors.len() {
                let mismatch =
                    linear::and_not(&mut vars, &mut cons, teacher_on[&(t, c)], class_on[c][k]);
                objective_terms.push(weights.teacher_wrong_corridor * mismatch);
            }
        }
    }

    // f) classes prefer a single corridor
    if weights.class_split_across_corridors > 0.0 && !corridors.is_empty() && !classes.is_empty() {
        for k in 0..classes.len() {
            let corridors_used: Expression = (0..corridors.len()).map(|c| class_on[c][k]).sum();
            let extra_corridors = linear::count_beyond_one(
                &mut vars,
                &mut cons,
                corridors_used,
                corridors.len().saturating_sub(1),
            );
            objective_terms.push(weights.class_split_across_corridors * extra_corridors);
        }
    }

    let objective = objective_terms
        .into_iter()
        .fold(Expression::from(0.0), |acc, term| acc + term);

    // solver configuration
    let mut model = vars
        .minimise(objective.clone())
        .using(default_solver)
        .set_option("time_limit", config.time_limit_seconds)
        .set_option("threads", config.worker_count as i32)
        .set_option("parallel", if config.worker_count > 1 { "on" } else { "off" });
    for c in cons {
        model.add_constraint(c);
    }

    info!(
        "Starting search (time limit {:.0}s, {} workers)...",
        config.time_limit_seconds, config.worker_count
    );
    let mut throttle = Throttle::new(Duration::from_secs_f64(config.progress_interval_seconds));
    let started = Instant::now();
    let outcome = model.solve();
    let elapsed = started.elapsed();

    let mut incumbents_seen: u64 = 0;
    let (status, solution) = match outcome {
        Ok(solution) => {
            incumbents_seen = 1;
            let status = if elapsed.as_secs_f64() < config.time_limit_seconds {
                SolveStatus::Optimal
            } else {
                SolveStatus::Feasible
            };
            (status, Some(solution))
        }
        Err(ResolutionError::Infeasible) => (SolveStatus::Infeasible, None),
        Err(e) => {
            warn!("Search ended without a usable answer: {e}");
            (SolveStatus::Unknown, None)
        }
    };
    info!(
        "Search finished after {:.1}s with status {:?}.",
        elapsed.as_secs_f64(),
        status
    );

    let stats = SolveStats {
        solve_time_s: elapsed.as_secs_f64(),
        incumbents_seen,
        persons: persons.len(),
        rooms: rooms.len(),
    };

    let Some(solution) = solution else {
        return Ok(no_allocation(status, stats));
    };

    let objective_value = solution.eval(objective.clone());
    let event = ProgressEvent {
        elapsed,
        incumbents_seen,
        best_objective: Some(objective_value),
    };
    if throttle.ready(Instant::now()) {
        observer.on_incumbent(&event);
    }

    // read the assignment back out
    let Some(allocation) = extract_allocation(&solution, &x, &persons, &rooms) else {
        warn!("Engine reported a solution that violates the assignment shape; discarding it.");
        return Ok(no_allocation(SolveStatus::Unknown, stats));
    };

    let breakdown = score::assess(&allocation, input, weights);
    Ok(AssignmentResult {
        allocation: Some(allocation),
        objective: Some(objective_value),
        status,
        stats,
        unmet_soft_constraints: breakdown.unmet,
    })
}

/// Shape checks the model cannot express: run them before building it.
fn check_input(input: &AssignmentInput) -> Result<(), String> {
    if input.people.is_empty() {
        return Err("no people to assign".to_string());
    }
    if input.rooms.is_empty() {
        return Err("no rooms available".to_string());
    }
    let mut seen_people = std::collections::HashSet::new();
    for person in &input.people {
        if !seen_people.insert(person.id.as_str()) {
            return Err(format!("duplicate person id: {}", person.id));
        }
        if person.small_group_max == Some(0) {
            return Err(format!("person {} has a zero small-group cap", person.id));
        }
    }
    let mut seen_rooms = std::collections::HashSet::new();
    for room in &input.rooms {
        if !seen_rooms.insert(room.id.as_str()) {
            return Err(format!("duplicate room id: {}", room.id));
        }
        if room.capacity == 0 {
            return Err(format!("room {} has zero capacity", room.id));
        }
    }
    Ok(())
}

fn indices_with_role(persons: &[&Person], role: Role) -> Vec<usize> {
    persons
        .iter()
        .enumerate()
        .filter(|(_, p)| p.role == role)
        .map(|(i, _)| i)
        .collect()
}

fn gender_slot(gender: Gender) -> usize {
    match gender {
        Gender::M => 0,
        Gender::W => 1,
    }
}

fn no_allocation(status: SolveStatus, stats: SolveStats) -> AssignmentResult {
    AssignmentResult {
        allocation: None,
        objective: None,
        status,
        stats,
        unmet_soft_constraints: Vec::new(),
    }
}

/// Reads `x` back into room lists. Returns `None` when the values do not
/// describe a partition of the people over the rooms, which means the
/// engine's answer cannot be trusted.
fn extract_allocation(
    solution: &impl Solution,
    x: &[Vec<Variable>],
    persons: &[&Person],
    rooms: &[&Room],
) -> Option<Allocation> {
    let mut allocation = Allocation::new();
    let mut placements = vec![0usize; persons.len()];
    for (r, room) in rooms.iter().enumerate() {
        let mut occupants = Vec::new();
        for (p, person) in persons.iter().enumerate() {
            if solution.value(x[p][r]) > 0.5 {
                placements[p] += 1;
                occupants.push(Occupant {
                    id: person.id.clone(),
                    name: person.name.clone(),
                    gender: person.gender,
                    role: person.role,
                    class_id: person.class_id.clone(),
                });
            }
        }
        if occupants.len() > room.capacity as usize {
            return None;
        }
        if !occupants.is_empty() {
            allocation.insert(room.id.clone(), occupants);
        }
    }
    if placements.iter().any(|&count| count != 1) {
        return None;
    }
    Some(allocation)
}
