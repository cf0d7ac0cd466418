//! Boolean algebra over 0/1 integer variables, as inequality systems.
//!
//! Every penalty term of the objective needs one of a handful of small
//! gadgets (AND, AND-NOT, OR indicator, occupancy indicator, count
//! overshoot). They are collected here so each term uses the same exact
//! linearization instead of re-deriving it inline.

use good_lp::{Constraint, Expression, ProblemVariables, Variable, constraint, variable};

/// Binary `m` with `m = a AND b`, exact under integrality:
/// `m <= a`, `m <= b`, `m >= a + b - 1`.
pub fn and(vars: &mut ProblemVariables, cons: &mut Vec<Constraint>, a: Variable, b: Variable) -> Variable {
    let m = vars.add(variable().binary());
    cons.push(constraint!(m <= a));
    cons.push(constraint!(m <= b));
    cons.push(constraint!(a + b - m <= 1));
    m
}

/// Binary `m` with `m = a AND (NOT b)`, exact under integrality:
/// `m <= a`, `m <= 1 - b`, `m >= a - b`.
pub fn and_not(vars: &mut ProblemVariables, cons: &mut Vec<Constraint>, a: Variable, b: Variable) -> Variable {
    let m = vars.add(variable().binary());
    cons.push(constraint!(m <= a));
    cons.push(constraint!(m + b <= 1));
    cons.push(constraint!(a - b - m <= 0));
    m
}

/// Binary flag equal to the OR of `terms`: `flag >= t` for every term and
/// `flag <= sum(terms)`. The upper bound pins the flag to zero when no term
/// fires, so the flag stays exact even where the objective would rather
/// push it up.
pub fn or_indicator(vars: &mut ProblemVariables, cons: &mut Vec<Constraint>, terms: &[Variable]) -> Variable {
    let flag = vars.add(variable().binary());
    let total: Expression = terms.iter().copied().sum();
    for t in terms {
        cons.push(constraint!(flag >= *t));
    }
    cons.push(constraint!(total - flag >= 0));
    flag
}

/// Binary flag equal to `count >= 1`, where `count` ranges over at most
/// `max_count`: `count >= flag` and `count <= max_count * flag`.
pub fn occupancy_indicator(
    vars: &mut ProblemVariables,
    cons: &mut Vec<Constraint>,
    count: &Expression,
    max_count: usize,
) -> Variable {
    let flag = vars.add(variable().binary());
    let lower = count.clone();
    cons.push(constraint!(lower - flag >= 0));
    let gate = (max_count as f64) * flag;
    let upper = count.clone();
    cons.push(constraint!(upper - gate <= 0));
    flag
}

/// Integer `excess` in `[0, ub]` with `excess >= count - 1`; the explicit
/// zero floor keeps an absent group from earning a negative bonus. Under a
/// minimizing objective the variable settles at `max(0, count - 1)`.
pub fn count_beyond_one(
    vars: &mut ProblemVariables,
    cons: &mut Vec<Constraint>,
    count: Expression,
    ub: usize,
) -> Variable {
    let excess = vars.add(variable().integer().min(0.0).max(ub as f64));
    cons.push(constraint!(count - excess <= 1));
    excess
}

#[cfg(test)]
mod tests {
    use super::*;
    use good_lp::{Solution, SolverModel, default_solver};

    fn solve_with(
        vars: ProblemVariables,
        cons: Vec<Constraint>,
        objective: Expression,
    ) -> impl Solution {
        let mut model = vars.minimise(objective).using(default_solver);
        for c in cons {
            model.add_constraint(c);
        }
        model.solve().unwrap()
    }

    fn fixed_pair(a_val: f64, b_val: f64) -> (ProblemVariables, Vec<Constraint>, Variable, Variable) {
        let mut vars = ProblemVariables::new();
        let mut cons = Vec::new();
        let a = vars.add(variable().binary());
        let b = vars.add(variable().binary());
        cons.push(constraint!(a == a_val));
        cons.push(constraint!(b == b_val));
        (vars, cons, a, b)
    }

    #[test]
    fn and_matches_truth_table() {
        for (a_val, b_val, expected) in [
            (0.0, 0.0, 0.0),
            (0.0, 1.0, 0.0),
            (1.0, 0.0, 0.0),
            (1.0, 1.0, 1.0),
        ] {
            let (mut vars, mut cons, a, b) = fixed_pair(a_val, b_val);
            let m = and(&mut vars, &mut cons, a, b);
            // maximize m via a negated objective to show the upper bounds bind
            let solution = solve_with(vars, cons, Expression::from(0.0) - m);
            assert_eq!(solution.value(m).round(), expected, "a={a_val} b={b_val}");
        }
    }

    #[test]
    fn and_not_matches_truth_table() {
        for (a_val, b_val, expected) in [
            (0.0, 0.0, 0.0),
            (0.0, 1.0, 0.0),
            (1.0, 0.0, 1.0),
            (1.0, 1.0, 0.0),
        ] {
            let (mut vars, mut cons, a, b) = fixed_pair(a_val, b_val);
            let m = and_not(&mut vars, &mut cons, a, b);
            let solution = solve_with(vars, cons, Expression::from(0.0) - m);
            assert_eq!(solution.value(m).round(), expected, "a={a_val} b={b_val}");
        }
    }

    #[test]
    fn or_indicator_is_exact_both_ways() {
        // one contributor set: the flag cannot dodge down to 0
        let (mut vars, mut cons, a, b) = fixed_pair(0.0, 1.0);
        let flag = or_indicator(&mut vars, &mut cons, &[a, b]);
        let solution = solve_with(vars, cons, flag.into());
        assert_eq!(solution.value(flag).round(), 1.0);

        // no contributor set: the flag cannot float up to 1
        let (mut vars, mut cons, a, b) = fixed_pair(0.0, 0.0);
        let flag = or_indicator(&mut vars, &mut cons, &[a, b]);
        let solution = solve_with(vars, cons, Expression::from(0.0) - flag);
        assert_eq!(solution.value(flag).round(), 0.0);
    }

    #[test]
    fn occupancy_indicator_tracks_count() {
        let mut vars = ProblemVariables::new();
        let mut cons = Vec::new();
        let a = vars.add(variable().binary());
        let b = vars.add(variable().binary());
        cons.push(constraint!(a == 1));
        cons.push(constraint!(b == 1));
        let count: Expression = [a, b].iter().copied().sum();
        let flag = occupancy_indicator(&mut vars, &mut cons, &count, 2);
        let solution = solve_with(vars, cons, flag.into());
        assert_eq!(solution.value(flag).round(), 1.0);

        let mut vars = ProblemVariables::new();
        let mut cons = Vec::new();
        let a = vars.add(variable().binary());
        cons.push(constraint!(a == 0));
        let count: Expression = [a].iter().copied().sum();
        let flag = occupancy_indicator(&mut vars, &mut cons, &count, 1);
        let solution = solve_with(vars, cons, Expression::from(0.0) - flag);
        assert_eq!(solution.value(flag).round(), 0.0);
    }

    #[test]
    fn count_beyond_one_floors_at_zero() {
        let mut vars = ProblemVariables::new();
        let mut cons = Vec::new();
        let fixed = vars.add(variable().integer().min(0.0).max(10.0));
        cons.push(constraint!(fixed == 3));
        let excess = count_beyond_one(&mut vars, &mut cons, fixed.into(), 10);
        let solution = solve_with(vars, cons, excess.into());
        assert_eq!(solution.value(excess).round(), 2.0);

        let mut vars = ProblemVariables::new();
        let mut cons = Vec::new();
        let fixed = vars.add(variable().integer().min(0.0).max(10.0));
        cons.push(constraint!(fixed == 0));
        let excess = count_beyond_one(&mut vars, &mut cons, fixed.into(), 10);
        let solution = solve_with(vars, cons, excess.into());
        assert_eq!(solution.value(excess).round(), 0.0);
    }
}
