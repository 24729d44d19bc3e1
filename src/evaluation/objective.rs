//! Multiplicative cross-semester objective.
//!
//! ```text
//! objective = Π_{s=1..S} Σ_{slots active in s} coefficient · value / |semesters(slot)|
//! ```
//!
//! A product over semesters punishes a near-empty semester far harder than
//! a sum would, so high-ranked allocations are balanced across the whole
//! span. `S` is the highest semester in the domain; a semester without any
//! active slot yields a zero factor.
//!
//! A slot spanning several semesters contributes an even share of its value
//! to each, the same split [`semester_load`](super::semester_load) uses. With
//! unit coefficients the factors are exactly the semester loads.

use crate::models::{Allocation, SlotLayout};

/// Objective value of an allocation.
pub fn objective(layout: &SlotLayout, allocation: &Allocation) -> f64 {
    let mut scratch = Vec::new();
    objective_with_buffer(layout, allocation.values(), &mut scratch)
}

/// Objective value using a caller-owned scratch buffer for the
/// per-semester sums. Used in hot loops to avoid allocation.
pub(crate) fn objective_with_buffer(
    layout: &SlotLayout,
    values: &[f64],
    sums: &mut Vec<f64>,
) -> f64 {
    let semesters = layout.max_semester() as usize;
    if semesters == 0 {
        return 0.0;
    }
    sums.clear();
    sums.resize(semesters, 0.0);

    for (slot, &v) in layout.slots().iter().zip(values) {
        let weighted = slot.coefficient * v * slot.load_share();
        for &s in &slot.semesters {
            sums[(s - 1) as usize] += weighted;
        }
    }
    sums.iter().product()
}

/// Weighted sum of each semester `1..=S`, the factors of the objective.
pub fn semester_weighted_sums(layout: &SlotLayout, allocation: &Allocation) -> Vec<f64> {
    let mut sums = Vec::new();
    objective_with_buffer(layout, allocation.values(), &mut sums);
    sums
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::evaluation::semester_load;
    use crate::models::{AllocationProblem, BlockTargets, Discipline, ProblemInput};

    fn problem(coefficient: f64) -> AllocationProblem {
        let input = ProblemInput::new(
            vec![
                Discipline::new("D1", "Algebra")
                    .with_bounds(0.0, 10.0)
                    .with_coefficient(coefficient)
                    .with_semesters(vec![1, 2]),
                Discipline::new("D2", "Physics")
                    .with_bounds(0.0, 10.0)
                    .with_coefficient(2.0)
                    .with_semesters(vec![2]),
            ],
            BlockTargets::new().with_target(1, 10.0),
        );
        AllocationProblem::compile(input).unwrap()
    }

    #[test]
    fn test_objective_product() {
        let p = problem(1.0);
        let alloc = Allocation::new(vec![4.0, 3.0]);
        // D1 splits 4 hours over s1 and s2. s1: 2; s2: 2 + 2*3 = 8
        assert!((objective(p.layout(), &alloc) - 16.0).abs() < 1e-12);
        assert_eq!(semester_weighted_sums(p.layout(), &alloc), vec![2.0, 8.0]);
    }

    #[test]
    fn test_unit_coefficient_factors_match_semester_loads() {
        let input = ProblemInput::new(
            vec![
                Discipline::new("D1", "Algebra")
                    .with_bounds(0.0, 12.0)
                    .with_semesters(vec![1, 2, 3]),
                Discipline::new("D2", "Physics")
                    .with_bounds(0.0, 10.0)
                    .with_semesters(vec![2]),
            ],
            BlockTargets::new().with_target(1, 10.0),
        );
        let p = AllocationProblem::compile(input).unwrap();
        let alloc = Allocation::new(vec![9.0, 5.0]);
        let sums = semester_weighted_sums(p.layout(), &alloc);
        for s in 1..=3u32 {
            let load = semester_load(p.layout(), &alloc, s);
            assert!((sums[(s - 1) as usize] - load).abs() < 1e-12);
        }
        assert_eq!(sums, vec![3.0, 8.0, 3.0]);
    }

    #[test]
    fn test_empty_semester_zeroes_objective() {
        let input = ProblemInput::new(
            vec![Discipline::new("D1", "A")
                .with_bounds(1.0, 2.0)
                .with_semesters(vec![2])],
            BlockTargets::new().with_target(1, 1.0),
        );
        let p = AllocationProblem::compile(input).unwrap();
        assert_eq!(objective(p.layout(), &Allocation::new(vec![2.0])), 0.0);
    }

    #[test]
    fn test_objective_monotone_in_coefficient() {
        let alloc = Allocation::new(vec![4.0, 3.0]);
        let mut previous = f64::NEG_INFINITY;
        for coefficient in [0.0, 0.5, 1.0, 2.5, 10.0] {
            let value = objective(problem(coefficient).layout(), &alloc);
            assert!(value >= previous);
            previous = value;
        }
    }
}
