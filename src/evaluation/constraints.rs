//! Constraint checks over a slot layout.
//!
//! Every function here is pure and may be called concurrently.

use crate::models::{Allocation, Block, SlotLayout};

/// Sum of slot values over slots active in either semester of `block`.
///
/// Each slot is counted once. Excluded slots only count when the layout
/// says excluded disciplines take part in target sums.
pub fn block_sum(layout: &SlotLayout, allocation: &Allocation, block: &Block) -> f64 {
    block_sum_values(layout, allocation.values(), block)
}

fn block_sum_values(layout: &SlotLayout, values: &[f64], block: &Block) -> f64 {
    layout
        .slots()
        .iter()
        .zip(values)
        .filter(|(slot, _)| {
            block.touches(&slot.semesters)
                && (!slot.excluded || layout.count_excluded_in_targets())
        })
        .map(|(_, &v)| v)
        .sum()
}

/// Load of one semester: each active slot contributes `value / |semesters|`.
pub fn semester_load(layout: &SlotLayout, allocation: &Allocation, semester: u32) -> f64 {
    layout
        .slots()
        .iter()
        .zip(allocation.values())
        .filter(|(slot, _)| slot.is_active_in(semester))
        .map(|(slot, &v)| v * slot.load_share())
        .sum()
}

/// Whether every value lies within its slot's bounds.
pub fn is_within_bounds(layout: &SlotLayout, allocation: &Allocation) -> bool {
    allocation.len() == layout.len()
        && layout
            .slots()
            .iter()
            .zip(allocation.values())
            .all(|(slot, &v)| v >= slot.min && v <= slot.max)
}

/// Whether `|block_sum − target| ≤ tolerance`.
pub fn is_block_valid(
    layout: &SlotLayout,
    allocation: &Allocation,
    block: &Block,
    tolerance: f64,
) -> bool {
    (block_sum(layout, allocation, block) - block.target).abs() <= tolerance
}

/// Whether every block of the layout is valid.
pub fn are_blocks_valid(layout: &SlotLayout, allocation: &Allocation, tolerance: f64) -> bool {
    layout
        .blocks()
        .iter()
        .all(|b| is_block_valid(layout, allocation, b, tolerance))
}

/// Total constraint violation: deviation of each block beyond `tolerance`
/// plus any distance outside slot bounds. Zero means feasible.
pub fn block_violation(layout: &SlotLayout, allocation: &Allocation, tolerance: f64) -> f64 {
    let bounds: f64 = layout
        .slots()
        .iter()
        .zip(allocation.values())
        .map(|(slot, &v)| (slot.min - v).max(0.0) + (v - slot.max).max(0.0))
        .sum();
    let blocks: f64 = layout
        .blocks()
        .iter()
        .map(|b| ((block_sum(layout, allocation, b) - b.target).abs() - tolerance).max(0.0))
        .sum();
    bounds + blocks
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{
        AllocationProblem, BlockTargets, Discipline, Granularity, ModelOptions, ProblemInput,
    };

    fn problem(options: ModelOptions) -> AllocationProblem {
        let input = ProblemInput::new(
            vec![
                Discipline::new("D1", "Algebra")
                    .with_bounds(0.0, 10.0)
                    .with_semesters(vec![1, 2]),
                Discipline::new("D2", "Physics")
                    .with_bounds(0.0, 10.0)
                    .with_semesters(vec![2, 3]),
                Discipline::new("D3", "Ontology")
                    .with_fixed_hours(5.0)
                    .with_semesters(vec![1]),
            ],
            BlockTargets::new().with_target(1, 12.0).with_target(3, 4.0),
        )
        .with_exclusions(["Ontology"].into_iter().collect())
        .with_options(options);
        AllocationProblem::compile(input).unwrap()
    }

    #[test]
    fn test_block_sum_counts_each_slot_once() {
        let p = problem(ModelOptions::default());
        let alloc = Allocation::new(vec![6.0, 4.0, 5.0]);
        let blocks = p.layout().blocks();
        assert!((block_sum(p.layout(), &alloc, &blocks[0]) - 10.0).abs() < 1e-12);
        assert!((block_sum(p.layout(), &alloc, &blocks[1]) - 4.0).abs() < 1e-12);
    }

    #[test]
    fn test_block_sum_with_excluded() {
        let p = problem(ModelOptions::default().with_excluded_in_targets(true));
        let alloc = Allocation::new(vec![6.0, 4.0, 5.0]);
        let block = p.layout().blocks()[0];
        assert!((block_sum(p.layout(), &alloc, &block) - 15.0).abs() < 1e-12);
    }

    #[test]
    fn test_semester_load_splits_evenly() {
        let p = problem(ModelOptions::default());
        let alloc = Allocation::new(vec![6.0, 4.0, 5.0]);
        // D1: 6/2, D3: 5/1
        assert!((semester_load(p.layout(), &alloc, 1) - 8.0).abs() < 1e-12);
        // D1: 6/2, D2: 4/2
        assert!((semester_load(p.layout(), &alloc, 2) - 5.0).abs() < 1e-12);
        assert_eq!(semester_load(p.layout(), &alloc, 7), 0.0);
    }

    #[test]
    fn test_semester_load_per_semester_instances() {
        let p = problem(ModelOptions::default().with_granularity(Granularity::PerSemester));
        // D1@1, D1@2, D2@2, D2@3, D3@1
        let alloc = Allocation::new(vec![3.0, 4.0, 2.0, 1.0, 5.0]);
        assert!((semester_load(p.layout(), &alloc, 2) - 6.0).abs() < 1e-12);
    }

    #[test]
    fn test_bounds_and_validity() {
        let p = problem(ModelOptions::default());
        let layout = p.layout();
        let good = Allocation::new(vec![8.0, 4.0, 5.0]);
        assert!(is_within_bounds(layout, &good));
        assert!(are_blocks_valid(layout, &good, 0.01));
        assert_eq!(block_violation(layout, &good, 0.01), 0.0);

        let bad = Allocation::new(vec![11.0, 4.0, 5.0]);
        assert!(!is_within_bounds(layout, &bad));
        assert!(!is_block_valid(layout, &bad, &layout.blocks()[0], 1.0));
        // 1 over bound, block 0 off by 3 with tolerance 1
        assert!((block_violation(layout, &bad, 1.0) - 3.0).abs() < 1e-12);
    }
}
