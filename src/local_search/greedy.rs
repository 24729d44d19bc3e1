//! Greedy proportional seed.
//!
//! # Algorithm
//!
//! 1. Start from the base allocation (constrained slots at minimum,
//!    unconstrained slots at maximum).
//! 2. `remaining = Σ block targets − Σ values of slots counted by blocks`.
//! 3. Split `remaining` across adjustable block slots in proportion to
//!    their coefficients, capping each slot at its headroom.
//! 4. Repeat with the slots that still have headroom until nothing remains
//!    or every slot is full.
//!
//! Each pass either places all of `remaining` or fills at least one slot,
//! so at most `n + 1` passes run.

use crate::models::{Allocation, SlotLayout};

const EPSILON: f64 = 1e-9;

/// Builds the greedy seed allocation.
pub fn greedy_seed(layout: &SlotLayout) -> Allocation {
    let mut allocation = layout.base_allocation();

    let counted: Vec<usize> = (0..layout.len())
        .filter(|&i| layout.counts_toward_targets(i))
        .collect();
    let required: f64 = layout.blocks().iter().map(|b| b.target).sum();
    let assigned: f64 = counted.iter().map(|&i| allocation.value(i)).sum();
    let mut remaining = required - assigned;

    let adjustable: Vec<usize> = counted
        .into_iter()
        .filter(|&i| !layout.slot(i).excluded)
        .collect();

    for _ in 0..=adjustable.len() {
        if remaining <= EPSILON {
            break;
        }
        let open: Vec<usize> = adjustable
            .iter()
            .copied()
            .filter(|&i| allocation.value(i) < layout.slot(i).max - EPSILON)
            .collect();
        if open.is_empty() {
            break;
        }

        let total_coefficient: f64 = open.iter().map(|&i| layout.slot(i).coefficient).sum();
        let pool = remaining;
        for &i in &open {
            let slot = layout.slot(i);
            let share = if total_coefficient > 0.0 {
                slot.coefficient / total_coefficient
            } else {
                1.0 / open.len() as f64
            };
            let add = (pool * share).min(slot.max - allocation.value(i));
            allocation.set(i, allocation.value(i) + add);
            remaining -= add;
        }
    }

    allocation
}
