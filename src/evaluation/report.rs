//! Allocation quality summary.
//!
//! Computes the figures the curriculum office reviews for a finished plan.
//!
//! # Metrics
//!
//! | Metric | Definition |
//! |--------|-----------|
//! | Semester load | Σ value / span over slots active in the semester |
//! | Block deviation | block sum − block target |
//! | Adjacent difference | \|load(s) − load(next s)\| for consecutive loaded semesters |
//! | Objective | Product of per-semester weighted sums |

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::constraints::{block_sum, semester_load};
use super::objective::objective;
use crate::models::{Allocation, SlotLayout};

/// Sum and deviation of one block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlockReport {
    pub start: u32,
    pub target: f64,
    pub sum: f64,
    /// `sum − target`.
    pub deviation: f64,
}

/// Summary of one allocation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AllocationReport {
    /// Semester → load, for semesters with at least one active slot.
    pub semester_loads: BTreeMap<u32, f64>,
    pub blocks: Vec<BlockReport>,
    /// First semester of each consecutive pair → absolute load difference.
    pub adjacent_differences: BTreeMap<u32, f64>,
    pub objective: f64,
    /// Total hours over all slots.
    pub total_hours: f64,
}

impl AllocationReport {
    /// Builds the report for `allocation`.
    pub fn calculate(layout: &SlotLayout, allocation: &Allocation) -> Self {
        let mut semesters: Vec<u32> = layout
            .slots()
            .iter()
            .flat_map(|s| s.semesters.iter().copied())
            .collect();
        semesters.sort_unstable();
        semesters.dedup();

        let semester_loads: BTreeMap<u32, f64> = semesters
            .iter()
            .map(|&s| (s, semester_load(layout, allocation, s)))
            .collect();

        let adjacent_differences = semesters
            .windows(2)
            .map(|w| (w[0], (semester_loads[&w[0]] - semester_loads[&w[1]]).abs()))
            .collect();

        let blocks = layout
            .blocks()
            .iter()
            .map(|b| {
                let sum = block_sum(layout, allocation, b);
                BlockReport {
                    start: b.start,
                    target: b.target,
                    sum,
                    deviation: sum - b.target,
                }
            })
            .collect();

        Self {
            semester_loads,
            blocks,
            adjacent_differences,
            objective: objective(layout, allocation),
            total_hours: allocation.total(),
        }
    }

    /// Largest absolute block deviation.
    pub fn max_block_deviation(&self) -> f64 {
        self.blocks
            .iter()
            .map(|b| b.deviation.abs())
            .fold(0.0, f64::max)
    }

    /// Whether every block is within `tolerance` of its target.
    pub fn meets_tolerance(&self, tolerance: f64) -> bool {
        self.max_block_deviation() <= tolerance
    }
}
