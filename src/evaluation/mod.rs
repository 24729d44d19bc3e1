//! Constraint checks, objective and allocation reports.
//!
//! All evaluators are pure functions of a [`SlotLayout`](crate::models::SlotLayout)
//! and an [`Allocation`](crate::models::Allocation).

mod constraints;
mod objective;
mod report;

pub use constraints::{
    are_blocks_valid, block_sum, block_violation, is_block_valid, is_within_bounds, semester_load,
};
pub use objective::{objective, semester_weighted_sums};
pub(crate) use objective::objective_with_buffer;
pub use report::{AllocationReport, BlockReport};
