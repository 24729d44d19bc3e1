//! Workload allocation domain models.
//!
//! Provides the data types for describing an allocation problem and its
//! solutions.
//!
//! # Domain Mappings
//!
//! | u-workload | Curriculum | Budgeting | Staffing |
//! |------------|-----------|-----------|----------|
//! | Discipline | Course | Cost center | Project |
//! | Semester | Teaching period | Quarter | Sprint |
//! | Block | Two-semester study year | Half-year | Release |
//! | Allocation | Hour plan | Budget plan | Capacity plan |

mod allocation;
mod block;
mod discipline;
mod problem;

pub use allocation::{
    Allocation, ExclusionSet, Granularity, ModelOptions, Slot, SlotLayout, Variant,
};
pub use block::{Block, BlockTargets, MAX_SEMESTER};
pub use discipline::Discipline;
pub use problem::{AllocationEntry, AllocationProblem, ProblemInput};
