//! Bounded enumeration strategy.
//!
//! Produces a ranked set of near-optimal allocations in two stages:
//!
//! - [`BlockEnumerator`]: backtracking over a discrete hour grid, per block,
//!   collecting every allocation that meets the block target.
//! - [`VariantMerger`]: parallel exploration of the product of the per-block
//!   lists, keeping the best `K` combined allocations in a [`TopK`].
//!
//! Both stages are bounded (result cap, memory budget, combination budget)
//! and record every bound they hit as a [`Truncation`].

mod block;
mod merge;
mod topk;

use serde::{Deserialize, Serialize};

pub use block::{candidate_grid, grid_len_bound, BlockAllocations, BlockEnumerator};
pub use merge::{MergeOutcome, VariantMerger};
pub use topk::{Ranked, TopK};

/// Why a ranked result may be missing candidates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Truncation {
    /// A block hit its result cap.
    ResultCap { block_start: u32 },
    /// A memory or combination budget stopped generation.
    ResourceExhaustion,
    /// The cancellation token fired.
    Cancelled,
}
