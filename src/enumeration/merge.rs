//! Parallel merge of per-block allocations into ranked variants.
//!
//! # Algorithm
//!
//! The per-block result lists form a mixed-radix index space whose size is
//! the product of their lengths. The space is never materialized:
//!
//! 0. Each block's rows are visited in descending local score: the product,
//!    over the semesters the block's slots touch, of the weighted semester
//!    sums with that row written on top of the fixed slots. Digit 0 of every
//!    block is its locally best row, so index 0 is a strong combination and
//!    a truncated prefix stays in its neighbourhood.
//! 1. The explored range is `0..min(total, max_combinations)`. A larger (or
//!    `u64`-overflowing) space is truncated and reported as resource
//!    exhaustion.
//! 2. The range is cut into contiguous chunks; each chunk is a work unit
//!    for the rayon pool (or the calling thread when `parallel` is off).
//! 3. A linear index decodes to one digit per block (`index mod len`, then
//!    divide), mapped to a row through the block's visiting order. Rows are written into a scratch copy of the base allocation;
//!    a slot written twice with different values marks the combination
//!    inconsistent.
//! 4. Each worker keeps its own [`TopK`]; the worker structures are merged
//!    pairwise at the end.
//!
//! Because ties break on the combination index (in visiting order), the
//! result does not depend on chunk size or thread count.

use rayon::prelude::*;
use tracing::{info, warn};

use super::block::BlockAllocations;
use super::topk::{Ranked, TopK};
use super::Truncation;
use crate::evaluation::objective_with_buffer;
use crate::models::{Allocation, SlotLayout, Variant};
use crate::solver::{CancelToken, MergeConfig};

/// Combinations between two cancellation polls inside a chunk.
const CANCEL_POLL_INTERVAL: u64 = 1024;

/// Ranked variants plus merge statistics.
#[derive(Debug, Clone, PartialEq)]
pub struct MergeOutcome {
    /// Best variants, highest objective first.
    pub variants: Vec<Variant>,
    /// Size of the full combination space, `None` if it overflows `u64`.
    pub total_combinations: Option<u64>,
    /// Consistent combinations evaluated.
    pub evaluated: u64,
    /// Combinations discarded because blocks disagreed on a shared slot.
    pub inconsistent: u64,
    pub truncations: Vec<Truncation>,
}

/// Read-only inputs shared by every worker.
struct MergeContext<'m> {
    blocks: &'m [BlockAllocations],
    radices: Vec<u64>,
    /// Per block, row indices in visiting order.
    orders: Vec<Vec<usize>>,
    /// Base allocation with every block-written slot set to NaN.
    template: Vec<f64>,
    space: u64,
}

/// Per-worker buffers and results.
struct WorkerState {
    top: TopK,
    scratch: Vec<f64>,
    sums: Vec<f64>,
    digits: Vec<usize>,
    evaluated: u64,
    inconsistent: u64,
    cancelled: bool,
}

impl WorkerState {
    fn new(top_k: usize, slots: usize, blocks: usize) -> Self {
        Self {
            top: TopK::new(top_k),
            scratch: vec![0.0; slots],
            sums: Vec::new(),
            digits: vec![0; blocks],
            evaluated: 0,
            inconsistent: 0,
            cancelled: false,
        }
    }

    fn combine(mut self, other: WorkerState) -> WorkerState {
        self.top = self.top.merge(other.top);
        self.evaluated += other.evaluated;
        self.inconsistent += other.inconsistent;
        self.cancelled |= other.cancelled;
        self
    }
}

/// Combines block allocations and keeps the top-K variants.
pub struct VariantMerger<'a> {
    layout: &'a SlotLayout,
    config: &'a MergeConfig,
    cancel: &'a CancelToken,
}

impl<'a> VariantMerger<'a> {
    pub fn new(layout: &'a SlotLayout, config: &'a MergeConfig, cancel: &'a CancelToken) -> Self {
        Self {
            layout,
            config,
            cancel,
        }
    }

    /// Merges one row of every block on top of `base`.
    ///
    /// `base` supplies the values of slots no block writes: excluded slots
    /// at their minimum and unconstrained slots. Those values are never
    /// changed by the merge.
    pub fn merge(&self, blocks: &[BlockAllocations], base: &Allocation) -> MergeOutcome {
        let mut truncations = Vec::new();

        let total = blocks
            .iter()
            .try_fold(1u64, |acc, b| acc.checked_mul(b.len() as u64));
        let space = match total {
            Some(t) if t <= self.config.max_combinations => t,
            _ => {
                warn!(
                    total = ?total,
                    limit = self.config.max_combinations,
                    "combination space exceeds budget; exploring a prefix"
                );
                truncations.push(Truncation::ResourceExhaustion);
                self.config.max_combinations
            }
        };

        let mut template = base.values().to_vec();
        for b in blocks {
            for &slot in b.slots() {
                template[slot] = f64::NAN;
            }
        }

        let ctx = MergeContext {
            blocks,
            radices: blocks.iter().map(|b| b.len() as u64).collect(),
            orders: blocks
                .iter()
                .map(|b| visiting_order(self.layout, b, &template))
                .collect(),
            template,
            space,
        };

        let chunk_size = self.config.chunk_size.max(1);
        let chunks = space.div_ceil(chunk_size);
        let fresh = || WorkerState::new(self.config.top_k, self.layout.len(), blocks.len());

        let state = if self.config.parallel {
            (0..chunks)
                .into_par_iter()
                .fold(fresh, |mut state, chunk| {
                    self.process_chunk(&ctx, chunk, chunk_size, &mut state);
                    state
                })
                .reduce(fresh, WorkerState::combine)
        } else {
            let mut state = fresh();
            for chunk in 0..chunks {
                self.process_chunk(&ctx, chunk, chunk_size, &mut state);
                if state.cancelled {
                    break;
                }
            }
            state
        };

        if state.cancelled {
            warn!("merge cancelled; returning partial ranking");
            truncations.push(Truncation::Cancelled);
        }

        info!(
            space,
            evaluated = state.evaluated,
            inconsistent = state.inconsistent,
            retained = state.top.len(),
            "variant merge finished"
        );

        MergeOutcome {
            variants: state
                .top
                .into_sorted_vec()
                .into_iter()
                .map(|r| Variant::new(Allocation::new(r.values), r.objective))
                .collect(),
            total_combinations: total,
            evaluated: state.evaluated,
            inconsistent: state.inconsistent,
            truncations,
        }
    }

    fn process_chunk(
        &self,
        ctx: &MergeContext<'_>,
        chunk: u64,
        chunk_size: u64,
        state: &mut WorkerState,
    ) {
        if state.cancelled || self.cancel.is_cancelled() {
            state.cancelled = true;
            return;
        }
        let start = chunk * chunk_size;
        let end = start.saturating_add(chunk_size).min(ctx.space);

        for index in start..end {
            if (index - start) % CANCEL_POLL_INTERVAL == CANCEL_POLL_INTERVAL - 1
                && self.cancel.is_cancelled()
            {
                state.cancelled = true;
                return;
            }

            decode(index, &ctx.radices, &mut state.digits);
            if !fill(ctx, &state.digits, &mut state.scratch, self.config.conflict_tolerance) {
                state.inconsistent += 1;
                continue;
            }
            state.evaluated += 1;

            let objective = objective_with_buffer(self.layout, &state.scratch, &mut state.sums);
            if state.top.admits(objective, index) {
                state.top.push(Ranked {
                    objective,
                    index,
                    values: state.scratch.clone(),
                });
            }
        }
    }
}

/// Mixed-radix decomposition of `index` into one row index per block.
fn decode(mut index: u64, radices: &[u64], digits: &mut [usize]) {
    for (digit, &radix) in digits.iter_mut().zip(radices) {
        *digit = (index % radix) as usize;
        index /= radix;
    }
}

/// Row indices of `block`, best local score first. Ties keep row order.
///
/// `template` holds the fixed slot values, NaN where some block writes.
fn visiting_order(layout: &SlotLayout, block: &BlockAllocations, template: &[f64]) -> Vec<usize> {
    let semesters = layout.max_semester() as usize;
    let mut fixed = vec![0.0; semesters];
    for (slot, &v) in layout.slots().iter().zip(template) {
        if v.is_nan() {
            continue;
        }
        let weighted = slot.coefficient * v * slot.load_share();
        for &s in &slot.semesters {
            fixed[(s - 1) as usize] += weighted;
        }
    }

    let mut touched: Vec<u32> = block
        .slots()
        .iter()
        .flat_map(|&i| layout.slot(i).semesters.iter().copied())
        .collect();
    touched.sort_unstable();
    touched.dedup();

    let mut sums = vec![0.0; semesters];
    let scores: Vec<f64> = block
        .rows()
        .map(|row| {
            for &s in &touched {
                sums[(s - 1) as usize] = fixed[(s - 1) as usize];
            }
            for (&i, &v) in block.slots().iter().zip(row) {
                let slot = layout.slot(i);
                let weighted = slot.coefficient * v * slot.load_share();
                for &s in &slot.semesters {
                    sums[(s - 1) as usize] += weighted;
                }
            }
            touched.iter().map(|&s| sums[(s - 1) as usize]).product()
        })
        .collect();

    let mut order: Vec<usize> = (0..block.len()).collect();
    order.sort_by(|&a, &b| scores[b].total_cmp(&scores[a]));
    order
}

/// Writes the chosen rows into `scratch`. Returns `false` when two blocks
/// assign different values to the same slot.
fn fill(ctx: &MergeContext<'_>, digits: &[usize], scratch: &mut [f64], tolerance: f64) -> bool {
    scratch.copy_from_slice(&ctx.template);
    for ((block, order), &digit) in ctx.blocks.iter().zip(&ctx.orders).zip(digits) {
        for (&slot, &value) in block.slots().iter().zip(block.row(order[digit])) {
            let current = scratch[slot];
            if current.is_nan() {
                scratch[slot] = value;
            } else if (current - value).abs() > tolerance {
                return false;
            }
        }
    }
    true
}
