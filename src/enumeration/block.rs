//! Bounded backtracking enumeration of one block.
//!
//! # Algorithm
//!
//! 1. Each eligible slot gets a candidate grid: its minimum, its maximum and
//!    every `min + k·step` strictly between them, ascending.
//! 2. Slots are assigned in layout order. A candidate is tried only when the
//!    running sum plus the minimum of all later slots stays within
//!    `target + tolerance`; since candidates ascend, the first failure ends
//!    the loop. Candidates that cannot reach `target − tolerance` even with
//!    every later slot at its maximum are skipped.
//! 3. A complete assignment is accepted iff `|sum − target| ≤ tolerance`.
//! 4. The search stops at the result cap, the memory budget or cancellation.
//!
//! Candidate grids are charged against the memory budget together with the
//! result rows. Grids are sized before they are built; a block whose grids
//! alone exceed the budget yields no rows and a resource-exhaustion
//! truncation.
//!
//! Results are produced in traversal order, which is deterministic for a
//! fixed layout and configuration.
//!
//! # Complexity
//! O(Π g_i) in the worst case, g_i the grid size of slot i; pruning and the
//! result cap bound it in practice.

use tracing::{debug, warn};

use super::Truncation;
use crate::error::SolveError;
use crate::models::{Block, SlotLayout};
use crate::solver::{CancelToken, EnumerationConfig};

const GRID_EPSILON: f64 = 1e-9;

/// Candidate grid of a slot: `{min, max} ∪ {min + k·step < max}`, ascending.
///
/// Callers with a memory bound should check [`grid_len_bound`] first.
pub fn candidate_grid(min: f64, max: f64, step: f64) -> Vec<f64> {
    let mut grid = vec![min];
    if max - min <= GRID_EPSILON {
        return grid;
    }
    let mut k = 1u64;
    loop {
        let value = min + k as f64 * step;
        if value >= max - GRID_EPSILON {
            break;
        }
        grid.push(value);
        k += 1;
    }
    grid.push(max);
    grid
}

/// Upper bound on the length of [`candidate_grid`] for the same arguments,
/// computed without building it. `None` when the grid is not countable
/// (non-finite span, non-positive step, or more than `usize::MAX` points).
pub fn grid_len_bound(min: f64, max: f64, step: f64) -> Option<usize> {
    if max - min <= GRID_EPSILON {
        return Some(1);
    }
    let inner = ((max - min) / step).ceil();
    if !inner.is_finite() || inner < 0.0 || inner >= usize::MAX as f64 {
        return None;
    }
    (inner as usize).checked_add(1)
}

/// All accepted allocations of one block, stored row-major.
#[derive(Debug, Clone, PartialEq)]
pub struct BlockAllocations {
    block: Block,
    slots: Vec<usize>,
    values: Vec<f64>,
    rows: usize,
    truncation: Option<Truncation>,
}

impl BlockAllocations {
    pub fn block(&self) -> &Block {
        &self.block
    }

    /// Layout indices of the slots each row assigns, in row order.
    pub fn slots(&self) -> &[usize] {
        &self.slots
    }

    /// Number of allocations found.
    pub fn len(&self) -> usize {
        self.rows
    }

    pub fn is_empty(&self) -> bool {
        self.rows == 0
    }

    /// Values of allocation `index`, aligned with [`Self::slots`].
    pub fn row(&self, index: usize) -> &[f64] {
        let stride = self.slots.len();
        &self.values[index * stride..(index + 1) * stride]
    }

    pub fn rows(&self) -> impl Iterator<Item = &[f64]> + '_ {
        (0..self.rows).map(move |i| self.row(i))
    }

    /// Why the enumeration stopped early, if it did.
    pub fn truncation(&self) -> Option<Truncation> {
        self.truncation
    }
}

/// Read-only state shared by every recursion level.
struct SearchContext<'c> {
    candidates: Vec<Vec<f64>>,
    /// `suffix_min[i]`: sum of minimum candidates of slots `i..`.
    suffix_min: Vec<f64>,
    suffix_max: Vec<f64>,
    target: f64,
    tolerance: f64,
    max_results: usize,
    max_values: usize,
    block_start: u32,
    cancel: &'c CancelToken,
}

/// Output of the recursion, written only by the owning call.
struct Accumulator {
    current: Vec<f64>,
    values: Vec<f64>,
    rows: usize,
    stop: Option<Truncation>,
}

impl Accumulator {
    fn accept(&mut self, ctx: &SearchContext<'_>) {
        if self.values.len() + self.current.len() > ctx.max_values {
            self.stop = Some(Truncation::ResourceExhaustion);
            return;
        }
        self.values.extend_from_slice(&self.current);
        self.rows += 1;
        if self.rows >= ctx.max_results {
            self.stop = Some(Truncation::ResultCap {
                block_start: ctx.block_start,
            });
        }
    }
}

fn descend(ctx: &SearchContext<'_>, acc: &mut Accumulator, depth: usize, running: f64) {
    if ctx.cancel.is_cancelled() {
        acc.stop = Some(Truncation::Cancelled);
        return;
    }
    if depth == ctx.candidates.len() {
        if (running - ctx.target).abs() <= ctx.tolerance {
            acc.accept(ctx);
        }
        return;
    }

    let upper = ctx.target + ctx.tolerance;
    let lower = ctx.target - ctx.tolerance;
    for &value in &ctx.candidates[depth] {
        let next = running + value;
        if next + ctx.suffix_min[depth + 1] > upper {
            break;
        }
        if next + ctx.suffix_max[depth + 1] < lower {
            continue;
        }
        acc.current[depth] = value;
        descend(ctx, acc, depth + 1, next);
        if acc.stop.is_some() {
            return;
        }
    }
}

/// Enumerates grid allocations of individual blocks.
pub struct BlockEnumerator<'a> {
    layout: &'a SlotLayout,
    config: &'a EnumerationConfig,
    cancel: &'a CancelToken,
}

impl<'a> BlockEnumerator<'a> {
    pub fn new(layout: &'a SlotLayout, config: &'a EnumerationConfig, cancel: &'a CancelToken) -> Self {
        Self {
            layout,
            config,
            cancel,
        }
    }

    /// Enumerates the block at `block_index` of the layout.
    pub fn enumerate(&self, block_index: usize) -> BlockAllocations {
        let block = self.layout.blocks()[block_index];
        let slots = self.layout.block_members(block_index);
        let target = block.target - self.layout.excluded_contribution(block_index);
        let budget_values = self.config.memory_budget_bytes / std::mem::size_of::<f64>();

        let grid_values = slots.iter().try_fold(0usize, |acc, &i| {
            let slot = self.layout.slot(i);
            grid_len_bound(slot.min, slot.max, self.config.grid_step)
                .and_then(|len| acc.checked_add(len))
        });
        let grid_values = match grid_values {
            Some(n) if n <= budget_values => n,
            _ => {
                warn!(
                    block = block.start,
                    grid_values = ?grid_values,
                    budget_values,
                    "candidate grids exceed memory budget"
                );
                return BlockAllocations {
                    block,
                    slots,
                    values: Vec::new(),
                    rows: 0,
                    truncation: Some(Truncation::ResourceExhaustion),
                };
            }
        };

        let candidates: Vec<Vec<f64>> = slots
            .iter()
            .map(|&i| {
                let slot = self.layout.slot(i);
                candidate_grid(slot.min, slot.max, self.config.grid_step)
            })
            .collect();

        let n = candidates.len();
        let mut suffix_min = vec![0.0; n + 1];
        let mut suffix_max = vec![0.0; n + 1];
        for i in (0..n).rev() {
            suffix_min[i] = suffix_min[i + 1] + candidates[i][0];
            suffix_max[i] = suffix_max[i + 1] + candidates[i][candidates[i].len() - 1];
        }

        let ctx = SearchContext {
            candidates,
            suffix_min,
            suffix_max,
            target,
            tolerance: self.config.block_tolerance,
            max_results: self.config.max_results_per_block,
            max_values: budget_values - grid_values,
            block_start: block.start,
            cancel: self.cancel,
        };
        let mut acc = Accumulator {
            current: vec![0.0; n],
            values: Vec::new(),
            rows: 0,
            stop: None,
        };
        descend(&ctx, &mut acc, 0, 0.0);

        debug!(
            block = block.start,
            slots = n,
            allocations = acc.rows,
            truncation = ?acc.stop,
            "block enumerated"
        );

        BlockAllocations {
            block,
            slots,
            values: acc.values,
            rows: acc.rows,
            truncation: acc.stop,
        }
    }

    /// Enumerates every block. A block without allocations fails the whole
    /// strategy, unless the memory budget stopped it: that block is kept
    /// empty and its truncation reported.
    pub fn enumerate_all(&self) -> Result<Vec<BlockAllocations>, SolveError> {
        let mut all = Vec::with_capacity(self.layout.blocks().len());
        for index in 0..self.layout.blocks().len() {
            let result = self.enumerate(index);
            if result.is_empty() {
                match result.truncation() {
                    Some(Truncation::Cancelled) => return Err(SolveError::Cancelled),
                    Some(Truncation::ResourceExhaustion) => {
                        all.push(result);
                        continue;
                    }
                    _ => {}
                }
                warn!(
                    block = result.block().start,
                    truncation = ?result.truncation(),
                    "no allocation matches block target"
                );
                return Err(SolveError::InfeasibleBlock {
                    block_start: result.block().start,
                });
            }
            all.push(result);
        }
        Ok(all)
    }
}
