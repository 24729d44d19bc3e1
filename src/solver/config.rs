//! Solver configuration.

use serde::{Deserialize, Serialize};

use crate::local_search::AnnealingConfig;

/// Block enumeration settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnumerationConfig {
    /// Spacing of the candidate grid above each slot's minimum.
    pub grid_step: f64,
    /// Accepted absolute deviation from a block target.
    pub block_tolerance: f64,
    /// Enumeration stops for a block once this many allocations are found.
    pub max_results_per_block: usize,
    /// Upper bound on the bytes held by one block's result rows.
    pub memory_budget_bytes: usize,
}

impl Default for EnumerationConfig {
    fn default() -> Self {
        Self {
            grid_step: 1.0,
            block_tolerance: 0.01,
            max_results_per_block: 100_000,
            memory_budget_bytes: 256 * 1024 * 1024,
        }
    }
}

impl EnumerationConfig {
    pub fn with_grid_step(mut self, step: f64) -> Self {
        self.grid_step = step;
        self
    }

    pub fn with_block_tolerance(mut self, tolerance: f64) -> Self {
        self.block_tolerance = tolerance;
        self
    }

    pub fn with_max_results_per_block(mut self, max: usize) -> Self {
        self.max_results_per_block = max;
        self
    }

    pub fn with_memory_budget_bytes(mut self, bytes: usize) -> Self {
        self.memory_budget_bytes = bytes;
        self
    }
}

/// Variant merge settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MergeConfig {
    /// Number of best variants retained.
    pub top_k: usize,
    /// Combinations per parallel work unit.
    pub chunk_size: u64,
    /// Combinations explored at most; larger spaces are truncated.
    pub max_combinations: u64,
    /// Run chunks on the rayon pool instead of the calling thread.
    pub parallel: bool,
    /// Maximum difference for two blocks to agree on a shared slot.
    pub conflict_tolerance: f64,
}

impl Default for MergeConfig {
    fn default() -> Self {
        Self {
            top_k: 1000,
            chunk_size: 4096,
            max_combinations: 50_000_000,
            parallel: true,
            conflict_tolerance: 1e-6,
        }
    }
}

impl MergeConfig {
    pub fn with_top_k(mut self, k: usize) -> Self {
        self.top_k = k;
        self
    }

    pub fn with_chunk_size(mut self, size: u64) -> Self {
        self.chunk_size = size;
        self
    }

    pub fn with_max_combinations(mut self, max: u64) -> Self {
        self.max_combinations = max;
        self
    }

    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }
}

/// Complete solver configuration.
///
/// # Example
/// ```
/// use u_workload::solver::{SolverConfig, MergeConfig};
///
/// let config = SolverConfig::default()
///     .with_merge(MergeConfig::default().with_top_k(10).with_parallel(false));
/// assert_eq!(config.merge.top_k, 10);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SolverConfig {
    pub enumeration: EnumerationConfig,
    pub merge: MergeConfig,
    pub annealing: AnnealingConfig,
    /// Block tolerance used by greedy and annealing feasibility checks.
    pub search_tolerance: f64,
    /// Anneal from a feasible greedy seed instead of returning it directly.
    pub refine_greedy: bool,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            enumeration: EnumerationConfig::default(),
            merge: MergeConfig::default(),
            annealing: AnnealingConfig::default(),
            search_tolerance: 2.0,
            refine_greedy: false,
        }
    }
}

impl SolverConfig {
    pub fn with_enumeration(mut self, enumeration: EnumerationConfig) -> Self {
        self.enumeration = enumeration;
        self
    }

    pub fn with_merge(mut self, merge: MergeConfig) -> Self {
        self.merge = merge;
        self
    }

    pub fn with_annealing(mut self, annealing: AnnealingConfig) -> Self {
        self.annealing = annealing;
        self
    }

    pub fn with_search_tolerance(mut self, tolerance: f64) -> Self {
        self.search_tolerance = tolerance;
        self
    }

    pub fn with_refine_greedy(mut self, refine: bool) -> Self {
        self.refine_greedy = refine;
        self
    }
}
