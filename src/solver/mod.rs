//! Solver facade.
//!
//! [`AllocationSolver`] validates an input, runs the selected strategy and
//! tracks its progress through [`SolverState`]:
//!
//! ```text
//! Idle → Validating → EnumeratingBlocks → Merging → Done
//!                   ↘ LocalSearching ────────────↗
//! (any stage) → Failed
//! ```
//!
//! # Strategies
//!
//! - [`SolveMode::LocalSearch`]: greedy seed plus simulated annealing, one
//!   allocation.
//! - [`SolveMode::Enumerate`]: per-block enumeration and a parallel top-K
//!   merge, a ranked list of allocations.
//!
//! # Example
//! ```
//! use u_workload::models::{BlockTargets, Discipline, ProblemInput};
//! use u_workload::solver::{AllocationSolver, SolveMode, SolverConfig};
//!
//! let input = ProblemInput::new(
//!     vec![
//!         Discipline::new("D1", "Algebra").with_bounds(0.0, 10.0).with_semesters(vec![1]),
//!         Discipline::new("D2", "Physics").with_bounds(0.0, 10.0).with_semesters(vec![2]),
//!     ],
//!     BlockTargets::new().with_target(1, 12.0),
//! );
//!
//! let mut solver = AllocationSolver::new(SolverConfig::default());
//! let outcome = solver.solve(input, SolveMode::Enumerate).unwrap();
//! let best = outcome.best().unwrap();
//! assert_eq!(best.objective, 36.0);
//! ```

mod cancel;
mod config;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

pub use cancel::CancelToken;
pub use config::{EnumerationConfig, MergeConfig, SolverConfig};

use crate::enumeration::{BlockEnumerator, Truncation, VariantMerger};
use crate::error::SolveError;
use crate::evaluation::AllocationReport;
use crate::local_search::LocalSearchSolver;
use crate::models::{AllocationProblem, ProblemInput, Variant};
use crate::validation::validate_config;

/// Strategy requested by the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SolveMode {
    /// One allocation from greedy seeding and annealing.
    #[default]
    LocalSearch,
    /// Ranked allocations from bounded enumeration.
    Enumerate,
}

/// Lifecycle of an [`AllocationSolver`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SolverState {
    #[default]
    Idle,
    Validating,
    EnumeratingBlocks,
    LocalSearching,
    Merging,
    Done,
    Failed,
}

/// Ranked result of the enumeration strategy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedVariants {
    /// Highest objective first.
    pub variants: Vec<Variant>,
    /// Bounds hit while producing `variants`; empty when the list is exact.
    pub truncations: Vec<Truncation>,
    /// Size of the full combination space, `None` if it overflows `u64`.
    pub total_combinations: Option<u64>,
    pub evaluated: u64,
    pub inconsistent: u64,
}

impl RankedVariants {
    /// Whether no bound cut the search short.
    pub fn is_complete(&self) -> bool {
        self.truncations.is_empty()
    }

    pub fn best(&self) -> Option<&Variant> {
        self.variants.first()
    }
}

/// Strategy-dependent payload of a successful solve.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SolveResult {
    Single(Variant),
    Ranked(RankedVariants),
}

/// A successful solve: the compiled problem and its result.
#[derive(Debug, Clone)]
pub struct SolveOutcome {
    pub problem: AllocationProblem,
    pub result: SolveResult,
}

impl SolveOutcome {
    /// Best allocation found, if any.
    pub fn best(&self) -> Option<&Variant> {
        match &self.result {
            SolveResult::Single(variant) => Some(variant),
            SolveResult::Ranked(ranked) => ranked.best(),
        }
    }

    /// Diagnostic report for the best allocation.
    pub fn report(&self) -> Option<AllocationReport> {
        self.best()
            .map(|v| AllocationReport::calculate(self.problem.layout(), &v.allocation))
    }
}

/// Entry point for solving workload allocation problems.
#[derive(Debug, Clone)]
pub struct AllocationSolver {
    config: SolverConfig,
    state: SolverState,
    cancel: CancelToken,
}

impl AllocationSolver {
    pub fn new(config: SolverConfig) -> Self {
        Self {
            config,
            state: SolverState::Idle,
            cancel: CancelToken::new(),
        }
    }

    /// Uses `token` for cancellation instead of a private one.
    pub fn with_cancel_token(mut self, token: CancelToken) -> Self {
        self.cancel = token;
        self
    }

    /// Handle that cancels a running [`solve`](Self::solve) from another thread.
    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    pub fn config(&self) -> &SolverConfig {
        &self.config
    }

    pub fn state(&self) -> SolverState {
        self.state
    }

    /// Validates `input` and runs the `mode` strategy on it.
    #[tracing::instrument(level = "info", skip(self, input), fields(disciplines = input.disciplines.len()))]
    pub fn solve(&mut self, input: ProblemInput, mode: SolveMode) -> Result<SolveOutcome, SolveError> {
        let result = self.run(input, mode);
        match &result {
            Ok(_) => self.transition(SolverState::Done),
            Err(e) => {
                warn!(error = %e, "solve failed");
                self.transition(SolverState::Failed);
            }
        }
        result
    }

    fn run(&mut self, input: ProblemInput, mode: SolveMode) -> Result<SolveOutcome, SolveError> {
        self.transition(SolverState::Validating);
        let problem = self.validate(input)?;

        let result = match mode {
            SolveMode::LocalSearch => {
                self.transition(SolverState::LocalSearching);
                let outcome =
                    LocalSearchSolver::new(problem.layout(), &self.config, &self.cancel).solve()?;
                SolveResult::Single(outcome.variant)
            }
            SolveMode::Enumerate => SolveResult::Ranked(self.enumerate(&problem)?),
        };

        Ok(SolveOutcome { problem, result })
    }

    /// Checks configuration and input together so every issue is reported.
    fn validate(&self, input: ProblemInput) -> Result<AllocationProblem, SolveError> {
        let config_errors = validate_config(&self.config).err().unwrap_or_default();
        match AllocationProblem::compile(input) {
            Ok(problem) if config_errors.is_empty() => Ok(problem),
            Ok(_) => Err(SolveError::InvalidInput(config_errors)),
            Err(SolveError::InvalidInput(mut errors)) => {
                errors.extend(config_errors);
                Err(SolveError::InvalidInput(errors))
            }
            Err(other) => Err(other),
        }
    }

    fn enumerate(&mut self, problem: &AllocationProblem) -> Result<RankedVariants, SolveError> {
        let layout = problem.layout();

        self.transition(SolverState::EnumeratingBlocks);
        let blocks =
            BlockEnumerator::new(layout, &self.config.enumeration, &self.cancel).enumerate_all()?;
        let mut truncations: Vec<Truncation> =
            blocks.iter().filter_map(|b| b.truncation()).collect();

        self.transition(SolverState::Merging);
        let base = layout.base_allocation();
        let merged = VariantMerger::new(layout, &self.config.merge, &self.cancel).merge(&blocks, &base);
        truncations.extend(merged.truncations);

        if merged.variants.is_empty() && truncations.contains(&Truncation::Cancelled) {
            return Err(SolveError::Cancelled);
        }
        if !truncations.is_empty() {
            warn!(?truncations, "ranked result is partial");
        }

        Ok(RankedVariants {
            variants: merged.variants,
            truncations,
            total_combinations: merged.total_combinations,
            evaluated: merged.evaluated,
            inconsistent: merged.inconsistent,
        })
    }

    fn transition(&mut self, next: SolverState) {
        info!(from = ?self.state, to = ?next, "solver state");
        self.state = next;
    }
}
