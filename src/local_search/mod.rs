//! Local-search strategy: one continuous-domain allocation.
//!
//! # Algorithm
//!
//! 1. [`greedy_seed`] distributes the total target hours proportionally to
//!    coefficients. A seed that meets every block target is returned as is
//!    (unless refinement is requested).
//! 2. Otherwise [`AllocationAnnealing`] anneals from the seed on the
//!    `u_metaheur` runner. Neighbor moves shift one to `max_perturbed`
//!    movable slots by at most `step_size`, clamped to their bounds.
//!    Excluded, fixed and unconstrained slots never move.
//! 3. The best feasible allocation seen is returned; if none was seen the
//!    solve fails with [`SolveError::NoFeasibleSolution`], or with
//!    [`SolveError::Cancelled`] when the caller cancelled first.

mod annealing;
mod greedy;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

pub use annealing::{AllocationAnnealing, AnnealingConfig, AnnealingRun, StopReason};
pub use greedy::greedy_seed;

use crate::error::SolveError;
use crate::evaluation::{block_violation, objective};
use crate::models::{SlotLayout, Variant};
use crate::solver::{CancelToken, SolverConfig};

/// Which stage produced a local-search result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LocalSearchPhase {
    Greedy,
    Annealing,
}

/// Result of a local search.
#[derive(Debug, Clone, PartialEq)]
pub struct LocalSearchOutcome {
    pub variant: Variant,
    pub phase: LocalSearchPhase,
    /// Annealing iterations run (zero for a greedy result).
    pub iterations: u64,
}

/// Greedy seed followed by simulated annealing.
pub struct LocalSearchSolver<'a> {
    layout: &'a SlotLayout,
    config: &'a SolverConfig,
    cancel: &'a CancelToken,
}

impl<'a> LocalSearchSolver<'a> {
    pub fn new(layout: &'a SlotLayout, config: &'a SolverConfig, cancel: &'a CancelToken) -> Self {
        Self {
            layout,
            config,
            cancel,
        }
    }

    #[tracing::instrument(level = "debug", name = "local search", skip(self))]
    pub fn solve(&self) -> Result<LocalSearchOutcome, SolveError> {
        let seed = greedy_seed(self.layout);
        let seed_violation = block_violation(self.layout, &seed, self.config.search_tolerance);
        debug!(seed_violation, "greedy seed built");

        if seed_violation <= 0.0 && !self.config.refine_greedy {
            let value = objective(self.layout, &seed);
            info!(objective = value, "greedy seed satisfies every block");
            return Ok(LocalSearchOutcome {
                variant: Variant::new(seed, value),
                phase: LocalSearchPhase::Greedy,
                iterations: 0,
            });
        }

        let annealing = AllocationAnnealing::new(
            self.layout,
            seed,
            self.config.search_tolerance,
            &self.config.annealing,
            self.cancel,
        );
        let run = annealing.run(&self.config.annealing)?;

        match run.best {
            Some(best) => {
                info!(
                    objective = run.objective,
                    iterations = run.iterations,
                    stop_reason = ?run.stop_reason,
                    "annealing produced a feasible allocation"
                );
                Ok(LocalSearchOutcome {
                    variant: Variant::new(best, run.objective),
                    phase: LocalSearchPhase::Annealing,
                    iterations: run.iterations,
                })
            }
            None if run.stop_reason == StopReason::Cancelled => Err(SolveError::Cancelled),
            None => Err(SolveError::NoFeasibleSolution),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::evaluation::{are_blocks_valid, is_within_bounds};
    use crate::models::{AllocationProblem, BlockTargets, Discipline, ProblemInput};
    use std::time::Duration;

    fn config() -> SolverConfig {
        SolverConfig::default().with_annealing(AnnealingConfig::default().with_seed(7))
    }

    fn two_blocks(tolerance_target_gap: f64) -> AllocationProblem {
        let input = ProblemInput::new(
            vec![
                Discipline::new("D1", "Algebra")
                    .with_bounds(0.0, 10.0)
                    .with_semesters(vec![1]),
                Discipline::new("D2", "Physics")
                    .with_bounds(0.0, 10.0)
                    .with_semesters(vec![3]),
                Discipline::new("D3", "Ontology")
                    .with_fixed_hours(5.0)
                    .with_semesters(vec![2]),
            ],
            BlockTargets::new()
                .with_target(1, 7.0 + tolerance_target_gap)
                .with_target(3, 7.0 - tolerance_target_gap),
        )
        .with_exclusions(["Ontology"].into_iter().collect());
        AllocationProblem::compile(input).unwrap()
    }

    #[test]
    fn test_greedy_result_returned_when_feasible() {
        let p = two_blocks(0.0);
        let cfg = config();
        let cancel = CancelToken::new();
        let outcome = LocalSearchSolver::new(p.layout(), &cfg, &cancel).solve().unwrap();
        assert_eq!(outcome.phase, LocalSearchPhase::Greedy);
        assert_eq!(outcome.iterations, 0);
        assert!((outcome.variant.allocation.value(0) - 7.0).abs() < 1e-9);
    }

    #[test]
    fn test_annealing_repairs_greedy_seed() {
        // Greedy splits 14 hours evenly; block targets are 10 and 4.
        let p = two_blocks(3.0);
        let cfg = config().with_search_tolerance(0.5);
        let cancel = CancelToken::new();
        let outcome = LocalSearchSolver::new(p.layout(), &cfg, &cancel).solve().unwrap();

        assert_eq!(outcome.phase, LocalSearchPhase::Annealing);
        let alloc = &outcome.variant.allocation;
        assert!(is_within_bounds(p.layout(), alloc));
        assert!(are_blocks_valid(p.layout(), alloc, 0.5));
        assert_eq!(alloc.value(2), 5.0);
    }

    #[test]
    fn test_refine_greedy_never_worsens() {
        let p = two_blocks(0.0);
        let cancel = CancelToken::new();
        let plain = config();
        let refined = config().with_refine_greedy(true);
        let a = LocalSearchSolver::new(p.layout(), &plain, &cancel).solve().unwrap();
        let b = LocalSearchSolver::new(p.layout(), &refined, &cancel).solve().unwrap();
        assert!(b.variant.objective >= a.variant.objective);
        assert!(are_blocks_valid(p.layout(), &b.variant.allocation, 2.0));
    }

    #[test]
    fn test_unreachable_target_has_no_feasible_solution() {
        let input = ProblemInput::new(
            vec![
                Discipline::new("D1", "A").with_bounds(0.0, 10.0).with_semesters(vec![1]),
                Discipline::new("D2", "B").with_bounds(0.0, 10.0).with_semesters(vec![2]),
            ],
            BlockTargets::new().with_target(1, 50.0),
        );
        let p = AllocationProblem::compile(input).unwrap();
        let cfg = config();
        let cancel = CancelToken::new();
        let err = LocalSearchSolver::new(p.layout(), &cfg, &cancel).solve().unwrap_err();
        assert_eq!(err, SolveError::NoFeasibleSolution);
    }

    #[test]
    fn test_cancelled_before_feasible_is_an_error() {
        let p = two_blocks(3.0);
        let cfg = config().with_search_tolerance(0.5);
        let cancel = CancelToken::new();
        cancel.cancel();
        let err = LocalSearchSolver::new(p.layout(), &cfg, &cancel).solve().unwrap_err();
        assert_eq!(err, SolveError::Cancelled);
    }

    #[test]
    fn test_time_limit_keeps_seed_when_feasible() {
        let p = two_blocks(0.0);
        let cfg = SolverConfig::default()
            .with_refine_greedy(true)
            .with_annealing(AnnealingConfig::default().with_time_limit(Duration::ZERO));
        let cancel = CancelToken::new();
        let outcome = LocalSearchSolver::new(p.layout(), &cfg, &cancel).solve().unwrap();
        assert_eq!(outcome.phase, LocalSearchPhase::Annealing);
        assert_eq!(outcome.iterations, 0);
        assert_eq!(outcome.variant.allocation, greedy_seed(p.layout()));
        assert!(!cancel.is_cancelled());
    }
}
