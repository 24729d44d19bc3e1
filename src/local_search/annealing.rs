//! Simulated annealing over allocations.
//!
//! The annealing loop itself is `u_metaheur::sa`. This module supplies the
//! allocation side: the seed, neighbor moves, and a cost that folds the
//! block constraints in.
//!
//! # Cost
//!
//! ```text
//! cost = −objective                 if every block is within tolerance
//!      = P · (1 + violation)        otherwise,  P = 1000 · max(T0, 1)
//! ```
//!
//! Feasible costs are `≤ 0` and infeasible ones `≥ P`. A move from a
//! feasible point to an infeasible one has `Δ ≥ P ≥ 1000·T`, and
//! `exp(−1000)` underflows to zero, so it is never accepted. From an
//! infeasible point the cost falls with the violation, which walks the
//! search into the feasible region.
//!
//! # References
//!
//! - Kirkpatrick, Gelatt & Vecchi (1983), "Optimization by Simulated Annealing"
//! - Metropolis et al. (1953), "Equation of State Calculations by Fast
//!   Computing Machines"

use rand::Rng;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use u_metaheur::sa::{CoolingSchedule, SaConfig, SaProblem, SaRunner};

use crate::error::SolveError;
use crate::evaluation::{block_violation, objective};
use crate::models::{Allocation, SlotLayout};
use crate::solver::CancelToken;
use crate::validation::{ValidationError, ValidationErrorKind};

/// Infeasible cost floor, as a multiple of the initial temperature.
const PENALTY_FACTOR: f64 = 1000.0;

/// Annealing parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnnealingConfig {
    pub initial_temperature: f64,
    /// Fraction of the temperature removed each iteration.
    pub cooling_rate: f64,
    /// The run ends once the temperature drops to this floor.
    pub min_temperature: f64,
    /// Largest absolute shift applied to one slot in a neighbor move.
    pub step_size: f64,
    /// Upper bound on slots perturbed per move (at least one is).
    pub max_perturbed: usize,
    /// Wall-clock budget.
    pub time_limit: Duration,
    pub max_iterations: Option<u64>,
    /// RNG seed; `None` draws one at random.
    pub seed: Option<u64>,
}

impl Default for AnnealingConfig {
    fn default() -> Self {
        Self {
            initial_temperature: 1000.0,
            cooling_rate: 0.003,
            min_temperature: 1.0,
            step_size: 0.5,
            max_perturbed: 4,
            time_limit: Duration::from_secs(300),
            max_iterations: None,
            seed: None,
        }
    }
}

impl AnnealingConfig {
    pub fn with_initial_temperature(mut self, temperature: f64) -> Self {
        self.initial_temperature = temperature;
        self
    }

    pub fn with_cooling_rate(mut self, rate: f64) -> Self {
        self.cooling_rate = rate;
        self
    }

    pub fn with_min_temperature(mut self, temperature: f64) -> Self {
        self.min_temperature = temperature;
        self
    }

    pub fn with_step_size(mut self, step: f64) -> Self {
        self.step_size = step;
        self
    }

    pub fn with_time_limit(mut self, limit: Duration) -> Self {
        self.time_limit = limit;
        self
    }

    pub fn with_max_iterations(mut self, iterations: u64) -> Self {
        self.max_iterations = Some(iterations);
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Runner settings: geometric cooling by `1 − cooling_rate`, one move
    /// per temperature step.
    pub fn sa_config(&self) -> SaConfig {
        let mut config = SaConfig::default()
            .with_initial_temperature(self.initial_temperature)
            .with_min_temperature(self.min_temperature)
            .with_cooling(CoolingSchedule::Geometric {
                alpha: 1.0 - self.cooling_rate,
            })
            .with_iterations_per_temperature(1)
            .with_max_iterations(self.max_iterations.map_or(0, |n| {
                usize::try_from(n).unwrap_or(usize::MAX)
            }));
        config.seed = self.seed;
        config
    }
}

/// Why an annealing run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StopReason {
    TemperatureFloor,
    TimeLimit,
    IterationLimit,
    Cancelled,
}

/// Outcome of an annealing run.
#[derive(Debug, Clone, PartialEq)]
pub struct AnnealingRun {
    /// Best feasible allocation seen, if any.
    pub best: Option<Allocation>,
    /// Objective of `best`, `-inf` when there is none.
    pub objective: f64,
    pub iterations: u64,
    pub accepted: u64,
    pub final_temperature: f64,
    pub stop_reason: StopReason,
}

/// Annealing view of an allocation problem.
pub struct AllocationAnnealing<'a> {
    layout: &'a SlotLayout,
    seed: Allocation,
    movable: Vec<usize>,
    tolerance: f64,
    step_size: f64,
    max_perturbed: usize,
    penalty: f64,
    caller: &'a CancelToken,
    /// Child of `caller` carrying the time limit; its flag stops the runner.
    stop: CancelToken,
}

impl<'a> AllocationAnnealing<'a> {
    /// The time limit counts from construction.
    pub fn new(
        layout: &'a SlotLayout,
        seed: Allocation,
        tolerance: f64,
        config: &AnnealingConfig,
        cancel: &'a CancelToken,
    ) -> Self {
        Self {
            layout,
            seed,
            movable: layout.movable_slots(),
            tolerance,
            step_size: config.step_size,
            max_perturbed: config.max_perturbed.max(1),
            penalty: PENALTY_FACTOR * config.initial_temperature.max(1.0),
            caller: cancel,
            stop: cancel.child_with_timeout(config.time_limit),
        }
    }

    /// Slots neighbor moves may change.
    pub fn movable(&self) -> &[usize] {
        &self.movable
    }

    /// Anneals from the seed and returns the best feasible allocation seen.
    pub fn run(&self, config: &AnnealingConfig) -> Result<AnnealingRun, SolveError> {
        let sa_config = config.sa_config();
        sa_config.validate().map_err(|message| {
            SolveError::InvalidInput(vec![ValidationError::new(
                ValidationErrorKind::InvalidConfig,
                message,
            )])
        })?;

        self.stop.poll();
        let result = SaRunner::run_with_cancel(self, &sa_config, Some(self.stop.flag()));

        let iterations = result.iterations as u64;
        let stop_reason = if result.cancelled {
            if self.caller.is_cancelled() {
                StopReason::Cancelled
            } else {
                StopReason::TimeLimit
            }
        } else if config.max_iterations.is_some_and(|max| iterations >= max) {
            StopReason::IterationLimit
        } else {
            StopReason::TemperatureFloor
        };

        let feasible = block_violation(self.layout, &result.best, self.tolerance) <= 0.0;
        let (best, objective) = if feasible {
            (Some(result.best), -result.best_cost)
        } else {
            (None, f64::NEG_INFINITY)
        };

        tracing::debug!(
            iterations,
            accepted = result.accepted_moves,
            improving = result.improving_moves,
            objective,
            final_temperature = result.final_temperature,
            stop_reason = ?stop_reason,
            "annealing finished"
        );

        Ok(AnnealingRun {
            best,
            objective,
            iterations,
            accepted: result.accepted_moves as u64,
            final_temperature: result.final_temperature,
            stop_reason,
        })
    }
}

impl SaProblem for AllocationAnnealing<'_> {
    type Solution = Allocation;

    fn initial_solution<R: Rng>(&self, _rng: &mut R) -> Allocation {
        self.seed.clone()
    }

    fn cost(&self, solution: &Allocation) -> f64 {
        let violation = block_violation(self.layout, solution, self.tolerance);
        if violation > 0.0 {
            self.penalty * (1.0 + violation)
        } else {
            -objective(self.layout, solution)
        }
    }

    fn neighbor<R: Rng>(&self, solution: &Allocation, rng: &mut R) -> Allocation {
        self.stop.poll();
        let mut next = solution.clone();
        if self.movable.is_empty() {
            return next;
        }
        let changes = rng.random_range(1..=self.max_perturbed);
        for _ in 0..changes {
            let index = self.movable[rng.random_range(0..self.movable.len())];
            let slot = self.layout.slot(index);
            let shift = rng.random_range(-self.step_size..=self.step_size);
            next.set(index, (next.value(index) + shift).clamp(slot.min, slot.max));
        }
        next
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::evaluation::{are_blocks_valid, is_within_bounds};
    use crate::models::{AllocationProblem, BlockTargets, Discipline, ProblemInput};
    use rand::rngs::SmallRng;
    use rand::SeedableRng;

    /// D1 in block 1, D2 in block 3, excluded D3 fixed at 5 in semester 2.
    fn problem(target_1: f64, target_3: f64) -> AllocationProblem {
        let input = ProblemInput::new(
            vec![
                Discipline::new("D1", "Algebra")
                    .with_bounds(0.0, 10.0)
                    .with_semesters(vec![1]),
                Discipline::new("D3", "Ontology")
                    .with_fixed_hours(5.0)
                    .with_semesters(vec![2]),
                Discipline::new("D2", "Physics")
                    .with_bounds(0.0, 10.0)
                    .with_semesters(vec![3]),
            ],
            BlockTargets::new()
                .with_target(1, target_1)
                .with_target(3, target_3),
        )
        .with_exclusions(["Ontology"].into_iter().collect());
        AllocationProblem::compile(input).unwrap()
    }

    fn seed(values: [f64; 3]) -> Allocation {
        Allocation::new(values.to_vec())
    }

    fn config() -> AnnealingConfig {
        AnnealingConfig::default().with_seed(42)
    }

    #[test]
    fn test_sa_config_mapping() {
        let sa = config().with_max_iterations(50).sa_config();
        assert_eq!(sa.initial_temperature, 1000.0);
        assert_eq!(sa.min_temperature, 1.0);
        assert_eq!(sa.iterations_per_temperature, 1);
        assert_eq!(sa.max_iterations, 50);
        assert_eq!(sa.seed, Some(42));
        match sa.cooling {
            CoolingSchedule::Geometric { alpha } => assert!((alpha - 0.997).abs() < 1e-12),
            other => panic!("unexpected cooling {other:?}"),
        }
        assert_eq!(AnnealingConfig::default().sa_config().max_iterations, 0);
    }

    #[test]
    fn test_cost_ranks_every_feasible_point_below_infeasible() {
        let p = problem(7.0, 7.0);
        let cancel = CancelToken::new();
        let annealing = AllocationAnnealing::new(p.layout(), seed([7.0, 5.0, 7.0]), 2.0, &config(), &cancel);

        let feasible = annealing.cost(&seed([8.0, 5.0, 8.0]));
        let slightly_off = annealing.cost(&seed([9.5, 5.0, 7.0]));
        let far_off = annealing.cost(&seed([0.0, 5.0, 0.0]));
        assert!(feasible <= 0.0);
        assert!((feasible + 320.0).abs() < 1e-9);
        assert!(slightly_off >= annealing.penalty);
        assert!(far_off > slightly_off);

        // A feasible → infeasible move is rejected at the hottest temperature.
        let delta = slightly_off - feasible;
        assert_eq!((-delta / config().initial_temperature).exp(), 0.0);
    }

    #[test]
    fn test_excluded_slot_is_never_perturbed() {
        let p = problem(7.0, 7.0);
        let cancel = CancelToken::new();
        let annealing = AllocationAnnealing::new(
            p.layout(),
            p.layout().base_allocation(),
            2.0,
            &AnnealingConfig::default(),
            &cancel,
        );
        assert_eq!(annealing.movable(), &[0, 2]);

        let mut rng = SmallRng::seed_from_u64(3);
        let mut current = p.layout().base_allocation();
        for _ in 0..500 {
            current = annealing.neighbor(&current, &mut rng);
            assert_eq!(current.value(1), 5.0);
            assert!(is_within_bounds(p.layout(), &current));
        }
    }

    #[test]
    fn test_walks_from_infeasible_seed_into_feasible_region() {
        let p = problem(10.0, 4.0);
        let cancel = CancelToken::new();
        let annealing = AllocationAnnealing::new(p.layout(), seed([7.0, 5.0, 7.0]), 0.5, &config(), &cancel);
        let run = annealing.run(&config()).unwrap();

        let best = run.best.unwrap();
        assert!(are_blocks_valid(p.layout(), &best, 0.5));
        assert_eq!(best.value(1), 5.0);
        assert!((objective(p.layout(), &best) - run.objective).abs() < 1e-9);
        assert_eq!(run.stop_reason, StopReason::TemperatureFloor);
    }

    #[test]
    fn test_unreachable_targets_yield_nothing() {
        let p = problem(40.0, 40.0);
        let cancel = CancelToken::new();
        let annealing = AllocationAnnealing::new(p.layout(), seed([10.0, 5.0, 10.0]), 2.0, &config(), &cancel);
        let run = annealing.run(&config()).unwrap();
        assert!(run.best.is_none());
        assert_eq!(run.objective, f64::NEG_INFINITY);
    }

    #[test]
    fn test_iteration_limit() {
        let p = problem(7.0, 7.0);
        let cfg = config().with_max_iterations(10);
        let cancel = CancelToken::new();
        let annealing = AllocationAnnealing::new(p.layout(), seed([7.0, 5.0, 7.0]), 2.0, &cfg, &cancel);
        let run = annealing.run(&cfg).unwrap();
        assert_eq!(run.iterations, 10);
        assert_eq!(run.stop_reason, StopReason::IterationLimit);
    }

    #[test]
    fn test_time_limit_stops_without_cancelling_caller() {
        let p = problem(7.0, 7.0);
        let cfg = config().with_time_limit(Duration::ZERO);
        let cancel = CancelToken::new();
        let annealing = AllocationAnnealing::new(p.layout(), seed([7.0, 5.0, 7.0]), 2.0, &cfg, &cancel);
        let run = annealing.run(&cfg).unwrap();
        assert_eq!(run.stop_reason, StopReason::TimeLimit);
        assert_eq!(run.iterations, 0);
        assert_eq!(run.best, Some(seed([7.0, 5.0, 7.0])));
        assert!(!cancel.is_cancelled());
    }

    #[test]
    fn test_cancelled() {
        let p = problem(7.0, 7.0);
        let cancel = CancelToken::new();
        cancel.cancel();
        let annealing = AllocationAnnealing::new(p.layout(), seed([7.0, 5.0, 7.0]), 2.0, &config(), &cancel);
        let run = annealing.run(&config()).unwrap();
        assert_eq!(run.stop_reason, StopReason::Cancelled);
        assert_eq!(run.iterations, 0);
    }

    #[test]
    fn test_seed_reproducible() {
        let p = problem(10.0, 4.0);
        let cancel = CancelToken::new();
        let a = AllocationAnnealing::new(p.layout(), seed([7.0, 5.0, 7.0]), 0.5, &config(), &cancel)
            .run(&config())
            .unwrap();
        let b = AllocationAnnealing::new(p.layout(), seed([7.0, 5.0, 7.0]), 0.5, &config(), &cancel)
            .run(&config())
            .unwrap();
        assert_eq!(a.best, b.best);
        assert_eq!(a.accepted, b.accepted);
    }

    #[test]
    fn test_invalid_runner_config_is_an_error() {
        let p = problem(7.0, 7.0);
        let cfg = config().with_min_temperature(5000.0);
        let cancel = CancelToken::new();
        let annealing = AllocationAnnealing::new(p.layout(), seed([7.0, 5.0, 7.0]), 2.0, &cfg, &cancel);
        assert!(matches!(annealing.run(&cfg), Err(SolveError::InvalidInput(_))));
    }
}
