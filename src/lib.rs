//! Workload-hour allocation for the U-Engine ecosystem.
//!
//! Distributes hours across disciplines so that every two-semester block
//! meets its target sum while maximizing the product, over semesters, of
//! coefficient-weighted semester sums.
//!
//! # Modules
//!
//! - **`models`**: Domain types: `Discipline`, `BlockTargets`, `ExclusionSet`,
//!   `ProblemInput`, `AllocationProblem`, `SlotLayout`, `Allocation`, `Variant`
//! - **`validation`**: Input and configuration integrity checks
//! - **`evaluation`**: Block constraints, objective, allocation reports
//! - **`enumeration`**: Bounded per-block backtracking and the parallel
//!   top-K variant merge
//! - **`local_search`**: Greedy proportional seed and simulated annealing
//! - **`solver`**: `AllocationSolver` facade, configuration, cancellation
//!
//! # Example
//! ```
//! use u_workload::{AllocationSolver, BlockTargets, Discipline, ProblemInput, SolveMode, SolverConfig};
//!
//! let input = ProblemInput::new(
//!     vec![
//!         Discipline::new("D1", "Algebra").with_bounds(2.0, 8.0).with_semesters(vec![1]),
//!         Discipline::new("D2", "Physics").with_bounds(2.0, 8.0).with_semesters(vec![2]),
//!     ],
//!     BlockTargets::new().with_target(1, 10.0),
//! );
//!
//! let mut solver = AllocationSolver::new(SolverConfig::default());
//! let outcome = solver.solve(input, SolveMode::LocalSearch).unwrap();
//! assert!(outcome.report().unwrap().meets_tolerance(2.0));
//! ```
//!
//! # References
//!
//! - Kirkpatrick, Gelatt & Vecchi (1983), "Optimization by Simulated Annealing"
//! - Land & Doig (1960), "An Automatic Method of Solving Discrete
//!   Programming Problems"

pub mod enumeration;
pub mod error;
pub mod evaluation;
pub mod local_search;
pub mod models;
pub mod solver;
pub mod validation;

pub use error::SolveError;
pub use models::{
    Allocation, AllocationProblem, BlockTargets, Discipline, ExclusionSet, ModelOptions,
    ProblemInput, Variant,
};
pub use solver::{
    AllocationSolver, CancelToken, RankedVariants, SolveMode, SolveOutcome, SolveResult,
    SolverConfig,
};
