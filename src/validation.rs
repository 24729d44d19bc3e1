//! Input validation for allocation problems.
//!
//! Checks structural integrity of disciplines, block targets and solver
//! configuration before solving. Detects:
//! - Empty discipline sets
//! - Duplicate discipline IDs
//! - Inverted, negative or non-finite hour bounds
//! - Negative or non-finite coefficients
//! - Malformed semester lists
//! - Invalid or overlapping blocks
//! - Unusable solver settings
//!
//! Every issue is collected; validation does not stop at the first one.

use std::collections::HashSet;

use crate::models::{ProblemInput, MAX_SEMESTER};
use crate::solver::SolverConfig;

/// Validation result.
pub type ValidationResult = Result<(), Vec<ValidationError>>;

/// A validation error.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("{kind:?}: {message}")]
pub struct ValidationError {
    /// Error category.
    pub kind: ValidationErrorKind,
    /// Human-readable description.
    pub message: String,
}

/// Categories of validation errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationErrorKind {
    /// No disciplines were supplied.
    EmptyInput,
    /// Two disciplines share the same ID.
    DuplicateId,
    /// `min > max`, a negative bound, or a non-finite bound.
    InvalidBounds,
    /// Negative or non-finite coefficient.
    InvalidCoefficient,
    /// Empty, zero-based, out-of-range or duplicated semester list.
    InvalidSemesters,
    /// Block start outside `1..MAX_SEMESTER` or a negative / non-finite target.
    InvalidTarget,
    /// Two blocks share a semester.
    OverlappingBlocks,
    /// A solver setting outside its usable range.
    InvalidConfig,
}

impl ValidationError {
    pub(crate) fn new(kind: ValidationErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

/// Validates the input data of an allocation problem.
///
/// # Returns
/// `Ok(())` if all checks pass, `Err(errors)` with all detected issues.
pub fn validate_input(input: &ProblemInput) -> ValidationResult {
    let mut errors = Vec::new();

    if input.disciplines.is_empty() {
        errors.push(ValidationError::new(
            ValidationErrorKind::EmptyInput,
            "No disciplines to allocate",
        ));
    }

    let mut ids = HashSet::new();
    for d in &input.disciplines {
        if !ids.insert(d.id.as_str()) {
            errors.push(ValidationError::new(
                ValidationErrorKind::DuplicateId,
                format!("Duplicate discipline ID: {}", d.id),
            ));
        }

        if !d.min_hours.is_finite() || !d.max_hours.is_finite() {
            errors.push(ValidationError::new(
                ValidationErrorKind::InvalidBounds,
                format!("Discipline '{}' has non-finite hour bounds", d.id),
            ));
        } else if d.min_hours > d.max_hours {
            errors.push(ValidationError::new(
                ValidationErrorKind::InvalidBounds,
                format!(
                    "Discipline '{}' has min hours ({}) > max hours ({})",
                    d.id, d.min_hours, d.max_hours
                ),
            ));
        } else if d.min_hours < 0.0 {
            errors.push(ValidationError::new(
                ValidationErrorKind::InvalidBounds,
                format!("Discipline '{}' has negative min hours ({})", d.id, d.min_hours),
            ));
        }

        if !d.coefficient.is_finite() || d.coefficient < 0.0 {
            errors.push(ValidationError::new(
                ValidationErrorKind::InvalidCoefficient,
                format!("Discipline '{}' has invalid coefficient ({})", d.id, d.coefficient),
            ));
        }

        if d.semesters.is_empty() {
            errors.push(ValidationError::new(
                ValidationErrorKind::InvalidSemesters,
                format!("Discipline '{}' has no semesters", d.id),
            ));
        } else if d.semesters.contains(&0) {
            errors.push(ValidationError::new(
                ValidationErrorKind::InvalidSemesters,
                format!("Discipline '{}' references semester 0", d.id),
            ));
        } else if d.semesters.iter().any(|&s| s > MAX_SEMESTER) {
            errors.push(ValidationError::new(
                ValidationErrorKind::InvalidSemesters,
                format!(
                    "Discipline '{}' references a semester beyond {}",
                    d.id, MAX_SEMESTER
                ),
            ));
        } else if d.semesters.windows(2).any(|w| w[0] >= w[1]) {
            errors.push(ValidationError::new(
                ValidationErrorKind::InvalidSemesters,
                format!(
                    "Discipline '{}' has unordered or duplicate semesters {:?}",
                    d.id, d.semesters
                ),
            ));
        }
    }

    let blocks = input.targets.blocks();
    for block in &blocks {
        if block.start == 0 || block.start >= MAX_SEMESTER {
            errors.push(ValidationError::new(
                ValidationErrorKind::InvalidTarget,
                format!(
                    "Block start semester {} outside 1..{}",
                    block.start, MAX_SEMESTER
                ),
            ));
        }
        if !block.target.is_finite() || block.target < 0.0 {
            errors.push(ValidationError::new(
                ValidationErrorKind::InvalidTarget,
                format!("Block {} has invalid target ({})", block.start, block.target),
            ));
        }
    }
    // Blocks are sorted by start, so only neighbours can overlap.
    for pair in blocks.windows(2) {
        if pair[0].end() == Some(pair[1].start) {
            errors.push(ValidationError::new(
                ValidationErrorKind::OverlappingBlocks,
                format!(
                    "Blocks {} and {} share semester {}",
                    pair[0].start, pair[1].start, pair[1].start
                ),
            ));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Validates solver settings.
pub fn validate_config(config: &SolverConfig) -> ValidationResult {
    let mut errors = Vec::new();
    let mut check = |ok: bool, message: &str| {
        if !ok {
            errors.push(ValidationError::new(ValidationErrorKind::InvalidConfig, message));
        }
    };

    let e = &config.enumeration;
    check(e.grid_step.is_finite() && e.grid_step > 0.0, "grid_step must be positive");
    check(
        e.block_tolerance.is_finite() && e.block_tolerance >= 0.0,
        "block_tolerance must be non-negative",
    );
    check(e.max_results_per_block > 0, "max_results_per_block must be positive");

    let m = &config.merge;
    check(m.top_k > 0, "top_k must be positive");
    check(m.chunk_size > 0, "chunk_size must be positive");
    check(m.max_combinations > 0, "max_combinations must be positive");
    check(
        m.conflict_tolerance.is_finite() && m.conflict_tolerance >= 0.0,
        "conflict_tolerance must be non-negative",
    );

    let a = &config.annealing;
    check(
        a.initial_temperature.is_finite() && a.initial_temperature > 0.0,
        "initial_temperature must be positive",
    );
    check(
        a.cooling_rate > 0.0 && a.cooling_rate < 1.0,
        "cooling_rate must lie in (0, 1)",
    );
    check(
        a.min_temperature.is_finite() && a.min_temperature > 0.0,
        "min_temperature must be positive",
    );
    check(
        a.min_temperature < a.initial_temperature,
        "min_temperature must be below initial_temperature",
    );
    check(a.max_iterations != Some(0), "max_iterations must be positive when set");
    check(a.step_size.is_finite() && a.step_size > 0.0, "step_size must be positive");
    check(a.max_perturbed > 0, "max_perturbed must be positive");

    check(
        config.search_tolerance.is_finite() && config.search_tolerance >= 0.0,
        "search_tolerance must be non-negative",
    );

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{BlockTargets, Discipline};

    fn sample_disciplines() -> Vec<Discipline> {
        vec![
            Discipline::new("D1", "Algebra")
                .with_bounds(2.0, 6.0)
                .with_semesters(vec![1]),
            Discipline::new("D2", "Physics")
                .with_bounds(1.0, 4.0)
                .with_semesters(vec![2, 3]),
        ]
    }

    fn input(disciplines: Vec<Discipline>) -> ProblemInput {
        ProblemInput::new(disciplines, BlockTargets::standard_curriculum())
    }

    #[test]
    fn test_valid_input() {
        assert!(validate_input(&input(sample_disciplines())).is_ok());
    }

    #[test]
    fn test_empty_input() {
        let errors = validate_input(&input(vec![])).unwrap_err();
        assert!(errors.iter().any(|e| e.kind == ValidationErrorKind::EmptyInput));
    }

    #[test]
    fn test_duplicate_id() {
        let mut ds = sample_disciplines();
        ds.push(
            Discipline::new("D1", "Copy")
                .with_bounds(1.0, 2.0)
                .with_semesters(vec![4]),
        );
        let errors = validate_input(&input(ds)).unwrap_err();
        assert!(errors.iter().any(|e| e.kind == ValidationErrorKind::DuplicateId));
    }

    #[test]
    fn test_inverted_bounds() {
        let ds = vec![Discipline::new("D1", "Algebra")
            .with_bounds(6.0, 2.0)
            .with_semesters(vec![1])];
        let errors = validate_input(&input(ds)).unwrap_err();
        assert!(errors
            .iter()
            .any(|e| e.kind == ValidationErrorKind::InvalidBounds && e.message.contains("min hours")));
    }

    #[test]
    fn test_non_finite_values() {
        let ds = vec![Discipline::new("D1", "Algebra")
            .with_bounds(0.0, f64::NAN)
            .with_coefficient(f64::INFINITY)
            .with_semesters(vec![1])];
        let errors = validate_input(&input(ds)).unwrap_err();
        assert!(errors.iter().any(|e| e.kind == ValidationErrorKind::InvalidBounds));
        assert!(errors.iter().any(|e| e.kind == ValidationErrorKind::InvalidCoefficient));
    }

    #[test]
    fn test_malformed_semesters() {
        let ds = vec![
            Discipline::new("D1", "A").with_bounds(0.0, 1.0),
            Discipline::new("D2", "B")
                .with_bounds(0.0, 1.0)
                .with_semesters(vec![0, 1]),
            Discipline::new("D3", "C")
                .with_bounds(0.0, 1.0)
                .with_semesters(vec![2, 2]),
        ];
        let errors = validate_input(&input(ds)).unwrap_err();
        let count = errors
            .iter()
            .filter(|e| e.kind == ValidationErrorKind::InvalidSemesters)
            .count();
        assert_eq!(count, 3);
    }

    #[test]
    fn test_overlapping_blocks() {
        let targets = BlockTargets::new().with_target(1, 10.0).with_target(2, 10.0);
        let errors = validate_input(&ProblemInput::new(sample_disciplines(), targets)).unwrap_err();
        assert!(errors
            .iter()
            .any(|e| e.kind == ValidationErrorKind::OverlappingBlocks));
    }

    #[test]
    fn test_invalid_target() {
        let targets = BlockTargets::new().with_target(0, -1.0);
        let errors = validate_input(&ProblemInput::new(sample_disciplines(), targets)).unwrap_err();
        assert_eq!(
            errors
                .iter()
                .filter(|e| e.kind == ValidationErrorKind::InvalidTarget)
                .count(),
            2
        );
    }

    #[test]
    fn test_block_start_beyond_ceiling() {
        let targets = BlockTargets::new().with_target(u32::MAX, 5.0);
        let errors = validate_input(&ProblemInput::new(sample_disciplines(), targets)).unwrap_err();
        assert!(errors
            .iter()
            .any(|e| e.kind == ValidationErrorKind::InvalidTarget));

        let targets = BlockTargets::new().with_target(MAX_SEMESTER - 1, 5.0);
        assert!(validate_input(&ProblemInput::new(sample_disciplines(), targets)).is_ok());
    }

    #[test]
    fn test_semester_beyond_ceiling() {
        let ds = vec![Discipline::new("D1", "Algebra")
            .with_bounds(0.0, 1.0)
            .with_semesters(vec![1, u32::MAX - 1])];
        let errors = validate_input(&input(ds)).unwrap_err();
        assert!(errors
            .iter()
            .any(|e| e.kind == ValidationErrorKind::InvalidSemesters));
    }

    #[test]
    fn test_default_config_is_valid() {
        assert!(validate_config(&SolverConfig::default()).is_ok());
    }

    #[test]
    fn test_invalid_config() {
        let mut config = SolverConfig::default();
        config.enumeration.grid_step = 0.0;
        config.merge.top_k = 0;
        config.annealing.cooling_rate = 1.5;
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 3);
        assert!(errors.iter().all(|e| e.kind == ValidationErrorKind::InvalidConfig));
    }

    #[test]
    fn test_annealing_schedule_must_cool() {
        let mut config = SolverConfig::default();
        config.annealing.min_temperature = config.annealing.initial_temperature;
        config.annealing.max_iterations = Some(0);
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 2);
        assert!(errors[0].message.contains("min_temperature"));
        assert!(errors[1].message.contains("max_iterations"));
    }
}
