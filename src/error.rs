//! Solver error taxonomy.

use crate::validation::ValidationError;

/// Reasons a solve produces no usable result.
///
/// Resource exhaustion is absent on purpose: it truncates a ranked result
/// and is reported through [`crate::solver::RankedVariants::truncations`].
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SolveError {
    /// The input or configuration failed validation.
    #[error("invalid input: {}", summarize(.0))]
    InvalidInput(Vec<ValidationError>),

    /// A block has no allocation matching its target.
    #[error("no solution for at least one block (block starting at semester {block_start})")]
    InfeasibleBlock { block_start: u32 },

    /// Local search never reached a constraint-satisfying allocation.
    #[error("no feasible allocation found")]
    NoFeasibleSolution,

    /// Cancelled before any usable result was produced.
    #[error("solve cancelled before a result was produced")]
    Cancelled,
}

fn summarize(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(|e| e.message.as_str())
        .collect::<Vec<_>>()
        .join("; ")
}

pub type Result<T> = std::result::Result<T, SolveError>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validation::ValidationErrorKind;

    #[test]
    fn test_display() {
        let err = SolveError::InvalidInput(vec![
            ValidationError::new(ValidationErrorKind::EmptyInput, "No disciplines to allocate"),
            ValidationError::new(ValidationErrorKind::DuplicateId, "Duplicate discipline ID: D1"),
        ]);
        assert_eq!(
            err.to_string(),
            "invalid input: No disciplines to allocate; Duplicate discipline ID: D1"
        );
        assert!(SolveError::InfeasibleBlock { block_start: 3 }
            .to_string()
            .contains("semester 3"));
    }
}
