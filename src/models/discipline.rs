//! Discipline (allocatable item) model.
//!
//! A discipline is a course that receives workload hours. It carries a
//! permitted hour range, a significance coefficient and the semesters it
//! spans.

use serde::{Deserialize, Serialize};

use crate::validation::{ValidationError, ValidationErrorKind};

/// A discipline whose workload hours are allocated by the solver.
///
/// # Hours
/// `min_hours` and `max_hours` bound every value assigned to the
/// discipline (or to each of its per-semester instances). A discipline
/// with `min_hours == max_hours` is fixed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Discipline {
    /// Unique discipline identifier.
    pub id: String,
    /// Human-readable name. Not guaranteed unique; exclusions match on it.
    pub name: String,
    /// Lower hour bound.
    pub min_hours: f64,
    /// Upper hour bound.
    pub max_hours: f64,
    /// Significance weight (non-negative).
    pub coefficient: f64,
    /// Semesters (1-based) the discipline is taught in, ascending.
    pub semesters: Vec<u32>,
}

impl Discipline {
    /// Creates a discipline with zero bounds, unit coefficient and no semesters.
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            min_hours: 0.0,
            max_hours: 0.0,
            coefficient: 1.0,
            semesters: Vec::new(),
        }
    }

    /// Sets the hour bounds.
    pub fn with_bounds(mut self, min_hours: f64, max_hours: f64) -> Self {
        self.min_hours = min_hours;
        self.max_hours = max_hours;
        self
    }

    /// Fixes the discipline at a single hour value.
    pub fn with_fixed_hours(self, hours: f64) -> Self {
        self.with_bounds(hours, hours)
    }

    /// Sets the significance coefficient.
    pub fn with_coefficient(mut self, coefficient: f64) -> Self {
        self.coefficient = coefficient;
        self
    }

    /// Sets the semesters. The list is sorted; duplicates are kept so that
    /// validation can report them.
    pub fn with_semesters(mut self, semesters: impl Into<Vec<u32>>) -> Self {
        let mut semesters = semesters.into();
        semesters.sort_unstable();
        self.semesters = semesters;
        self
    }

    /// Whether the discipline has a single admissible value.
    pub fn is_fixed(&self) -> bool {
        self.min_hours == self.max_hours
    }

    /// Number of semesters spanned.
    pub fn span(&self) -> usize {
        self.semesters.len()
    }

    /// Whether the discipline is taught in `semester`.
    pub fn is_active_in(&self, semester: u32) -> bool {
        self.semesters.contains(&semester)
    }

    /// Clamps `hours` into the discipline's bounds.
    pub fn clamp(&self, hours: f64) -> f64 {
        hours.clamp(self.min_hours, self.max_hours)
    }

    /// Parses a comma-separated semester cell such as `"3, 4"`.
    ///
    /// Returns an [`ValidationErrorKind::InvalidSemesters`] error for empty
    /// cells, non-numeric entries, semester `0` and semesters beyond
    /// [`MAX_SEMESTER`](super::MAX_SEMESTER).
    pub fn parse_semesters(text: &str) -> Result<Vec<u32>, ValidationError> {
        let mut semesters = Vec::new();
        for part in text.split(',') {
            let part = part.trim();
            let semester: u32 = part.parse().map_err(|_| {
                ValidationError::new(
                    ValidationErrorKind::InvalidSemesters,
                    format!("Malformed semester entry '{part}' in '{text}'"),
                )
            })?;
            if semester == 0 {
                return Err(ValidationError::new(
                    ValidationErrorKind::InvalidSemesters,
                    format!("Semester numbers start at 1, got 0 in '{text}'"),
                ));
            }
            if semester > super::MAX_SEMESTER {
                return Err(ValidationError::new(
                    ValidationErrorKind::InvalidSemesters,
                    format!("Semester {semester} beyond {} in '{text}'", super::MAX_SEMESTER),
                ));
            }
            semesters.push(semester);
        }
        semesters.sort_unstable();
        Ok(semesters)
    }
}
