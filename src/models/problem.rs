//! Problem input and its compiled, immutable form.

use serde::{Deserialize, Serialize};

use super::{Allocation, BlockTargets, Discipline, ExclusionSet, Granularity, ModelOptions, Slot, SlotLayout};
use crate::error::SolveError;
use crate::validation::validate_input;

/// Raw input handed over by the I/O layer.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProblemInput {
    /// Disciplines in input order.
    pub disciplines: Vec<Discipline>,
    /// Block start semester → target hours.
    pub targets: BlockTargets,
    /// Names pinned at their minimum.
    pub exclusions: ExclusionSet,
    pub options: ModelOptions,
}

impl ProblemInput {
    pub fn new(disciplines: Vec<Discipline>, targets: BlockTargets) -> Self {
        Self {
            disciplines,
            targets,
            exclusions: ExclusionSet::new(),
            options: ModelOptions::default(),
        }
    }

    pub fn with_exclusions(mut self, exclusions: ExclusionSet) -> Self {
        self.exclusions = exclusions;
        self
    }

    pub fn with_options(mut self, options: ModelOptions) -> Self {
        self.options = options;
        self
    }

    /// Adds a discipline.
    pub fn with_discipline(mut self, discipline: Discipline) -> Self {
        self.disciplines.push(discipline);
        self
    }
}

/// One exported row of an allocation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AllocationEntry {
    pub discipline_id: String,
    pub name: String,
    /// Semester instance, `None` for whole-discipline slots.
    pub semester: Option<u32>,
    pub hours: f64,
    pub coefficient: f64,
    /// Whether the discipline had room to move (`max > min`).
    pub adjustable: bool,
}

/// A validated problem together with its slot layout.
///
/// Immutable for the duration of a solve.
#[derive(Debug, Clone, PartialEq)]
pub struct AllocationProblem {
    input: ProblemInput,
    layout: SlotLayout,
}

impl AllocationProblem {
    /// Validates `input` and expands it into slots.
    pub fn compile(input: ProblemInput) -> Result<Self, SolveError> {
        validate_input(&input).map_err(SolveError::InvalidInput)?;

        for name in input.exclusions.names() {
            if !input.disciplines.iter().any(|d| d.name == name) {
                tracing::warn!(name, "excluded discipline not present in input");
            }
        }

        let layout = build_layout(&input);
        tracing::debug!(
            disciplines = input.disciplines.len(),
            slots = layout.len(),
            blocks = layout.blocks().len(),
            "compiled allocation problem"
        );
        Ok(Self { input, layout })
    }

    pub fn input(&self) -> &ProblemInput {
        &self.input
    }

    pub fn layout(&self) -> &SlotLayout {
        &self.layout
    }

    pub fn disciplines(&self) -> &[Discipline] {
        &self.input.disciplines
    }

    /// Flattens an allocation into exportable rows, one per slot.
    pub fn entries(&self, allocation: &Allocation) -> Vec<AllocationEntry> {
        self.layout
            .slots()
            .iter()
            .enumerate()
            .map(|(i, slot)| {
                let d = &self.input.disciplines[slot.discipline];
                AllocationEntry {
                    discipline_id: d.id.clone(),
                    name: d.name.clone(),
                    semester: slot.semester,
                    hours: allocation.value(i),
                    coefficient: d.coefficient,
                    adjustable: d.max_hours > d.min_hours,
                }
            })
            .collect()
    }
}

fn build_layout(input: &ProblemInput) -> SlotLayout {
    let blocks = input.targets.blocks();
    let touched = |semesters: &[u32]| -> Vec<usize> {
        blocks
            .iter()
            .enumerate()
            .filter(|(_, b)| b.touches(semesters))
            .map(|(i, _)| i)
            .collect()
    };

    let mut slots = Vec::new();
    for (index, d) in input.disciplines.iter().enumerate() {
        let excluded = input.exclusions.contains(&d.name);
        let make = |semester: Option<u32>, semesters: Vec<u32>| Slot {
            discipline: index,
            semester,
            blocks: touched(&semesters),
            semesters,
            min: d.min_hours,
            max: d.max_hours,
            coefficient: d.coefficient,
            excluded,
        };
        match input.options.granularity {
            Granularity::PerDiscipline => slots.push(make(None, d.semesters.clone())),
            Granularity::PerSemester => {
                for &s in &d.semesters {
                    slots.push(make(Some(s), vec![s]));
                }
            }
        }
    }

    let max_semester = input
        .disciplines
        .iter()
        .flat_map(|d| d.semesters.iter().copied())
        .max()
        .unwrap_or(0);

    SlotLayout {
        slots,
        blocks,
        max_semester,
        count_excluded_in_targets: input.options.count_excluded_in_targets,
    }
}
