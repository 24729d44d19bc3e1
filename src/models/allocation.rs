//! Slots, allocations and ranked variants.
//!
//! The solver never works on disciplines directly. A compiled problem
//! expands its disciplines into *slots* (one per discipline, or one per
//! discipline-semester instance) and every allocation is a dense vector of
//! hours aligned with that slot layout.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use super::Block;

/// How disciplines are expanded into allocatable slots.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Granularity {
    /// One value per discipline, shared by every semester it spans.
    #[default]
    PerDiscipline,
    /// One independent value per (discipline, semester) instance.
    PerSemester,
}

/// Model-level switches that change constraint semantics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelOptions {
    /// Slot expansion mode.
    pub granularity: Granularity,
    /// Whether excluded disciplines count toward block sums (at their
    /// minimum). When `false` block sums only cover adjustable disciplines.
    pub count_excluded_in_targets: bool,
}

impl ModelOptions {
    pub fn with_granularity(mut self, granularity: Granularity) -> Self {
        self.granularity = granularity;
        self
    }

    pub fn with_excluded_in_targets(mut self, count: bool) -> Self {
        self.count_excluded_in_targets = count;
        self
    }
}

/// Discipline names that are pinned at their minimum hours.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExclusionSet {
    names: HashSet<String>,
}

impl ExclusionSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a discipline name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.names.insert(name.into());
        self
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.contains(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

impl<S: Into<String>> FromIterator<S> for ExclusionSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self {
            names: iter.into_iter().map(Into::into).collect(),
        }
    }
}

/// One allocatable value position.
#[derive(Debug, Clone, PartialEq)]
pub struct Slot {
    /// Index of the owning discipline in the problem input.
    pub discipline: usize,
    /// Semester instance, or `None` when the slot covers the whole discipline.
    pub semester: Option<u32>,
    /// Semesters this slot is active in.
    pub semesters: Vec<u32>,
    pub min: f64,
    pub max: f64,
    pub coefficient: f64,
    /// Pinned at `min` by the exclusion set.
    pub excluded: bool,
    /// Indices (into the layout's blocks) of the blocks this slot touches.
    pub blocks: Vec<usize>,
}

impl Slot {
    /// Share of the slot's value attributed to each of its semesters.
    pub fn load_share(&self) -> f64 {
        1.0 / self.semesters.len() as f64
    }

    /// Whether at least one block constrains this slot.
    pub fn is_constrained(&self) -> bool {
        !self.blocks.is_empty()
    }

    /// Whether search may move this slot: constrained by a block, not
    /// excluded, and with room between its bounds.
    pub fn is_movable(&self) -> bool {
        self.is_constrained() && !self.excluded && self.min < self.max
    }

    pub fn is_active_in(&self, semester: u32) -> bool {
        self.semesters.contains(&semester)
    }
}

/// Immutable solver context: slots, blocks and the options that shape them.
#[derive(Debug, Clone, PartialEq)]
pub struct SlotLayout {
    pub(crate) slots: Vec<Slot>,
    pub(crate) blocks: Vec<Block>,
    pub(crate) max_semester: u32,
    pub(crate) count_excluded_in_targets: bool,
}

impl SlotLayout {
    pub fn slots(&self) -> &[Slot] {
        &self.slots
    }

    pub fn slot(&self, index: usize) -> &Slot {
        &self.slots[index]
    }

    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Highest semester present in the domain.
    pub fn max_semester(&self) -> u32 {
        self.max_semester
    }

    pub fn count_excluded_in_targets(&self) -> bool {
        self.count_excluded_in_targets
    }

    /// Whether the slot's value enters block sums.
    pub fn counts_toward_targets(&self, index: usize) -> bool {
        let slot = &self.slots[index];
        slot.is_constrained() && (!slot.excluded || self.count_excluded_in_targets)
    }

    /// Non-excluded slots touched by the block at `block_index`, in layout order.
    pub fn block_members(&self, block_index: usize) -> Vec<usize> {
        self.slots
            .iter()
            .enumerate()
            .filter(|(_, s)| !s.excluded && s.blocks.contains(&block_index))
            .map(|(i, _)| i)
            .collect()
    }

    /// Hours the excluded slots contribute to the block at `block_index`.
    /// Zero unless excluded slots count toward targets.
    pub fn excluded_contribution(&self, block_index: usize) -> f64 {
        if !self.count_excluded_in_targets {
            return 0.0;
        }
        self.slots
            .iter()
            .filter(|s| s.excluded && s.blocks.contains(&block_index))
            .map(|s| s.min)
            .sum()
    }

    /// Slots search is allowed to move. Unconstrained slots already sit at
    /// their best value in [`Self::base_allocation`] and are left out.
    pub fn movable_slots(&self) -> Vec<usize> {
        (0..self.slots.len())
            .filter(|&i| self.slots[i].is_movable())
            .collect()
    }

    /// Every slot at its minimum.
    pub fn minimum_allocation(&self) -> Allocation {
        Allocation::new(self.slots.iter().map(|s| s.min).collect())
    }

    /// Starting point shared by both strategies: excluded and constrained
    /// slots at their minimum, unconstrained slots at their maximum.
    ///
    /// Unconstrained slots appear in no block sum and the objective never
    /// decreases in any value, so their maximum is always the best choice.
    pub fn base_allocation(&self) -> Allocation {
        Allocation::new(
            self.slots
                .iter()
                .map(|s| {
                    if s.excluded || s.is_constrained() {
                        s.min
                    } else {
                        s.max
                    }
                })
                .collect(),
        )
    }
}

/// Hours assigned to every slot of a layout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Allocation {
    values: Vec<f64>,
}

impl Allocation {
    pub fn new(values: Vec<f64>) -> Self {
        Self { values }
    }

    pub fn value(&self, slot: usize) -> f64 {
        self.values[slot]
    }

    pub fn set(&mut self, slot: usize, hours: f64) {
        self.values[slot] = hours;
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn values_mut(&mut self) -> &mut [f64] {
        &mut self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Sum of all slot values.
    pub fn total(&self) -> f64 {
        self.values.iter().sum()
    }
}

/// A complete allocation and its objective value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Variant {
    pub allocation: Allocation,
    pub objective: f64,
}

impl Variant {
    pub fn new(allocation: Allocation, objective: f64) -> Self {
        Self {
            allocation,
            objective,
        }
    }
}
