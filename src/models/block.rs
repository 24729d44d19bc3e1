//! Semester blocks and their target sums.
//!
//! A block pairs two consecutive semesters `(s, s + 1)` and prescribes the
//! combined hours of every discipline active in either of them.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};

/// Highest semester number a problem may reference.
pub const MAX_SEMESTER: u32 = 1024;

/// A pair of consecutive semesters with a prescribed hour total.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Block {
    /// First semester of the pair.
    pub start: u32,
    /// Prescribed hour total.
    pub target: f64,
}

impl Block {
    /// Creates a block starting at `start`.
    pub fn new(start: u32, target: f64) -> Self {
        Self { start, target }
    }

    /// Second semester of the pair, `None` past `u32::MAX`.
    pub fn end(&self) -> Option<u32> {
        self.start.checked_add(1)
    }

    /// The semesters covered.
    pub fn semesters(&self) -> Vec<u32> {
        std::iter::once(self.start).chain(self.end()).collect()
    }

    /// Whether `semester` belongs to this block.
    pub fn contains(&self, semester: u32) -> bool {
        semester == self.start || self.end() == Some(semester)
    }

    /// Whether any of `semesters` belongs to this block.
    pub fn touches(&self, semesters: &[u32]) -> bool {
        semesters.iter().any(|&s| self.contains(s))
    }
}

/// Ordered mapping from block start semester to target hours.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BlockTargets {
    targets: BTreeMap<u32, f64>,
}

impl BlockTargets {
    /// Creates an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// The four-block, eight-semester table used by the curriculum office.
    pub fn standard_curriculum() -> Self {
        Self::new()
            .with_target(1, 60.5)
            .with_target(3, 59.5)
            .with_target(5, 60.0)
            .with_target(7, 60.0)
    }

    /// Sets the target of the block starting at `start`.
    pub fn with_target(mut self, start: u32, target: f64) -> Self {
        self.targets.insert(start, target);
        self
    }

    /// Blocks in ascending start order.
    pub fn blocks(&self) -> Vec<Block> {
        self.targets
            .iter()
            .map(|(&start, &target)| Block::new(start, target))
            .collect()
    }

    /// Target for the block starting at `start`.
    pub fn target(&self, start: u32) -> Option<f64> {
        self.targets.get(&start).copied()
    }

    /// Sum of all targets.
    pub fn total(&self) -> f64 {
        self.targets.values().sum()
    }

    pub fn len(&self) -> usize {
        self.targets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }

    /// Semesters covered by any block.
    pub fn covered_semesters(&self) -> HashSet<u32> {
        self.blocks().iter().flat_map(Block::semesters).collect()
    }
}

impl FromIterator<(u32, f64)> for BlockTargets {
    fn from_iter<I: IntoIterator<Item = (u32, f64)>>(iter: I) -> Self {
        Self {
            targets: iter.into_iter().collect(),
        }
    }
}
