//! Phase → cell index
//!
//! Provides [`PhaseIndex`], rebuilt for every analysis run. Buckets appear in
//! the order their phase is first seen while visiting cells by ascending
//! position, and each bucket lists its cells in ascending order.

use crate::payload::{CellPosition, CellRecord};
use indexmap::IndexMap;
use std::collections::BTreeMap;

/// Ordered mapping of phase name to the cells classified under it
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PhaseIndex {
    buckets: IndexMap<String, Vec<CellPosition>>,
}

impl PhaseIndex {
    /// Build from a cell mapping
    #[must_use]
    pub fn build(cell_mapping: &BTreeMap<CellPosition, CellRecord>) -> Self {
        let mut buckets: IndexMap<String, Vec<CellPosition>> = IndexMap::new();

        for (&position, record) in cell_mapping {
            for phase in &record.phases {
                let cells = buckets.entry(phase.clone()).or_default();
                // A phase repeated within one record still lists the cell once
                if cells.last() != Some(&position) {
                    cells.push(position);
                }
            }
        }

        Self { buckets }
    }

    /// Cells classified under `phase`
    #[must_use]
    pub fn cells(&self, phase: &str) -> &[CellPosition] {
        self.buckets.get(phase).map(Vec::as_slice).unwrap_or_default()
    }

    /// Whether `phase` has a bucket
    #[inline]
    #[must_use]
    pub fn contains(&self, phase: &str) -> bool {
        self.buckets.contains_key(phase)
    }

    /// Phase names in bucket order
    pub fn phases(&self) -> impl Iterator<Item = &str> {
        self.buckets.keys().map(String::as_str)
    }

    /// Buckets in order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[CellPosition])> {
        self.buckets
            .iter()
            .map(|(phase, cells)| (phase.as_str(), cells.as_slice()))
    }

    /// Number of phases
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.buckets.len()
    }

    /// Whether no phase was detected
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }
}
