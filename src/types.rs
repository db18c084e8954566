//! Shared traits at the boundaries of the selection core.
//!
//! The core never owns its reference data. It reads item definitions through
//! [`ItemLookup`] and candidate boxes through [`BoxProvider`], so tests and
//! alternative data sources can plug in without touching the algorithm.

use crate::model::{CandidateBox, ItemDefinition};

/// Objects with a vertical extent in m.
pub trait HasHeight {
    fn height(&self) -> f64;
}

/// Read-only access to item definitions.
pub trait ItemLookup {
    /// Returns the definition registered under a normalized key.
    fn lookup(&self, key: &str) -> Option<&ItemDefinition>;

    /// All definitions in the catalog's own order.
    fn definitions(&self) -> &[ItemDefinition];
}

/// Read-only access to the available candidate boxes.
///
/// Implementations hand out only boxes that already passed validation and
/// availability filtering.
pub trait BoxProvider {
    fn candidates(&self) -> &[CandidateBox];
}

impl BoxProvider for [CandidateBox] {
    fn candidates(&self) -> &[CandidateBox] {
        self
    }
}

impl BoxProvider for Vec<CandidateBox> {
    fn candidates(&self) -> &[CandidateBox] {
        self.as_slice()
    }
}
