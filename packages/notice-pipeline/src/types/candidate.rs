//! Candidate: one discovered unit of potential work.

use serde::{Deserialize, Serialize};

/// A discovered item (a listing link or a spreadsheet slot).
///
/// Built by an enumerator while walking a source and never mutated afterwards.
/// Only `identifier` is ever persisted, inside the Dedup Store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Candidate {
    /// Globally unique within a source; the dedup key.
    ///
    /// An absolute detail URL for web sources, or the status-cell coordinate
    /// (`Sheet!C12`) for spreadsheet sources.
    pub identifier: String,

    /// Display label, used as the notification subject
    pub title: String,

    /// Grouping attribute (subject/category) used by the single-group selector
    pub group_key: Option<String>,

    /// Secondary bucket inside a group (e.g. a publisher column)
    pub slot: Option<String>,

    /// Raw recency marker as found on the listing
    pub recency_marker: Option<String>,

    /// Opaque handle the source adapter uses to fetch full content
    pub detail_locator: String,
}

impl Candidate {
    /// Create a candidate whose identifier doubles as its detail locator.
    pub fn new(identifier: impl Into<String>, title: impl Into<String>) -> Self {
        let identifier = identifier.into();
        Self {
            detail_locator: identifier.clone(),
            identifier,
            title: title.into(),
            group_key: None,
            slot: None,
            recency_marker: None,
        }
    }

    /// Set the detail locator.
    pub fn with_detail_locator(mut self, locator: impl Into<String>) -> Self {
        self.detail_locator = locator.into();
        self
    }

    /// Set the group key.
    pub fn with_group(mut self, group_key: impl Into<String>) -> Self {
        self.group_key = Some(group_key.into());
        self
    }

    /// Set the slot inside the group.
    pub fn with_slot(mut self, slot: impl Into<String>) -> Self {
        self.slot = Some(slot.into());
        self
    }

    /// Set the recency marker.
    pub fn with_recency_marker(mut self, marker: impl Into<String>) -> Self {
        self.recency_marker = Some(marker.into());
        self
    }

    /// True when both candidates belong to the same group and slot.
    pub fn same_bucket(&self, other: &Candidate) -> bool {
        self.group_key == other.group_key && self.slot == other.slot
    }
}

/// A candidate paired with its dedup status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tracked {
    pub candidate: Candidate,

    /// False when the Dedup Store already knows the identifier
    pub pending: bool,
}

impl Tracked {
    pub fn pending(candidate: Candidate) -> Self {
        Self {
            candidate,
            pending: true,
        }
    }

    pub fn processed(candidate: Candidate) -> Self {
        Self {
            candidate,
            pending: false,
        }
    }
}
