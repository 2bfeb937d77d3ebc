//! Reason sub-buckets for newly created inactivation indicators.

use serde::ser::{Serialize, SerializeMap, Serializer};
use std::collections::BTreeMap;

use crate::types::InactivationReason;

/// Reason counts keyed by hierarchy.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InactivationReasonBreakdown {
    by_hierarchy: BTreeMap<String, [u64; InactivationReason::ALL.len()]>,
}

impl InactivationReasonBreakdown {
    /// Empty breakdown.
    pub fn new() -> Self {
        Self::default()
    }

    /// Count one indicator.
    pub fn record(&mut self, hierarchy_key: &str, reason: InactivationReason) {
        self.by_hierarchy.entry(hierarchy_key.to_string()).or_default()[reason.index()] += 1;
    }

    /// Count for one hierarchy and reason.
    pub fn count(&self, hierarchy_key: &str, reason: InactivationReason) -> u64 {
        self.by_hierarchy
            .get(hierarchy_key)
            .map_or(0, |counts| counts[reason.index()])
    }

    /// Count for a reason across every hierarchy.
    pub fn total(&self, reason: InactivationReason) -> u64 {
        self.by_hierarchy.values().map(|counts| counts[reason.index()]).sum()
    }

    /// Fold another breakdown into this one.
    pub fn merge(&mut self, other: InactivationReasonBreakdown) {
        for (key, theirs) in other.by_hierarchy {
            let mine = self.by_hierarchy.entry(key).or_default();
            for (m, t) in mine.iter_mut().zip(theirs) {
                *m += t;
            }
        }
    }

    /// Hierarchy keys with at least one indicator.
    pub fn hierarchies(&self) -> impl Iterator<Item = &str> {
        self.by_hierarchy.keys().map(String::as_str)
    }

    /// Whether no indicator was counted.
    pub fn is_empty(&self) -> bool {
        self.by_hierarchy.is_empty()
    }
}

/// Serialized as `{hierarchy: {reason: count}}` with every reason present.
impl Serialize for InactivationReasonBreakdown {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.by_hierarchy.len()))?;
        for (key, counts) in &self.by_hierarchy {
            let reasons: BTreeMap<InactivationReason, u64> = InactivationReason::ALL
                .into_iter()
                .map(|reason| (reason, counts[reason.index()]))
                .collect();
            map.serialize_entry(key, &reasons)?;
        }
        map.end()
    }
}
