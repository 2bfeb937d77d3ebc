//! Inactivation reasons carried by inactivation indicator members.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::id::SctId;

/// Reason sub-bucket for a newly created inactivation indicator.
///
/// Keyed on the indicator's value id; anything unrecognised is `Other`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InactivationReason {
    /// `900000000000484002 |Ambiguous|`
    Ambiguous,
    /// `900000000000487009 |Moved elsewhere|`
    MovedElsewhere,
    /// `900000000000495008 |Concept non-current|`
    ConceptNonCurrent,
    /// `900000000000482003 |Duplicate|`
    Duplicate,
    /// `900000000000485001 |Erroneous|`
    Erroneous,
    /// `900000000000494007 |Inappropriate|`
    Inappropriate,
    /// `900000000000486000 |Limited|`
    Limited,
    /// `900000000000483008 |Outdated|`
    Outdated,
    /// `900000000000492006 |Pending move|`
    PendingMove,
    /// `723277005 |Nonconformance to editorial policy|`
    NonConformance,
    /// `1186917008 |Not semantically equivalent component|`
    NotSemanticallyEquivalent,
    /// Missing or unrecognised value.
    Other,
}

impl InactivationReason {
    /// All reasons in report order.
    pub const ALL: [InactivationReason; 12] = [
        Self::Ambiguous,
        Self::MovedElsewhere,
        Self::ConceptNonCurrent,
        Self::Duplicate,
        Self::Erroneous,
        Self::Inappropriate,
        Self::Limited,
        Self::Outdated,
        Self::PendingMove,
        Self::NonConformance,
        Self::NotSemanticallyEquivalent,
        Self::Other,
    ];

    /// Map an indicator value id to its reason.
    pub fn from_value(value: Option<SctId>) -> Self {
        match value.map(|v| v.value()) {
            Some(900000000000484002) => Self::Ambiguous,
            Some(900000000000487009) => Self::MovedElsewhere,
            Some(900000000000495008) => Self::ConceptNonCurrent,
            Some(900000000000482003) => Self::Duplicate,
            Some(900000000000485001) => Self::Erroneous,
            Some(900000000000494007) => Self::Inappropriate,
            Some(900000000000486000) => Self::Limited,
            Some(900000000000483008) => Self::Outdated,
            Some(900000000000492006) => Self::PendingMove,
            Some(723277005) => Self::NonConformance,
            Some(1186917008) => Self::NotSemanticallyEquivalent,
            _ => Self::Other,
        }
    }

    /// Slot index in a reason breakdown.
    pub fn index(&self) -> usize {
        *self as usize
    }
}

impl fmt::Display for InactivationReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Ambiguous => "ambiguous",
            Self::MovedElsewhere => "moved_elsewhere",
            Self::ConceptNonCurrent => "concept_non_current",
            Self::Duplicate => "duplicate",
            Self::Erroneous => "erroneous",
            Self::Inappropriate => "inappropriate",
            Self::Limited => "limited",
            Self::Outdated => "outdated",
            Self::PendingMove => "pending_move",
            Self::NonConformance => "non_conformance",
            Self::NotSemanticallyEquivalent => "not_semantically_equivalent",
            Self::Other => "other",
        };
        f.write_str(label)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_values() {
        assert_eq!(
            InactivationReason::from_value(Some(SctId::new(900000000000482003))),
            InactivationReason::Duplicate
        );
        assert_eq!(
            InactivationReason::from_value(Some(SctId::new(723277005))),
            InactivationReason::NonConformance
        );
    }

    #[test]
    fn test_unknown_values_fall_into_other() {
        assert_eq!(InactivationReason::from_value(None), InactivationReason::Other);
        assert_eq!(
            InactivationReason::from_value(Some(SctId::new(42))),
            InactivationReason::Other
        );
    }

    #[test]
    fn test_indices_are_dense() {
        for (i, reason) in InactivationReason::ALL.iter().enumerate() {
            assert_eq!(reason.index(), i);
        }
    }
}
