//! Structural sanity checks over hierarchy attribution.
//!
//! ## Checked Invariants
//!
//! | Check | Raised as |
//! |-------|-----------|
//! | Known depth > 1 with no depth-1 ancestor | `NoTopLevelAncestor` |
//! | Intermediate primitive that is sufficiently defined | `FullyDefinedIntermediatePrimitive` |
//! | Inactive concept that is sufficiently defined | `InactiveFullyDefined` |
//! | Intermediate primitive without SD ancestor | `MissingSdAncestor` |
//! | Intermediate primitive without SD descendant | `MissingSdDescendant` |
//!
//! Every violation is fatal: counts computed over an inconsistent graph
//! would be meaningless, so the pass is aborted rather than skipping a concept.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::hierarchy::{HierarchyAttributor, IpStatus};
use crate::snapshot::{HistoricDatum, SnapshotIndex};
use crate::store::TerminologyGraph;
use crate::types::{CharacteristicView, Concept, DefinitionStatus, SctId};

/// Fatal structural violation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IntegrityError {
    /// Concept has a known depth but no ancestor at depth one.
    #[error("concept {concept_id} at depth {depth} has no top-level ancestor")]
    NoTopLevelAncestor {
        /// Offending concept.
        concept_id: SctId,
        /// Depth reported by the oracle.
        depth: u32,
    },
    /// Concept is both intermediate primitive and sufficiently defined.
    #[error("concept {concept_id} is an intermediate primitive but sufficiently defined ({view})")]
    FullyDefinedIntermediatePrimitive {
        /// Offending concept.
        concept_id: SctId,
        /// View the flag was computed in.
        view: CharacteristicView,
    },
    /// Concept is inactive but sufficiently defined.
    #[error("concept {concept_id} is inactive but sufficiently defined")]
    InactiveFullyDefined {
        /// Offending concept.
        concept_id: SctId,
    },
    /// Intermediate primitive lacking a sufficiently defined ancestor.
    #[error("intermediate primitive {concept_id} has no sufficiently defined ancestor ({view})")]
    MissingSdAncestor {
        /// Offending concept.
        concept_id: SctId,
        /// View the flag was computed in.
        view: CharacteristicView,
    },
    /// Intermediate primitive lacking a sufficiently defined descendant.
    #[error("intermediate primitive {concept_id} has no sufficiently defined descendant ({view})")]
    MissingSdDescendant {
        /// Offending concept.
        concept_id: SctId,
        /// View the flag was computed in.
        view: CharacteristicView,
    },
}

impl IntegrityError {
    /// Concept the violation was raised for.
    pub fn concept_id(&self) -> SctId {
        match self {
            Self::NoTopLevelAncestor { concept_id, .. }
            | Self::FullyDefinedIntermediatePrimitive { concept_id, .. }
            | Self::InactiveFullyDefined { concept_id }
            | Self::MissingSdAncestor { concept_id, .. }
            | Self::MissingSdDescendant { concept_id, .. } => *concept_id,
        }
    }

    /// Short machine-readable check name.
    pub fn check(&self) -> &'static str {
        match self {
            Self::NoTopLevelAncestor { .. } => "no_top_level_ancestor",
            Self::FullyDefinedIntermediatePrimitive { .. } => "sd_intermediate_primitive",
            Self::InactiveFullyDefined { .. } => "inactive_sd",
            Self::MissingSdAncestor { .. } => "ip_missing_sd_ancestor",
            Self::MissingSdDescendant { .. } => "ip_missing_sd_descendant",
        }
    }

    /// Log this violation as a structured event.
    pub fn log(&self) {
        tracing::error!(
            concept_id = %self.concept_id(),
            check = self.check(),
            "INTEGRITY_VIOLATION: {}",
            self
        );
    }
}

/// Check an attribution computed for a concept in one view.
pub fn check_attribution(
    concept_id: SctId,
    active: bool,
    definition_status: DefinitionStatus,
    view: CharacteristicView,
    status: IpStatus,
) -> Result<(), IntegrityError> {
    if !active && definition_status.is_fully_defined() {
        return Err(IntegrityError::InactiveFullyDefined { concept_id });
    }
    if status.is_intermediate_primitive {
        if definition_status.is_fully_defined() {
            return Err(IntegrityError::FullyDefinedIntermediatePrimitive { concept_id, view });
        }
        if !status.has_sd_ancestor {
            return Err(IntegrityError::MissingSdAncestor { concept_id, view });
        }
        if !status.has_sd_descendant {
            return Err(IntegrityError::MissingSdDescendant { concept_id, view });
        }
    }
    Ok(())
}

/// Check the flags frozen in a snapshot record.
pub fn check_datum(datum: &HistoricDatum) -> Result<(), IntegrityError> {
    let status = IpStatus {
        has_sd_ancestor: datum.has_sd_ancestor,
        has_sd_descendant: datum.has_sd_descendant,
        is_intermediate_primitive: datum.is_intermediate_primitive,
    };
    check_attribution(
        datum.concept_id,
        datum.active,
        datum.definition_status,
        CharacteristicView::Inferred,
        status,
    )
}

/// Summary of a completed integrity census.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntegrityCensus {
    /// Concepts examined.
    pub concepts_checked: usize,
    /// Intermediate primitives found, per view.
    pub intermediate_primitives: BTreeMap<CharacteristicView, usize>,
    /// Active sufficiently defined concepts.
    pub fully_defined: usize,
}

impl IntegrityCensus {
    /// Intermediate primitive count in a view.
    pub fn ip_count(&self, view: CharacteristicView) -> usize {
        self.intermediate_primitives.get(&view).copied().unwrap_or(0)
    }
}

fn observe(
    census: &mut IntegrityCensus,
    concept: &Concept,
    statuses: &[(CharacteristicView, IpStatus)],
) {
    census.concepts_checked += 1;
    if concept.active && concept.is_fully_defined() {
        census.fully_defined += 1;
    }
    for (view, status) in statuses {
        if status.is_intermediate_primitive {
            *census.intermediate_primitives.entry(*view).or_default() += 1;
        }
    }
}

/// Run every end-of-pass check over the current graph.
///
/// The first violation is logged and returned.
pub fn census<G: TerminologyGraph + ?Sized>(
    attributor: &HierarchyAttributor<'_, G>,
) -> Result<IntegrityCensus, IntegrityError> {
    let mut census = IntegrityCensus::default();

    for concept in attributor.graph().all_concepts() {
        let statuses: Vec<(CharacteristicView, IpStatus)> = CharacteristicView::ALL
            .into_iter()
            .map(|view| (view, attributor.ip_status(concept, view)))
            .collect();

        for (view, status) in &statuses {
            check_attribution(concept.id, concept.active, concept.definition_status, *view, *status)
                .map_err(|e| {
                    e.log();
                    e
                })?;
        }
        attributor.hierarchy_of(concept).map_err(|e| {
            e.log();
            e
        })?;

        observe(&mut census, concept, &statuses);
    }

    tracing::info!(
        concepts = census.concepts_checked,
        inferred_ip = census.ip_count(CharacteristicView::Inferred),
        stated_ip = census.ip_count(CharacteristicView::Stated),
        "integrity census passed"
    );
    Ok(census)
}

/// Check every record of a loaded snapshot.
pub fn verify_index(index: &SnapshotIndex) -> Result<(), IntegrityError> {
    for datum in index.iter() {
        check_datum(datum).map_err(|e| {
            e.log();
            e
        })?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::InMemoryTerminologyGraph;
    use crate::types::{Component, ComponentId, ROOT_CONCEPT};

    const MODULE: SctId = SctId::new(900000000000207008);

    fn concept(id: u64, parent: Option<u64>, status: DefinitionStatus) -> Concept {
        let c = Concept::new(SctId::new(id), format!("Concept {id}"), MODULE)
            .with_definition_status(status);
        match parent {
            Some(p) => c.with_component(Component::is_a(
                ComponentId::new(format!("r{id}")).unwrap(),
                SctId::new(id),
                MODULE,
                SctId::new(p),
                CharacteristicView::Inferred,
            )),
            None => c,
        }
    }

    #[test]
    fn test_check_attribution_flags_each_violation() {
        let id = SctId::new(1);
        let view = CharacteristicView::Inferred;
        let ip = IpStatus {
            has_sd_ancestor: true,
            has_sd_descendant: true,
            is_intermediate_primitive: true,
        };

        assert!(check_attribution(id, true, DefinitionStatus::Primitive, view, ip).is_ok());
        assert_eq!(
            check_attribution(id, true, DefinitionStatus::FullyDefined, view, ip),
            Err(IntegrityError::FullyDefinedIntermediatePrimitive { concept_id: id, view })
        );
        assert_eq!(
            check_attribution(id, false, DefinitionStatus::FullyDefined, view, IpStatus::default()),
            Err(IntegrityError::InactiveFullyDefined { concept_id: id })
        );
        let no_ancestor = IpStatus {
            has_sd_ancestor: false,
            ..ip
        };
        assert_eq!(
            check_attribution(id, true, DefinitionStatus::Primitive, view, no_ancestor),
            Err(IntegrityError::MissingSdAncestor { concept_id: id, view })
        );
        let no_descendant = IpStatus {
            has_sd_descendant: false,
            ..ip
        };
        assert_eq!(
            check_attribution(id, true, DefinitionStatus::Primitive, view, no_descendant),
            Err(IntegrityError::MissingSdDescendant { concept_id: id, view })
        );
    }

    #[test]
    fn test_census_counts_ip() {
        use DefinitionStatus::*;
        let root = ROOT_CONCEPT.value();
        let graph: InMemoryTerminologyGraph = [
            concept(root, None, Primitive),
            concept(10, Some(root), Primitive),
            concept(11, Some(10), FullyDefined),
            concept(12, Some(11), Primitive),
            concept(13, Some(12), FullyDefined),
        ]
        .into_iter()
        .collect();

        let attributor = HierarchyAttributor::new(&graph);
        let census = census(&attributor).unwrap();
        assert_eq!(census.concepts_checked, 5);
        assert_eq!(census.fully_defined, 2);
        assert_eq!(census.ip_count(CharacteristicView::Inferred), 1);
        // Only inferred IS-A relationships were modelled.
        assert_eq!(census.ip_count(CharacteristicView::Stated), 0);
    }

    #[test]
    fn test_census_rejects_inactive_sd() {
        let root = ROOT_CONCEPT.value();
        let graph: InMemoryTerminologyGraph = [
            concept(root, None, DefinitionStatus::Primitive),
            concept(20, None, DefinitionStatus::FullyDefined).with_active(false),
        ]
        .into_iter()
        .collect();

        let attributor = HierarchyAttributor::new(&graph);
        assert_eq!(
            census(&attributor),
            Err(IntegrityError::InactiveFullyDefined { concept_id: SctId::new(20) })
        );
    }

    #[test]
    fn test_check_datum() {
        let mut datum = HistoricDatum::new(SctId::new(5), "x", MODULE);
        datum.is_intermediate_primitive = true;
        datum.has_sd_ancestor = true;
        assert_eq!(
            check_datum(&datum),
            Err(IntegrityError::MissingSdDescendant {
                concept_id: SctId::new(5),
                view: CharacteristicView::Inferred
            })
        );
        datum.has_sd_descendant = true;
        assert!(check_datum(&datum).is_ok());
    }
}
