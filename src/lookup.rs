//! Hierarchy lookup chain across the current graph and historic snapshots.
//!
//! ## Precedence
//!
//! 1. The attributor on the current graph, when it yields a known bucket
//! 2. The previous snapshot's recorded hierarchy
//! 3. The secondary snapshot's recorded hierarchy
//! 4. `Unknown`
//!
//! A concept missing from all three sources is a [`LookupError`]. It is
//! logged and the concept is counted under `Unknown`; the pass continues.

use serde::{Deserialize, Serialize};

use crate::hierarchy::{HierarchyAttributor, HierarchyBucket};
use crate::integrity::IntegrityError;
use crate::snapshot::SnapshotIndex;
use crate::store::TerminologyGraph;
use crate::types::{Concept, SctId};

/// Recoverable failure to resolve a referenced concept.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
pub enum LookupError {
    /// Absent from the current graph and every snapshot index.
    #[error("concept {concept_id} is absent from the current graph and every snapshot index")]
    MissingConcept {
        /// Concept that could not be found.
        concept_id: SctId,
    },
}

impl LookupError {
    /// Concept the lookup failed for.
    pub fn concept_id(&self) -> SctId {
        match self {
            Self::MissingConcept { concept_id } => *concept_id,
        }
    }

    /// Emit as a structured warning.
    pub fn log(&self) {
        match self {
            Self::MissingConcept { concept_id } => {
                tracing::warn!(
                    concept_id = %concept_id,
                    "LOOKUP_ERROR: concept treated as UNKNOWN hierarchy"
                );
            }
        }
    }
}

/// Which source supplied a bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LookupSource {
    /// Attributed from the live graph.
    Current,
    /// Taken from the previous snapshot.
    Previous,
    /// Taken from the secondary snapshot.
    Secondary,
    /// No source knew the concept's hierarchy.
    Unresolved,
}

/// Result of walking the chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    /// Bucket to count the concept under.
    pub bucket: HierarchyBucket,
    /// Where the bucket came from.
    pub source: LookupSource,
    /// Set when the concept could not be found anywhere.
    pub error: Option<LookupError>,
}

/// Explicit three-source hierarchy lookup.
pub struct HierarchyLookup<'a, G: TerminologyGraph + ?Sized> {
    attributor: &'a HierarchyAttributor<'a, G>,
    previous: &'a SnapshotIndex,
    secondary: Option<&'a SnapshotIndex>,
}

impl<'a, G: TerminologyGraph + ?Sized> HierarchyLookup<'a, G> {
    /// Chain over the current graph and the previous snapshot.
    pub fn new(attributor: &'a HierarchyAttributor<'a, G>, previous: &'a SnapshotIndex) -> Self {
        Self {
            attributor,
            previous,
            secondary: None,
        }
    }

    /// Add a secondary snapshot consulted after the previous one.
    pub fn with_secondary(mut self, secondary: &'a SnapshotIndex) -> Self {
        self.secondary = Some(secondary);
        self
    }

    /// Resolve a concept of the current graph.
    ///
    /// Structural failures of the attributor abort; a concept that is only
    /// unresolvable stays `Unknown` without error.
    pub fn resolve(&self, concept: &Concept) -> Result<Resolution, IntegrityError> {
        let bucket = self.attributor.hierarchy_of(concept)?;
        if bucket.is_known() {
            return Ok(Resolution {
                bucket,
                source: LookupSource::Current,
                error: None,
            });
        }
        Ok(self.from_snapshots(concept.id).unwrap_or(Resolution {
            bucket: HierarchyBucket::Unknown,
            source: LookupSource::Unresolved,
            error: None,
        }))
    }

    /// Resolve any referenced concept id, which may be missing from the
    /// current graph.
    pub fn resolve_id(&self, concept_id: SctId) -> Result<Resolution, IntegrityError> {
        if let Some(concept) = self.attributor.graph().concept(concept_id) {
            return self.resolve(concept);
        }
        if let Some(found) = self.from_snapshots(concept_id) {
            return Ok(found);
        }
        let error = LookupError::MissingConcept { concept_id };
        error.log();
        Ok(Resolution {
            bucket: HierarchyBucket::Unknown,
            source: LookupSource::Unresolved,
            error: Some(error),
        })
    }

    fn from_snapshots(&self, concept_id: SctId) -> Option<Resolution> {
        let sources = [
            (Some(self.previous), LookupSource::Previous),
            (self.secondary, LookupSource::Secondary),
        ];

        let mut known_anywhere = false;
        for (index, source) in sources {
            let Some(datum) = index.and_then(|i| i.get(concept_id)) else {
                continue;
            };
            known_anywhere = true;
            if datum.hierarchy.is_known() {
                return Some(Resolution {
                    bucket: datum.hierarchy,
                    source,
                    error: None,
                });
            }
        }

        known_anywhere.then_some(Resolution {
            bucket: HierarchyBucket::Unknown,
            source: LookupSource::Unresolved,
            error: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snapshot::HistoricDatum;
    use crate::store::InMemoryTerminologyGraph;
    use crate::types::{CharacteristicView, Component, ComponentId, ROOT_CONCEPT};

    const MODULE: SctId = SctId::new(900000000000207008);
    const FINDING: SctId = SctId::new(404684003);
    const PROCEDURE: SctId = SctId::new(71388002);

    fn graph() -> InMemoryTerminologyGraph {
        let root = Concept::new(ROOT_CONCEPT, "root", MODULE);
        let is_a = Component::is_a(
            ComponentId::new("r1").unwrap(),
            FINDING,
            MODULE,
            ROOT_CONCEPT,
            CharacteristicView::Inferred,
        );
        let finding =
            Concept::new(FINDING, "Clinical finding (finding)", MODULE).with_component(is_a);
        let retired =
            Concept::new(SctId::new(5001), "Retired (finding)", MODULE).with_active(false);
        [root, finding, retired].into_iter().collect()
    }

    fn datum(id: u64, hierarchy: HierarchyBucket) -> HistoricDatum {
        let mut d = HistoricDatum::new(SctId::new(id), "x", MODULE);
        d.hierarchy = hierarchy;
        d
    }

    #[test]
    fn test_current_graph_wins() {
        let graph = graph();
        let attributor = HierarchyAttributor::new(&graph);
        let previous: SnapshotIndex = [datum(FINDING.value(), HierarchyBucket::Known(PROCEDURE))]
            .into_iter()
            .collect();
        let lookup = HierarchyLookup::new(&attributor, &previous);

        let resolution = lookup.resolve(graph.concept(FINDING).unwrap()).unwrap();
        assert_eq!(resolution.bucket, HierarchyBucket::Known(FINDING));
        assert_eq!(resolution.source, LookupSource::Current);
    }

    #[test]
    fn test_inactive_concept_falls_back_to_previous_then_secondary() {
        let graph = graph();
        let attributor = HierarchyAttributor::new(&graph);
        let retired = graph.concept(SctId::new(5001)).unwrap();

        let previous: SnapshotIndex = [datum(5001, HierarchyBucket::Unknown)].into_iter().collect();
        let secondary: SnapshotIndex =
            [datum(5001, HierarchyBucket::Known(FINDING))].into_iter().collect();

        let lookup = HierarchyLookup::new(&attributor, &previous);
        let only_previous = lookup.resolve(retired).unwrap();
        assert_eq!(only_previous.bucket, HierarchyBucket::Unknown);
        assert!(only_previous.error.is_none());

        let lookup = lookup.with_secondary(&secondary);
        let resolution = lookup.resolve(retired).unwrap();
        assert_eq!(resolution.bucket, HierarchyBucket::Known(FINDING));
        assert_eq!(resolution.source, LookupSource::Secondary);
    }

    #[test]
    fn test_missing_everywhere_is_recoverable() {
        let graph = graph();
        let attributor = HierarchyAttributor::new(&graph);
        let previous = SnapshotIndex::new();
        let lookup = HierarchyLookup::new(&attributor, &previous);

        let resolution = lookup.resolve_id(SctId::new(777)).unwrap();
        assert_eq!(resolution.bucket, HierarchyBucket::Unknown);
        assert_eq!(
            resolution.error,
            Some(LookupError::MissingConcept {
                concept_id: SctId::new(777)
            })
        );
    }

    #[test]
    fn test_resolve_id_uses_snapshot_for_deleted_concept() {
        let graph = graph();
        let attributor = HierarchyAttributor::new(&graph);
        let previous: SnapshotIndex =
            [datum(888, HierarchyBucket::Known(PROCEDURE))].into_iter().collect();
        let lookup = HierarchyLookup::new(&attributor, &previous);

        let resolution = lookup.resolve_id(SctId::new(888)).unwrap();
        assert_eq!(resolution.bucket, HierarchyBucket::Known(PROCEDURE));
        assert_eq!(resolution.source, LookupSource::Previous);
    }
}
