//! Top-level hierarchy attribution and intermediate primitive detection.
//!
//! ## Algorithm
//!
//! 1. The root is its own bucket
//! 2. Inactive concepts and concepts with unknown depth are `Unknown`
//!    (the previous snapshot may still know where they lived)
//! 3. Depth 1 concepts are their own bucket
//! 4. Otherwise the inferred ancestor at depth 1 is the bucket
//!
//! Results are memoized for the lifetime of the attributor. The memo sits
//! behind a `parking_lot::RwLock` so one attributor can serve every worker
//! of a parallel pass.

use std::collections::HashMap;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use crate::integrity::IntegrityError;
use crate::store::TerminologyGraph;
use crate::types::{CharacteristicView, Concept, SctId};

/// Top-level hierarchy a concept is attributed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum HierarchyBucket {
    /// A depth-1 concept (or the root itself).
    Known(SctId),
    /// Could not be resolved.
    Unknown,
}

impl HierarchyBucket {
    /// Sentinel id used for `Unknown` in snapshot files.
    pub const UNKNOWN_ID: SctId = SctId::new(0);

    /// Id written to snapshot files.
    pub fn id(&self) -> SctId {
        match self {
            Self::Known(id) => *id,
            Self::Unknown => Self::UNKNOWN_ID,
        }
    }

    /// Inverse of [`Self::id`].
    pub fn from_id(id: SctId) -> Self {
        if id == Self::UNKNOWN_ID {
            Self::Unknown
        } else {
            Self::Known(id)
        }
    }

    /// Whether the bucket is resolved.
    pub fn is_known(&self) -> bool {
        matches!(self, Self::Known(_))
    }

    /// Row key used in aggregation matrices.
    pub fn key(&self) -> String {
        match self {
            Self::Known(id) => id.to_string(),
            Self::Unknown => "UNKNOWN".to_string(),
        }
    }
}

/// Sufficiently defined neighbourhood of a concept in one view.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IpStatus {
    /// At least one active sufficiently defined ancestor.
    pub has_sd_ancestor: bool,
    /// At least one active sufficiently defined descendant.
    pub has_sd_descendant: bool,
    /// Primitive, with both of the above.
    pub is_intermediate_primitive: bool,
}

/// Resolves hierarchy buckets and IP flags against a graph oracle.
pub struct HierarchyAttributor<'g, G: TerminologyGraph + ?Sized> {
    graph: &'g G,
    memo: RwLock<HashMap<SctId, HierarchyBucket>>,
}

impl<'g, G: TerminologyGraph + ?Sized> HierarchyAttributor<'g, G> {
    /// Create an attributor over a graph.
    pub fn new(graph: &'g G) -> Self {
        Self {
            graph,
            memo: RwLock::new(HashMap::new()),
        }
    }

    /// The graph being attributed.
    pub fn graph(&self) -> &'g G {
        self.graph
    }

    /// Number of memoized attributions.
    pub fn cached(&self) -> usize {
        self.memo.read().len()
    }

    /// Resolve the hierarchy bucket of a concept.
    ///
    /// Fails only when the concept has a known depth greater than one but
    /// none of its ancestors sits at depth one.
    pub fn hierarchy_of(&self, concept: &Concept) -> Result<HierarchyBucket, IntegrityError> {
        if let Some(bucket) = self.memo.read().get(&concept.id) {
            return Ok(*bucket);
        }

        let bucket = self.resolve(concept)?;
        self.memo.write().insert(concept.id, bucket);
        Ok(bucket)
    }

    fn resolve(&self, concept: &Concept) -> Result<HierarchyBucket, IntegrityError> {
        if concept.id == self.graph.root() {
            return Ok(HierarchyBucket::Known(concept.id));
        }
        if !concept.active {
            return Ok(HierarchyBucket::Unknown);
        }

        match self.graph.depth_of(concept.id) {
            None => Ok(HierarchyBucket::Unknown),
            Some(1) => Ok(HierarchyBucket::Known(concept.id)),
            Some(depth) => {
                let mut top_level = self
                    .graph
                    .ancestors_of(concept.id, CharacteristicView::Inferred)
                    .into_iter()
                    .filter(|a| self.graph.depth_of(*a) == Some(1));

                let first = top_level.next().ok_or(IntegrityError::NoTopLevelAncestor {
                    concept_id: concept.id,
                    depth,
                })?;
                if let Some(other) = top_level.next() {
                    tracing::debug!(
                        concept_id = %concept.id,
                        chosen = %first,
                        other = %other,
                        "concept sits under more than one top-level hierarchy"
                    );
                }
                Ok(HierarchyBucket::Known(first))
            }
        }
    }

    /// Compute the SD ancestor/descendant flags and IP status in one view.
    pub fn ip_status(&self, concept: &Concept, view: CharacteristicView) -> IpStatus {
        let sd = |id: &SctId| {
            self.graph
                .concept(*id)
                .map_or(false, |c| c.active && c.is_fully_defined())
        };

        let has_sd_ancestor = self.graph.ancestors_of(concept.id, view).iter().any(sd);
        let has_sd_descendant = self.graph.descendants_of(concept.id, view).iter().any(sd);
        let is_intermediate_primitive =
            concept.active && !concept.is_fully_defined() && has_sd_ancestor && has_sd_descendant;

        IpStatus {
            has_sd_ancestor,
            has_sd_descendant,
            is_intermediate_primitive,
        }
    }

    /// Whether the concept is an intermediate primitive in `view`.
    pub fn is_intermediate_primitive(&self, concept: &Concept, view: CharacteristicView) -> bool {
        self.ip_status(concept, view).is_intermediate_primitive
    }
}
