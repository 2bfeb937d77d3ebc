//! Graph oracle consumed by the lifecycle kernel.

pub mod memory;

use std::collections::BTreeSet;

use crate::types::{CharacteristicView, Concept, SctId, ROOT_CONCEPT};

/// Read-only view of the current concept graph and its transitive closure.
///
/// Implementations must guarantee deterministic ordering of results and be
/// shareable across worker threads for the duration of a pass.
pub trait TerminologyGraph: Send + Sync {
    /// Fetch a concept by ID.
    fn concept(&self, id: SctId) -> Option<&Concept>;

    /// All concepts, ordered by ID.
    fn all_concepts(&self) -> Vec<&Concept>;

    /// Transitive ancestors of a concept in a view (excluding itself).
    fn ancestors_of(&self, id: SctId, view: CharacteristicView) -> BTreeSet<SctId>;

    /// Transitive descendants of a concept in a view (excluding itself).
    fn descendants_of(&self, id: SctId, view: CharacteristicView) -> BTreeSet<SctId>;

    /// Inferred depth below the root, `None` when unknown or unreachable.
    fn depth_of(&self, id: SctId) -> Option<u32>;

    /// Root concept of the hierarchy.
    fn root(&self) -> SctId {
        ROOT_CONCEPT
    }
}

pub use memory::InMemoryTerminologyGraph;
