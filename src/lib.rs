//! # release-lifecycle-kernel
//!
//! Component lifecycle diffs between two terminology releases.
//!
//! The kernel answers one question:
//!
//! > Since the previous release, what happened to every component of every concept?
//!
//! ## Core Contract
//!
//! 1. Freeze a release into a compact tab-delimited snapshot, one line per concept
//! 2. Compare a live graph against that snapshot, assigning each component
//!    exactly one lifecycle category
//! 3. Aggregate the categories by top-level hierarchy, language and refset
//!
//! ## Architecture
//!
//! ```text
//! snapshot file → SnapshotIndex ─┐
//!                                ├→ LifecycleClassifier → AggregationMatrix → ReleaseSummary
//! TerminologyGraph → Hierarchy ──┘          ↑
//!                    Lookup            ModuleScope
//! ```
//!
//! ## Determinism Guarantees
//!
//! - Same graph + same snapshot + same config → identical summary
//! - Sequential and parallel passes produce identical summaries
//! - Snapshot files are written in concept id order and round-trip exactly

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod types;
pub mod store;
pub mod hierarchy;
pub mod integrity;
pub mod snapshot;
pub mod scope;
pub mod classifier;
pub mod lookup;
pub mod summary;
pub mod config;
pub mod engine;
pub mod canonical;

// Re-exports
pub use types::{
    SctId, ComponentId, ComponentIdError, EffectiveTime, EffectiveTimeError, changed_since,
    Component, ComponentType, ComponentDetail, CharacteristicView, UnknownComponentType, IS_A,
    Concept, DefinitionStatus, ROOT_CONCEPT, LifecycleCategory, InactivationReason,
};
pub use store::{TerminologyGraph, InMemoryTerminologyGraph};
pub use hierarchy::{HierarchyAttributor, HierarchyBucket, IpStatus};
pub use integrity::{IntegrityError, IntegrityCensus, census, verify_index};
pub use snapshot::{
    HistoricDatum, ComponentIdSets, SnapshotIndex, SnapshotError, FormatError,
    encode, decode, capture, COLUMN_COUNT,
};
pub use scope::{ModuleScope, ScopeTransition};
pub use classifier::{classify_transition, Classification, ConceptDisposition, LifecycleClassifier};
pub use lookup::{HierarchyLookup, LookupError, LookupSource, Resolution};
pub use summary::{
    AggregationMatrix, ConceptTally, CountVector, DimensionKind, RowKey, Slot,
    InactivationReasonBreakdown, DimensionSummary, ReleaseSummary,
};
pub use config::{DiffConfig, RefsetKind, RefsetTag, ConfigError};
pub use engine::{ReleaseDiffEngine, EngineError};
pub use canonical::{to_canonical_bytes, canonical_hash, canonical_hash_hex};

/// Version of the snapshot line layout.
/// Increment on any change to column order or encoding.
pub const SNAPSHOT_SCHEMA_VERSION: &str = "1.0.0";
