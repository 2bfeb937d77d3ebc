//! Historic snapshots: the frozen "previous release" side of a diff.
//!
//! ```text
//! TerminologyGraph ──capture──▶ SnapshotIndex ──write──▶ snapshot file
//!                                     ▲                        │
//!                                     └─────────load───────────┘
//! ```

pub mod datum;
pub mod codec;
pub mod index;
pub mod capture;

pub use datum::{HistoricDatum, ComponentIdSets, OverlappingIdError};
pub use codec::{encode, decode, Column, FormatError, SCHEMA, COLUMN_COUNT};
pub use index::{SnapshotIndex, SnapshotError};
pub use capture::{capture, capture_concept};
