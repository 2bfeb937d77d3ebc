//! Multi-dimensional lifecycle counts.
//!
//! ```text
//! classify ──record──▶ AggregationMatrix ──merge──▶ AggregationMatrix ──finalize──▶ ReleaseSummary
//!                       (one per worker)
//! ```

pub mod matrix;
pub mod reasons;
pub mod rollup;

pub use matrix::{AggregationMatrix, ConceptTally, CountVector, DimensionKind, RowKey, Slot};
pub use reasons::InactivationReasonBreakdown;
pub use rollup::{DimensionSummary, ReleaseSummary};
