//! Count vectors and the aggregation matrix.
//!
//! Rows are keyed by `(dimension, key, component type)`. A concept's
//! affected rows are gathered in a [`ConceptTally`] while its components are
//! classified and committed once, so CONCEPTS_AFFECTED never counts the same
//! concept twice for a row or any rollup of that row.

use serde::ser::{Serialize, SerializeMap, Serializer};
use serde::Deserialize;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use crate::classifier::Classification;
use crate::config::RefsetKind;
use crate::types::{ComponentType, InactivationReason, LifecycleCategory, SctId};
use super::reasons::InactivationReasonBreakdown;

/// One counter of a [`CountVector`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Slot {
    /// A lifecycle category.
    Category(LifecycleCategory),
    /// Every in-scope component.
    Total,
    /// Every in-scope active component.
    TotalActive,
    /// Distinct concepts with at least one categorised component.
    ConceptsAffected,
}

impl Slot {
    /// Number of slots in a vector.
    pub const COUNT: usize = LifecycleCategory::ALL.len() + 3;

    fn index(&self) -> usize {
        let categories = LifecycleCategory::ALL.len();
        match self {
            Self::Category(c) => c.index(),
            Self::Total => categories,
            Self::TotalActive => categories + 1,
            Self::ConceptsAffected => categories + 2,
        }
    }

    /// Every slot in vector order.
    pub fn all() -> impl Iterator<Item = Slot> {
        LifecycleCategory::ALL
            .into_iter()
            .map(Slot::Category)
            .chain([Slot::Total, Slot::TotalActive, Slot::ConceptsAffected])
    }

    /// Report column label.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Category(c) => c.label(),
            Self::Total => "TOTAL",
            Self::TotalActive => "TOTAL_ACTIVE",
            Self::ConceptsAffected => "CONCEPTS_AFFECTED",
        }
    }
}

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl From<LifecycleCategory> for Slot {
    fn from(category: LifecycleCategory) -> Self {
        Self::Category(category)
    }
}

/// Fixed-width counters, one per [`Slot`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CountVector {
    counts: [u64; Slot::COUNT],
}

impl CountVector {
    /// Read a slot.
    pub fn get(&self, slot: impl Into<Slot>) -> u64 {
        self.counts[slot.into().index()]
    }

    /// Increment a slot by one.
    pub fn increment(&mut self, slot: impl Into<Slot>) {
        self.counts[slot.into().index()] += 1;
    }

    /// Add another vector into this one.
    ///
    /// CONCEPTS_AFFECTED is summed too; callers rolling up rows that share
    /// concepts must overwrite it with a distinct count.
    pub fn add(&mut self, other: &CountVector) {
        for (mine, theirs) in self.counts.iter_mut().zip(other.counts.iter()) {
            *mine += theirs;
        }
    }

    pub(crate) fn set(&mut self, slot: Slot, value: u64) {
        self.counts[slot.index()] = value;
    }

    /// Whether every slot is zero.
    pub fn is_empty(&self) -> bool {
        self.counts.iter().all(|c| *c == 0)
    }

    /// Sum of the category slots.
    pub fn categorised(&self) -> u64 {
        LifecycleCategory::ALL.iter().map(|c| self.get(*c)).sum()
    }
}

impl Serialize for CountVector {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(Slot::COUNT))?;
        for slot in Slot::all() {
            map.serialize_entry(slot.label(), &self.get(slot))?;
        }
        map.end()
    }
}

/// Axis a row is counted along.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DimensionKind {
    /// Top-level hierarchy bucket.
    Hierarchy,
    /// Description language code.
    Language,
    /// Reference set id.
    Refset,
}

impl DimensionKind {
    /// All dimensions.
    pub const ALL: [DimensionKind; 3] = [Self::Hierarchy, Self::Language, Self::Refset];
}

/// Address of one row.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RowKey {
    /// Dimension.
    pub dimension: DimensionKind,
    /// Key within the dimension (hierarchy id, language code, refset id).
    pub key: String,
    /// Component type counted.
    pub component_type: ComponentType,
}

impl RowKey {
    /// Row in the hierarchy dimension.
    pub fn hierarchy(key: impl Into<String>, component_type: ComponentType) -> Self {
        Self {
            dimension: DimensionKind::Hierarchy,
            key: key.into(),
            component_type,
        }
    }

    /// Row in the language dimension.
    pub fn language(code: impl Into<String>, component_type: ComponentType) -> Self {
        Self {
            dimension: DimensionKind::Language,
            key: code.into(),
            component_type,
        }
    }

    /// Row in the refset dimension.
    pub fn refset(refset_id: SctId, component_type: ComponentType) -> Self {
        Self {
            dimension: DimensionKind::Refset,
            key: refset_id.to_string(),
            component_type,
        }
    }
}

/// Rollup a row contributes to.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub(crate) enum RollupKey {
    /// Grand total per component type.
    Total(DimensionKind, ComponentType),
    /// Natural grouping within a dimension.
    Subtotal(DimensionKind, String),
}

/// Rows a single concept has touched with a categorised component.
#[derive(Debug, Clone, Default)]
pub struct ConceptTally {
    affected: BTreeSet<RowKey>,
}

impl ConceptTally {
    /// Empty tally for the next concept.
    pub fn new() -> Self {
        Self::default()
    }

    /// Flag a row as affected; repeated calls are no-ops.
    pub fn mark_affected(&mut self, row: &RowKey) {
        if !self.affected.contains(row) {
            self.affected.insert(row.clone());
        }
    }

    /// Whether a row has been flagged.
    pub fn is_affected(&self, row: &RowKey) -> bool {
        self.affected.contains(row)
    }

    /// Whether nothing was flagged.
    pub fn is_empty(&self) -> bool {
        self.affected.is_empty()
    }
}

/// Per-run counters for every dimension.
#[derive(Debug, Clone, Default)]
pub struct AggregationMatrix {
    pub(crate) rows: BTreeMap<RowKey, CountVector>,
    pub(crate) rollup_affected: BTreeMap<RollupKey, u64>,
    pub(crate) reasons: InactivationReasonBreakdown,
    refset_kinds: BTreeMap<String, RefsetKind>,
}

impl AggregationMatrix {
    /// Empty matrix with no explicit refset groupings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Empty matrix grouping refsets by the given tags.
    pub fn with_refset_kinds(kinds: &BTreeMap<SctId, RefsetKind>) -> Self {
        Self {
            refset_kinds: kinds.iter().map(|(id, kind)| (id.to_string(), *kind)).collect(),
            ..Self::default()
        }
    }

    /// Count one in-scope component on a row.
    ///
    /// TOTAL always increments, TOTAL_ACTIVE when `active`, and every slot
    /// of `classification` once.
    pub fn record(&mut self, row: &RowKey, classification: Option<&Classification>, active: bool) {
        let counts = self.rows.entry(row.clone()).or_default();
        counts.increment(Slot::Total);
        if active {
            counts.increment(Slot::TotalActive);
        }
        if let Some(classification) = classification {
            for category in classification.categories() {
                counts.increment(category);
            }
        }
    }

    /// Count a single category with no state totals.
    pub fn record_category(&mut self, row: &RowKey, category: LifecycleCategory) {
        self.rows.entry(row.clone()).or_default().increment(category);
    }

    /// Count a new inactivation indicator's reason under a hierarchy key.
    pub fn record_reason(&mut self, hierarchy_key: &str, reason: InactivationReason) {
        self.reasons.record(hierarchy_key, reason);
    }

    /// Apply a concept's affected flags to rows and rollups, once each.
    pub fn commit_concept(&mut self, tally: ConceptTally) {
        let mut rollups = BTreeSet::new();
        for row in &tally.affected {
            self.rows.entry(row.clone()).or_default().increment(Slot::ConceptsAffected);
            rollups.insert(RollupKey::Total(row.dimension, row.component_type));
            if let Some(group) = self.subtotal_group(row) {
                rollups.insert(RollupKey::Subtotal(row.dimension, group));
            }
        }
        for rollup in rollups {
            *self.rollup_affected.entry(rollup).or_default() += 1;
        }
    }

    /// Fold another shard into this one.
    pub fn merge(&mut self, other: AggregationMatrix) {
        for (row, counts) in other.rows {
            self.rows.entry(row).or_default().add(&counts);
        }
        for (rollup, count) in other.rollup_affected {
            *self.rollup_affected.entry(rollup).or_default() += count;
        }
        self.reasons.merge(other.reasons);
    }

    /// Counts recorded on a row so far.
    pub fn row(&self, row: &RowKey) -> Option<&CountVector> {
        self.rows.get(row)
    }

    /// Number of populated rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether nothing has been recorded.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Subtotal group of a row: language code for language rows, refset
    /// kind for refset rows, none for hierarchy rows.
    pub(crate) fn subtotal_group(&self, row: &RowKey) -> Option<String> {
        match row.dimension {
            DimensionKind::Hierarchy => None,
            DimensionKind::Language => Some(row.key.clone()),
            DimensionKind::Refset => {
                let kind = self
                    .refset_kinds
                    .get(&row.key)
                    .copied()
                    .unwrap_or_else(|| RefsetKind::for_member_type(row.component_type));
                Some(kind.to_string())
            }
        }
    }

    pub(crate) fn rollup_affected(&self, rollup: &RollupKey) -> u64 {
        self.rollup_affected.get(rollup).copied().unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use LifecycleCategory::*;

    fn changed() -> Classification {
        Classification::of(Changed)
    }

    #[test]
    fn test_slot_indices_are_distinct() {
        let indices: BTreeSet<usize> = Slot::all().map(|s| s.index()).collect();
        assert_eq!(indices.len(), Slot::COUNT);
    }

    #[test]
    fn test_record_totals() {
        let mut matrix = AggregationMatrix::new();
        let row = RowKey::hierarchy("404684003", ComponentType::Description);

        let new_with_concept = Classification {
            refinement: Some(NewWithNewConcept),
            ..Classification::of(New)
        };
        matrix.record(&row, Some(&new_with_concept), true);
        matrix.record(&row, None, false);

        let counts = matrix.row(&row).unwrap();
        assert_eq!(counts.get(Slot::Total), 2);
        assert_eq!(counts.get(Slot::TotalActive), 1);
        assert_eq!(counts.get(New), 1);
        assert_eq!(counts.get(NewWithNewConcept), 1);
        assert_eq!(counts.categorised(), 2);
    }

    #[test]
    fn test_affected_is_idempotent_per_concept() {
        let mut matrix = AggregationMatrix::new();
        let row = RowKey::hierarchy("404684003", ComponentType::Relationship);

        let mut tally = ConceptTally::new();
        for _ in 0..2 {
            matrix.record(&row, Some(&changed()), true);
            tally.mark_affected(&row);
        }
        matrix.commit_concept(tally);

        let counts = matrix.row(&row).unwrap();
        assert_eq!(counts.get(Changed), 2);
        assert_eq!(counts.get(Slot::ConceptsAffected), 1);
        let total = RollupKey::Total(DimensionKind::Hierarchy, ComponentType::Relationship);
        assert_eq!(matrix.rollup_affected(&total), 1);
    }

    #[test]
    fn test_refset_subtotal_groups() {
        let explicit = BTreeMap::from([(SctId::new(900000000000509007), RefsetKind::Language)]);
        let matrix = AggregationMatrix::with_refset_kinds(&explicit);

        let tagged =
            RowKey::refset(SctId::new(900000000000509007), ComponentType::LangRefsetEntry);
        let untagged =
            RowKey::refset(SctId::new(900000000000527005), ComponentType::HistoricalAssociation);
        let other = RowKey::refset(SctId::new(123), ComponentType::Axiom);

        assert_eq!(matrix.subtotal_group(&tagged).as_deref(), Some("language"));
        assert_eq!(matrix.subtotal_group(&untagged).as_deref(), Some("association"));
        assert_eq!(matrix.subtotal_group(&other).as_deref(), Some("other"));
        assert_eq!(
            matrix.subtotal_group(&RowKey::hierarchy("1", ComponentType::Axiom)),
            None
        );
    }

    #[test]
    fn test_merge_sums_shards() {
        let row = RowKey::language("en", ComponentType::Description);

        let mut left = AggregationMatrix::new();
        let mut tally = ConceptTally::new();
        left.record(&row, Some(&changed()), true);
        tally.mark_affected(&row);
        left.commit_concept(tally);

        let mut right = AggregationMatrix::new();
        let mut tally = ConceptTally::new();
        right.record(&row, Some(&changed()), true);
        tally.mark_affected(&row);
        right.commit_concept(tally);
        right.record_reason("404684003", InactivationReason::Duplicate);

        left.merge(right);
        let counts = left.row(&row).unwrap();
        assert_eq!(counts.get(Changed), 2);
        assert_eq!(counts.get(Slot::ConceptsAffected), 2);
        assert_eq!(
            left.rollup_affected(&RollupKey::Subtotal(DimensionKind::Language, "en".into())),
            2
        );
        assert_eq!(left.reasons.count("404684003", InactivationReason::Duplicate), 1);
    }

    #[test]
    fn test_count_vector_serializes_labels() {
        let mut counts = CountVector::default();
        counts.increment(Promoted);
        let json = serde_json::to_value(counts).unwrap();
        assert_eq!(json["PROMOTED"], 1);
        assert_eq!(json["TOTAL"], 0);
        assert_eq!(json.as_object().unwrap().len(), Slot::COUNT);
    }
}
