//! Final rollup of an aggregation matrix into a release summary.

use serde::Serialize;
use std::collections::BTreeMap;

use crate::integrity::IntegrityCensus;
use crate::lookup::LookupError;
use crate::types::{ComponentType, EffectiveTime};
use super::matrix::{AggregationMatrix, CountVector, DimensionKind, RollupKey, RowKey, Slot};
use super::reasons::InactivationReasonBreakdown;

/// Rows, subtotals and grand totals of one dimension.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DimensionSummary {
    /// `key → component type → counts`.
    pub rows: BTreeMap<String, BTreeMap<ComponentType, CountVector>>,
    /// Natural groupings: refset kind for refsets, language code for
    /// languages. Empty for hierarchies.
    pub subtotals: BTreeMap<String, CountVector>,
    /// Grand total per component type.
    pub totals: BTreeMap<ComponentType, CountVector>,
}

impl DimensionSummary {
    /// Counts for one row.
    pub fn row(&self, key: &str, component_type: ComponentType) -> Option<&CountVector> {
        self.rows.get(key).and_then(|types| types.get(&component_type))
    }

    /// Grand total for a component type.
    pub fn total(&self, component_type: ComponentType) -> CountVector {
        self.totals.get(&component_type).copied().unwrap_or_default()
    }

    /// Subtotal for a group.
    pub fn subtotal(&self, group: &str) -> CountVector {
        self.subtotals.get(group).copied().unwrap_or_default()
    }
}

/// Output of a diff run, handed to report rendering.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReleaseSummary {
    /// Fingerprint of the configuration that produced this summary.
    pub config_fingerprint: String,
    /// Previous release the graph was compared against.
    pub previous_effective_time: Option<EffectiveTime>,
    /// Concepts visited in the current graph.
    pub concepts_processed: usize,
    /// Counts by top-level hierarchy.
    pub hierarchy: DimensionSummary,
    /// Counts of descriptions and text definitions by language code.
    pub language: DimensionSummary,
    /// Counts of refset members by refset.
    pub refset: DimensionSummary,
    /// Reasons of new inactivation indicators by hierarchy.
    pub inactivation_reasons: InactivationReasonBreakdown,
    /// Recoverable lookup failures met during the pass.
    pub lookup_errors: Vec<LookupError>,
    /// Counts from the end-of-pass integrity census.
    pub integrity: IntegrityCensus,
}

impl ReleaseSummary {
    /// Summary for one dimension.
    pub fn dimension(&self, kind: DimensionKind) -> &DimensionSummary {
        match kind {
            DimensionKind::Hierarchy => &self.hierarchy,
            DimensionKind::Language => &self.language,
            DimensionKind::Refset => &self.refset,
        }
    }

    /// Single counter lookup; zero for rows never touched.
    pub fn count(&self, row: &RowKey, slot: impl Into<Slot>) -> u64 {
        self.dimension(row.dimension)
            .row(&row.key, row.component_type)
            .map_or(0, |counts| counts.get(slot))
    }

    /// Whether any category was recorded anywhere.
    pub fn has_changes(&self) -> bool {
        DimensionKind::ALL
            .iter()
            .flat_map(|kind| self.dimension(*kind).rows.values())
            .flat_map(|types| types.values())
            .any(|counts| counts.categorised() > 0)
    }
}

impl AggregationMatrix {
    /// Roll rows up into per-dimension subtotals and grand totals.
    ///
    /// Subtotal and total CONCEPTS_AFFECTED are distinct concept counts,
    /// not sums of the rows beneath them.
    pub fn finalize(self) -> ReleaseSummary {
        let mut dimensions: BTreeMap<DimensionKind, DimensionSummary> = DimensionKind::ALL
            .into_iter()
            .map(|kind| (kind, DimensionSummary::default()))
            .collect();

        for (row, counts) in &self.rows {
            let summary = dimensions.entry(row.dimension).or_default();
            summary
                .rows
                .entry(row.key.clone())
                .or_default()
                .insert(row.component_type, *counts);

            summary.totals.entry(row.component_type).or_default().add(counts);
            if let Some(group) = self.subtotal_group(row) {
                summary.subtotals.entry(group).or_default().add(counts);
            }
        }

        for (kind, summary) in dimensions.iter_mut() {
            for (component_type, counts) in summary.totals.iter_mut() {
                let distinct = self.rollup_affected(&RollupKey::Total(*kind, *component_type));
                counts.set(Slot::ConceptsAffected, distinct);
            }
            for (group, counts) in summary.subtotals.iter_mut() {
                let distinct = self.rollup_affected(&RollupKey::Subtotal(*kind, group.clone()));
                counts.set(Slot::ConceptsAffected, distinct);
            }
        }

        let mut take = |kind: DimensionKind| dimensions.remove(&kind).unwrap_or_default();
        ReleaseSummary {
            config_fingerprint: String::new(),
            previous_effective_time: None,
            concepts_processed: 0,
            hierarchy: take(DimensionKind::Hierarchy),
            language: take(DimensionKind::Language),
            refset: take(DimensionKind::Refset),
            inactivation_reasons: self.reasons,
            lookup_errors: Vec::new(),
            integrity: IntegrityCensus::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::Classification;
    use crate::config::RefsetKind;
    use crate::summary::ConceptTally;
    use crate::types::{LifecycleCategory, SctId};

    const US_LANG: SctId = SctId::new(900000000000509007);
    const GB_LANG: SctId = SctId::new(900000000000508004);

    fn record_changed(matrix: &mut AggregationMatrix, tally: &mut ConceptTally, row: &RowKey) {
        matrix.record(row, Some(&Classification::of(LifecycleCategory::Changed)), true);
        tally.mark_affected(row);
    }

    #[test]
    fn test_totals_count_distinct_concepts() {
        let kinds =
            BTreeMap::from([(US_LANG, RefsetKind::Language), (GB_LANG, RefsetKind::Language)]);
        let mut matrix = AggregationMatrix::with_refset_kinds(&kinds);
        let us = RowKey::refset(US_LANG, ComponentType::LangRefsetEntry);
        let gb = RowKey::refset(GB_LANG, ComponentType::LangRefsetEntry);

        // One concept touching both language refsets.
        let mut tally = ConceptTally::new();
        record_changed(&mut matrix, &mut tally, &us);
        record_changed(&mut matrix, &mut tally, &gb);
        matrix.commit_concept(tally);

        // A second concept touching only one.
        let mut tally = ConceptTally::new();
        record_changed(&mut matrix, &mut tally, &us);
        matrix.commit_concept(tally);

        let summary = matrix.finalize();
        let refsets = summary.dimension(DimensionKind::Refset);

        let affected = |refset: SctId| {
            refsets
                .row(&refset.to_string(), ComponentType::LangRefsetEntry)
                .map_or(0, |counts| counts.get(Slot::ConceptsAffected))
        };
        assert_eq!(affected(US_LANG), 2);
        assert_eq!(affected(GB_LANG), 1);

        let total = refsets.total(ComponentType::LangRefsetEntry);
        assert_eq!(total.get(LifecycleCategory::Changed), 3);
        assert_eq!(total.get(Slot::ConceptsAffected), 2);

        let language = refsets.subtotal("language");
        assert_eq!(language.get(Slot::Total), 3);
        assert_eq!(language.get(Slot::ConceptsAffected), 2);
        assert!(summary.has_changes());
    }

    #[test]
    fn test_language_subtotals_by_code() {
        let mut matrix = AggregationMatrix::new();
        let en_desc = RowKey::language("en", ComponentType::Description);
        let en_def = RowKey::language("en", ComponentType::TextDefinition);
        let fr_desc = RowKey::language("fr", ComponentType::Description);

        let mut tally = ConceptTally::new();
        record_changed(&mut matrix, &mut tally, &en_desc);
        record_changed(&mut matrix, &mut tally, &en_def);
        record_changed(&mut matrix, &mut tally, &fr_desc);
        matrix.commit_concept(tally);

        let summary = matrix.finalize();
        let languages = &summary.language;
        assert_eq!(languages.subtotal("en").get(Slot::Total), 2);
        assert_eq!(languages.subtotal("en").get(Slot::ConceptsAffected), 1);
        assert_eq!(languages.subtotal("fr").get(Slot::Total), 1);
        assert_eq!(languages.total(ComponentType::Description).get(Slot::Total), 2);
        assert_eq!(languages.total(ComponentType::TextDefinition).get(Slot::Total), 1);
        assert!(summary.hierarchy.subtotals.is_empty());
    }

    #[test]
    fn test_empty_matrix_has_no_changes() {
        let summary = AggregationMatrix::new().finalize();
        assert!(!summary.has_changes());
        assert!(summary.hierarchy.rows.is_empty());
    }
}
