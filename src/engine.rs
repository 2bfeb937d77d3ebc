//! Full diff pass over a live graph against a previous snapshot.
//!
//! ## Pass
//!
//! ```text
//! for concept in graph (id order):
//!     disposition ── Skip ──────────────▶ (nothing)
//!                 ── Promoted ──────────▶ PROMOTED on the concept row
//!                 ── MovedModule ───────▶ MOVED_MODULE + state totals only
//!                 ── Classify ──────────▶ table for the concept row and every component
//!     commit affected flags
//! integrity census → finalize
//! ```
//!
//! [`ReleaseDiffEngine::run_parallel`] folds one matrix shard per rayon
//! worker and merges them before the single sequential `finalize`, so both
//! entry points return identical summaries.

use rayon::prelude::*;
use std::time::Instant;

use crate::classifier::{Classification, ConceptDisposition, LifecycleClassifier};
use crate::config::{ConfigError, DiffConfig};
use crate::hierarchy::HierarchyAttributor;
use crate::integrity::{census, verify_index, IntegrityError};
use crate::lookup::{HierarchyLookup, LookupError};
use crate::snapshot::SnapshotIndex;
use crate::store::TerminologyGraph;
use crate::summary::{AggregationMatrix, ConceptTally, ReleaseSummary, RowKey};
use crate::types::{Component, ComponentType, Concept, LifecycleCategory};

/// Error type for a diff run.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Configuration rejected.
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
    /// Structural violation; the run is aborted.
    #[error("integrity error: {0}")]
    Integrity(#[from] IntegrityError),
}

/// Worker-local state of a pass.
#[derive(Default)]
struct Shard {
    matrix: AggregationMatrix,
    lookup_errors: Vec<LookupError>,
    concepts: usize,
}

impl Shard {
    fn with_matrix(matrix: AggregationMatrix) -> Self {
        Self {
            matrix,
            ..Self::default()
        }
    }

    fn merge(mut self, other: Shard) -> Shard {
        self.matrix.merge(other.matrix);
        self.lookup_errors.extend(other.lookup_errors);
        self.concepts += other.concepts;
        self
    }
}

/// Compares a live graph against the previous release.
pub struct ReleaseDiffEngine<'a, G: TerminologyGraph + ?Sized> {
    graph: &'a G,
    previous: &'a SnapshotIndex,
    secondary: Option<&'a SnapshotIndex>,
    config: DiffConfig,
    classifier: LifecycleClassifier,
}

impl<'a, G: TerminologyGraph + ?Sized> ReleaseDiffEngine<'a, G> {
    /// Create an engine; the configuration is validated here.
    pub fn new(
        graph: &'a G,
        previous: &'a SnapshotIndex,
        config: DiffConfig,
    ) -> Result<Self, EngineError> {
        config.validate()?;
        let classifier = LifecycleClassifier::new(
            config.previous_effective_time.clone(),
            config.module_scope(),
        );
        Ok(Self {
            graph,
            previous,
            secondary: None,
            config,
            classifier,
        })
    }

    /// Consult a secondary snapshot for hierarchies the previous one lacks.
    pub fn with_secondary(mut self, secondary: &'a SnapshotIndex) -> Self {
        self.secondary = Some(secondary);
        self
    }

    /// Configuration in force.
    pub fn config(&self) -> &DiffConfig {
        &self.config
    }

    /// Sequential pass in concept id order.
    pub fn run(&self) -> Result<ReleaseSummary, EngineError> {
        let start = Instant::now();
        let attributor = HierarchyAttributor::new(self.graph);
        let lookup = self.lookup(&attributor);

        let mut shard = self.empty_shard();
        for concept in self.concepts() {
            self.process_concept(&lookup, concept, &mut shard)?;
        }

        self.summarize(&attributor, shard, start)
    }

    /// Parallel pass: one matrix shard per worker, merged before finalize.
    pub fn run_parallel(&self) -> Result<ReleaseSummary, EngineError> {
        let start = Instant::now();
        let attributor = HierarchyAttributor::new(self.graph);
        let lookup = self.lookup(&attributor);

        let shard = self
            .concepts()
            .par_iter()
            .try_fold(
                || self.empty_shard(),
                |mut shard, concept| {
                    self.process_concept(&lookup, concept, &mut shard)?;
                    Ok::<_, IntegrityError>(shard)
                },
            )
            .try_reduce(|| self.empty_shard(), |a, b| Ok(a.merge(b)))?;

        self.summarize(&attributor, shard, start)
    }

    fn lookup<'l>(&'l self, attributor: &'l HierarchyAttributor<'l, G>) -> HierarchyLookup<'l, G> {
        let lookup = HierarchyLookup::new(attributor, self.previous);
        match self.secondary {
            Some(secondary) => lookup.with_secondary(secondary),
            None => lookup,
        }
    }

    fn empty_shard(&self) -> Shard {
        Shard::with_matrix(AggregationMatrix::with_refset_kinds(&self.config.refset_kinds()))
    }

    fn concepts(&self) -> Vec<&'a Concept> {
        let mut concepts = self.graph.all_concepts();
        concepts.sort_by_key(|c| c.id);
        concepts
    }

    fn process_concept(
        &self,
        lookup: &HierarchyLookup<'_, G>,
        concept: &Concept,
        shard: &mut Shard,
    ) -> Result<(), IntegrityError> {
        shard.concepts += 1;
        let datum = self.previous.get(concept.id);
        let disposition = self.classifier.disposition(concept, datum);
        if disposition == ConceptDisposition::Skip {
            return Ok(());
        }

        let hierarchy = lookup
            .resolve(concept)
            .map_err(|e| {
                e.log();
                e
            })?
            .bucket
            .key();
        let concept_row = RowKey::hierarchy(hierarchy.as_str(), ComponentType::Concept);
        let mut tally = ConceptTally::new();

        let concept_class = match disposition {
            ConceptDisposition::Promoted => {
                tracing::debug!(
                    concept_id = %concept.id,
                    module_id = %concept.module_id,
                    "concept promoted out of scope"
                );
                shard.matrix.record_category(&concept_row, LifecycleCategory::Promoted);
                tally.mark_affected(&concept_row);
                shard.matrix.commit_concept(tally);
                return Ok(());
            }
            ConceptDisposition::MovedModule { previous } => {
                tracing::debug!(
                    concept_id = %concept.id,
                    from = %previous,
                    to = %concept.module_id,
                    "concept moved module"
                );
                Some(Classification::of(LifecycleCategory::MovedModule))
            }
            _ => self.classifier.classify_concept(concept, datum),
        };

        shard.matrix.record(&concept_row, concept_class.as_ref(), concept.active);
        if concept_class.is_some() {
            tally.mark_affected(&concept_row);
        }

        let is_new = disposition == ConceptDisposition::Classify { is_new: true };
        for component in &concept.components {
            if component.component_type.tracked_index().is_none()
                || !self.classifier.scope().in_scope(component.module_id)
            {
                continue;
            }

            let classification = if disposition.classifies_components() {
                self.classifier.classify(component, is_new, datum)
            } else {
                None
            };

            for row in rows_for(component, &hierarchy) {
                shard.matrix.record(&row, classification.as_ref(), component.active);
                if classification.is_some() {
                    tally.mark_affected(&row);
                }
            }

            let Some(classification) = classification else {
                continue;
            };
            if let Some(reason) = classification.reason {
                shard.matrix.record_reason(&hierarchy, reason);
            }
            if component.component_type == ComponentType::HistoricalAssociation {
                if let Some(target) = component.target() {
                    if let Some(error) = lookup.resolve_id(target)?.error {
                        shard.lookup_errors.push(error);
                    }
                }
            }
        }

        shard.matrix.commit_concept(tally);
        Ok(())
    }

    fn summarize(
        &self,
        attributor: &HierarchyAttributor<'_, G>,
        shard: Shard,
        start: Instant,
    ) -> Result<ReleaseSummary, EngineError> {
        verify_index(self.previous)?;
        if let Some(secondary) = self.secondary {
            verify_index(secondary)?;
        }
        let integrity = census(attributor)?;

        let mut lookup_errors = shard.lookup_errors;
        lookup_errors.sort_by_key(LookupError::concept_id);
        lookup_errors.dedup();

        let mut summary = shard.matrix.finalize();
        summary.config_fingerprint = self.config.fingerprint();
        summary.previous_effective_time = Some(self.config.previous_effective_time.clone());
        summary.concepts_processed = shard.concepts;
        summary.lookup_errors = lookup_errors;
        summary.integrity = integrity;

        tracing::info!(
            concepts = summary.concepts_processed,
            previous_concepts = self.previous.len(),
            lookup_errors = summary.lookup_errors.len(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            fingerprint = %summary.config_fingerprint,
            "release diff complete"
        );
        Ok(summary)
    }
}

/// Every row a component is counted on.
fn rows_for(component: &Component, hierarchy: &str) -> Vec<RowKey> {
    let mut rows = vec![RowKey::hierarchy(hierarchy, component.component_type)];
    if component.component_type.is_description() {
        if let Some(code) = component.language_code() {
            rows.push(RowKey::language(code, component.component_type));
        }
    }
    if component.component_type.is_refset_member() {
        if let Some(refset_id) = component.refset_id() {
            rows.push(RowKey::refset(refset_id, component.component_type));
        }
    }
    rows
}
