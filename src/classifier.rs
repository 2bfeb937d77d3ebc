//! Lifecycle classification of components between two releases.
//!
//! ## Transition table
//!
//! | active | existed active | existed inactive | changed | category |
//! |---|---|---|---|---|
//! | Y | N | N | any | `New` |
//! | Y | N | Y | any | `Reactivated` |
//! | Y | Y | N | Y | `Changed` |
//! | Y | Y | N | N | unchanged |
//! | N | N | N | any | `NewInactive` |
//! | N | Y | N | any | `Inactivated` |
//! | N | N | Y | Y | `ChangedInactive` |
//! | N | N | Y | N | unchanged |
//!
//! ## Concept-level order
//!
//! 1. Out of scope now: `Promoted` if the previous module was in scope, else skipped
//! 2. Previous module differs: `MovedModule`, nothing else for the concept
//! 3. Otherwise the table, with `New` refined by definition status

use crate::scope::{ModuleScope, ScopeTransition};
use crate::snapshot::HistoricDatum;
use crate::types::{
    changed_since, Component, ComponentType, Concept, DefinitionStatus, EffectiveTime,
    InactivationReason, LifecycleCategory, SctId,
};

/// Pure transition table.
///
/// `existed_active` and `existed_inactive` are mutually exclusive in any
/// valid snapshot; if both are set, the active set wins.
pub fn classify_transition(
    active: bool,
    existed_active: bool,
    existed_inactive: bool,
    changed: bool,
) -> Option<LifecycleCategory> {
    use LifecycleCategory::*;

    match (active, existed_active, existed_inactive) {
        (true, false, false) => Some(New),
        (true, false, true) => Some(Reactivated),
        (true, true, _) => changed.then_some(Changed),
        (false, false, false) => Some(NewInactive),
        (false, true, _) => Some(Inactivated),
        (false, false, true) => changed.then_some(ChangedInactive),
    }
}

/// Outcome of classifying one component.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Classification {
    /// Primary category.
    pub category: LifecycleCategory,
    /// Refinement counted alongside `category`: `NewWithNewConcept` for
    /// components, `NewPrimitive`/`NewFullyDefined` for the concept row.
    pub refinement: Option<LifecycleCategory>,
    /// Reason sub-bucket for new inactivation indicators.
    pub reason: Option<InactivationReason>,
}

impl Classification {
    /// A bare category with no refinement.
    pub fn of(category: LifecycleCategory) -> Self {
        Self {
            category,
            refinement: None,
            reason: None,
        }
    }

    /// Every category slot this classification increments.
    pub fn categories(&self) -> impl Iterator<Item = LifecycleCategory> {
        std::iter::once(self.category).chain(self.refinement)
    }
}

/// What to do with a concept before looking at its components.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConceptDisposition {
    /// Out of scope now and before; not counted at all.
    Skip,
    /// In scope before, out of scope now.
    Promoted,
    /// In scope, but the previous release had it in another module.
    MovedModule {
        /// Module at the previous release.
        previous: SctId,
    },
    /// Classify the concept row and its components through the table.
    Classify {
        /// Absent from the previous snapshot.
        is_new: bool,
    },
}

impl ConceptDisposition {
    /// Whether component categories are recorded for this concept.
    pub fn classifies_components(&self) -> bool {
        matches!(self, Self::Classify { .. })
    }

    /// Whether state totals are tallied for this concept.
    pub fn tallies(&self) -> bool {
        !matches!(self, Self::Skip | Self::Promoted)
    }
}

/// Classifies concepts and components against the previous release.
#[derive(Debug, Clone)]
pub struct LifecycleClassifier {
    previous_effective_time: EffectiveTime,
    scope: ModuleScope,
}

impl LifecycleClassifier {
    /// Create a classifier for a given previous release and module scope.
    pub fn new(previous_effective_time: EffectiveTime, scope: ModuleScope) -> Self {
        Self {
            previous_effective_time,
            scope,
        }
    }

    /// Effective time of the previous release.
    pub fn previous_effective_time(&self) -> &EffectiveTime {
        &self.previous_effective_time
    }

    /// Module scope in force.
    pub fn scope(&self) -> &ModuleScope {
        &self.scope
    }

    /// Whether a component's effective time is after the previous release.
    pub fn changed(&self, effective_time: Option<&EffectiveTime>) -> bool {
        changed_since(effective_time, &self.previous_effective_time)
    }

    /// Decide how a concept takes part in the pass.
    pub fn disposition(
        &self,
        concept: &Concept,
        datum: Option<&HistoricDatum>,
    ) -> ConceptDisposition {
        let previous = datum.map(|d| d.module_id);
        match self.scope.transition(concept.module_id, previous) {
            ScopeTransition::OutOfScope => ConceptDisposition::Skip,
            ScopeTransition::Promoted => ConceptDisposition::Promoted,
            ScopeTransition::InScope => match previous {
                Some(previous) if previous != concept.module_id => {
                    ConceptDisposition::MovedModule { previous }
                }
                _ => ConceptDisposition::Classify { is_new: datum.is_none() },
            },
        }
    }

    /// Classify the concept row itself.
    ///
    /// `New` is refined into `NewPrimitive` or `NewFullyDefined` by the
    /// current definition status.
    pub fn classify_concept(
        &self,
        concept: &Concept,
        datum: Option<&HistoricDatum>,
    ) -> Option<Classification> {
        let (existed_active, existed_inactive) = match datum {
            Some(d) => (d.active, !d.active),
            None => (false, false),
        };
        let changed = self.changed(concept.effective_time.as_ref());
        let category =
            classify_transition(concept.active, existed_active, existed_inactive, changed)?;

        let refinement =
            (category == LifecycleCategory::New).then(|| match concept.definition_status {
                DefinitionStatus::Primitive => LifecycleCategory::NewPrimitive,
                DefinitionStatus::FullyDefined => LifecycleCategory::NewFullyDefined,
            });

        Some(Classification {
            category,
            refinement,
            reason: None,
        })
    }

    /// Classify one component; `None` means unchanged.
    pub fn classify(
        &self,
        component: &Component,
        is_new_owning_concept: bool,
        datum: Option<&HistoricDatum>,
    ) -> Option<Classification> {
        let (existed_active, existed_inactive) = match datum {
            Some(d) => (
                d.existed_active(component.component_type, &component.id),
                d.existed_inactive(component.component_type, &component.id),
            ),
            None => (false, false),
        };
        let changed = self.changed(component.effective_time.as_ref());
        let category =
            classify_transition(component.active, existed_active, existed_inactive, changed)?;

        let is_new = category == LifecycleCategory::New;
        let refinement =
            (is_new && is_new_owning_concept).then_some(LifecycleCategory::NewWithNewConcept);
        let reason = (is_new && component.component_type == ComponentType::InactivationIndicator)
            .then(|| InactivationReason::from_value(component.target()));

        Some(Classification {
            category,
            refinement,
            reason,
        })
    }
}
