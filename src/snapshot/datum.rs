//! Frozen per-concept state at the previous release.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::hierarchy::HierarchyBucket;
use crate::types::{Component, ComponentId, ComponentType, DefinitionStatus, SctId};

/// Error raised when an id would sit in both the active and inactive set.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("component {id} is listed as both active and inactive")]
pub struct OverlappingIdError {
    /// The offending id.
    pub id: ComponentId,
}

/// Active and inactive ids of one component type.
///
/// The two sets never intersect.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComponentIdSets {
    active: BTreeSet<ComponentId>,
    inactive: BTreeSet<ComponentId>,
}

impl ComponentIdSets {
    /// Create empty sets.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from explicit sets, rejecting any overlap.
    pub fn from_parts(
        active: BTreeSet<ComponentId>,
        inactive: BTreeSet<ComponentId>,
    ) -> Result<Self, OverlappingIdError> {
        if let Some(id) = active.intersection(&inactive).next() {
            return Err(OverlappingIdError { id: id.clone() });
        }
        Ok(Self { active, inactive })
    }

    /// Record a component state. An active record wins over an inactive one.
    pub fn insert(&mut self, id: ComponentId, active: bool) {
        if active {
            self.inactive.remove(&id);
            self.active.insert(id);
        } else if !self.active.contains(&id) {
            self.inactive.insert(id);
        }
    }

    /// Ids that were active.
    pub fn active(&self) -> &BTreeSet<ComponentId> {
        &self.active
    }

    /// Ids that were inactive.
    pub fn inactive(&self) -> &BTreeSet<ComponentId> {
        &self.inactive
    }

    /// Whether no ids are recorded.
    pub fn is_empty(&self) -> bool {
        self.active.is_empty() && self.inactive.is_empty()
    }

    /// Whether the two sets are disjoint.
    pub fn is_disjoint(&self) -> bool {
        self.active.is_disjoint(&self.inactive)
    }
}

/// One concept's frozen state at the previous snapshot time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoricDatum {
    /// Concept identifier.
    pub concept_id: SctId,
    /// Fully specified name at the time.
    pub fsn: String,
    /// Whether the concept was active.
    pub active: bool,
    /// Definition status at the time.
    pub definition_status: DefinitionStatus,
    /// Top-level hierarchy bucket.
    pub hierarchy: HierarchyBucket,
    /// Primitive with both an SD ancestor and an SD descendant.
    pub is_intermediate_primitive: bool,
    /// Has at least one sufficiently defined ancestor.
    pub has_sd_ancestor: bool,
    /// Has at least one sufficiently defined descendant.
    pub has_sd_descendant: bool,
    /// Authoring module at the time.
    pub module_id: SctId,
    /// Has at least one inferred non-hierarchical relationship.
    pub has_attributes: bool,
    /// Id sets per tracked component type, indexed by `ComponentType::tracked_index`.
    components: [ComponentIdSets; 8],
}

impl HistoricDatum {
    /// Create a datum with no recorded components.
    pub fn new(concept_id: SctId, fsn: impl Into<String>, module_id: SctId) -> Self {
        Self {
            concept_id,
            fsn: fsn.into(),
            active: true,
            definition_status: DefinitionStatus::Primitive,
            hierarchy: HierarchyBucket::Unknown,
            is_intermediate_primitive: false,
            has_sd_ancestor: false,
            has_sd_descendant: false,
            module_id,
            has_attributes: false,
            components: Default::default(),
        }
    }

    /// Id sets for a tracked type; `None` for concepts.
    pub fn ids(&self, component_type: ComponentType) -> Option<&ComponentIdSets> {
        component_type.tracked_index().map(|i| &self.components[i])
    }

    /// Replace the id sets for a tracked type. Ignored for concepts.
    pub fn set_ids(&mut self, component_type: ComponentType, sets: ComponentIdSets) {
        if let Some(i) = component_type.tracked_index() {
            self.components[i] = sets;
        }
    }

    /// Record one component's current state.
    pub fn record(&mut self, component: &Component) {
        if let Some(i) = component.component_type.tracked_index() {
            self.components[i].insert(component.id.clone(), component.active);
        }
    }

    /// Whether `component` was active at the previous release.
    ///
    /// For the concept row itself this is the datum's own active flag.
    pub fn existed_active(&self, component_type: ComponentType, id: &ComponentId) -> bool {
        match self.ids(component_type) {
            Some(sets) => sets.active.contains(id),
            None => self.active,
        }
    }

    /// Whether `component` was inactive at the previous release.
    pub fn existed_inactive(&self, component_type: ComponentType, id: &ComponentId) -> bool {
        match self.ids(component_type) {
            Some(sets) => sets.inactive.contains(id),
            None => !self.active,
        }
    }

    /// All tracked id sets in column order.
    pub fn all_ids(&self) -> impl Iterator<Item = (ComponentType, &ComponentIdSets)> {
        ComponentType::TRACKED.into_iter().zip(self.components.iter())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cid(s: &str) -> ComponentId {
        ComponentId::new(s).unwrap()
    }

    #[test]
    fn test_from_parts_rejects_overlap() {
        let active: BTreeSet<_> = [cid("a"), cid("b")].into();
        let inactive: BTreeSet<_> = [cid("b")].into();
        let err = ComponentIdSets::from_parts(active, inactive).unwrap_err();
        assert_eq!(err.id, cid("b"));
    }

    #[test]
    fn test_insert_keeps_sets_disjoint() {
        let mut sets = ComponentIdSets::new();
        sets.insert(cid("a"), false);
        sets.insert(cid("a"), true);
        sets.insert(cid("a"), false);
        assert!(sets.is_disjoint());
        assert!(sets.active().contains(&cid("a")));
        assert!(sets.inactive().is_empty());
    }

    #[test]
    fn test_concept_row_uses_active_flag() {
        let mut datum = HistoricDatum::new(SctId::new(1), "x", SctId::new(2));
        let id = cid("1");
        assert!(datum.existed_active(ComponentType::Concept, &id));
        datum.active = false;
        assert!(datum.existed_inactive(ComponentType::Concept, &id));
    }

    #[test]
    fn test_record_routes_by_type() {
        let mut datum = HistoricDatum::new(SctId::new(1), "x", SctId::new(2));
        let d = Component::description(cid("d1"), SctId::new(1), SctId::new(2), "en", false)
            .with_active(false);
        datum.record(&d);

        assert!(datum.existed_inactive(ComponentType::Description, &cid("d1")));
        assert!(!datum.existed_inactive(ComponentType::TextDefinition, &cid("d1")));
        assert!(datum.ids(ComponentType::Concept).is_none());
    }
}
