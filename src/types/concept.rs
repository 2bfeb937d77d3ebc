//! Concept types for the live graph.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::component::{CharacteristicView, Component, ComponentType};
use super::id::SctId;
use super::time::EffectiveTime;

/// `138875005 |SNOMED CT Concept (SNOMED RT+CTV3)|`.
pub const ROOT_CONCEPT: SctId = SctId::new(138875005);

/// Definition status of a concept.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DefinitionStatus {
    /// Necessary conditions only.
    Primitive,
    /// Sufficiently defined.
    FullyDefined,
}

impl DefinitionStatus {
    /// Short release-file code (`P` / `SD`).
    pub fn code(&self) -> &'static str {
        match self {
            Self::Primitive => "P",
            Self::FullyDefined => "SD",
        }
    }

    /// Parse from the short release-file code.
    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "P" => Some(Self::Primitive),
            "SD" => Some(Self::FullyDefined),
            _ => None,
        }
    }

    /// Whether the status is sufficiently defined.
    pub fn is_fully_defined(&self) -> bool {
        matches!(self, Self::FullyDefined)
    }
}

impl Default for DefinitionStatus {
    fn default() -> Self {
        Self::Primitive
    }
}

impl fmt::Display for DefinitionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// A concept in the current graph with all of its components.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Concept {
    /// Concept identifier.
    pub id: SctId,
    /// Fully specified name.
    pub fsn: String,
    /// Whether the concept is active.
    pub active: bool,
    /// Publication date of the concept row; `None` when unreleased.
    pub effective_time: Option<EffectiveTime>,
    /// Authoring module.
    pub module_id: SctId,
    /// Current definition status.
    pub definition_status: DefinitionStatus,
    /// Owned components.
    pub components: Vec<Component>,
}

impl Concept {
    /// Create an active, unreleased, primitive concept.
    pub fn new(id: SctId, fsn: impl Into<String>, module_id: SctId) -> Self {
        Self {
            id,
            fsn: fsn.into(),
            active: true,
            effective_time: None,
            module_id,
            definition_status: DefinitionStatus::Primitive,
            components: Vec::new(),
        }
    }

    /// Set the active flag.
    pub fn with_active(mut self, active: bool) -> Self {
        self.active = active;
        self
    }

    /// Set the effective time.
    pub fn with_effective_time(mut self, effective_time: Option<EffectiveTime>) -> Self {
        self.effective_time = effective_time;
        self
    }

    /// Set the definition status.
    pub fn with_definition_status(mut self, status: DefinitionStatus) -> Self {
        self.definition_status = status;
        self
    }

    /// Attach a component. The component's owner is set to this concept.
    pub fn with_component(mut self, mut component: Component) -> Self {
        component.owner = self.id;
        self.components.push(component);
        self
    }

    /// Components of a given type.
    pub fn components_of(&self, component_type: ComponentType) -> impl Iterator<Item = &Component> {
        self.components
            .iter()
            .filter(move |c| c.component_type == component_type)
    }

    /// Active IS-A parents in a characteristic view (deduplicated, ordered).
    pub fn parents(&self, view: CharacteristicView) -> Vec<SctId> {
        let mut parents: Vec<SctId> = self
            .components
            .iter()
            .filter_map(|c| c.is_a_parent(view))
            .collect();
        parents.sort();
        parents.dedup();
        parents
    }

    /// Whether the concept has at least one inferred non-hierarchical attribute.
    pub fn has_attributes(&self) -> bool {
        self.components.iter().any(Component::is_inferred_attribute)
    }

    /// Whether the concept is sufficiently defined.
    pub fn is_fully_defined(&self) -> bool {
        self.definition_status.is_fully_defined()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ComponentId;

    #[test]
    fn test_definition_status_codes() {
        assert_eq!(DefinitionStatus::from_code("SD"), Some(DefinitionStatus::FullyDefined));
        assert_eq!(DefinitionStatus::from_code("P"), Some(DefinitionStatus::Primitive));
        assert_eq!(DefinitionStatus::from_code("900000000000074008"), None);
    }

    #[test]
    fn test_with_component_sets_owner_and_parents() {
        let module = SctId::new(1);
        let concept = Concept::new(SctId::new(10), "Child (disorder)", module)
            .with_component(Component::is_a(
                ComponentId::new("r2").unwrap(),
                SctId::new(999),
                module,
                SctId::new(30),
                CharacteristicView::Inferred,
            ))
            .with_component(Component::is_a(
                ComponentId::new("r1").unwrap(),
                SctId::new(999),
                module,
                SctId::new(20),
                CharacteristicView::Inferred,
            ));

        assert!(concept.components.iter().all(|c| c.owner == concept.id));
        assert_eq!(
            concept.parents(CharacteristicView::Inferred),
            vec![SctId::new(20), SctId::new(30)]
        );
        assert!(concept.parents(CharacteristicView::Stated).is_empty());
        assert!(!concept.has_attributes());
    }
}
