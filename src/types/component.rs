//! Component types: the units of change tracking attached to a concept.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::id::{ComponentId, SctId};
use super::time::EffectiveTime;

/// `116680003 |Is a (attribute)|`.
pub const IS_A: SctId = SctId::new(116680003);

/// Error raised for a component type name that is not recognised.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown component type {0:?}")]
pub struct UnknownComponentType(pub String);

/// Kind of component being tracked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ComponentType {
    /// The concept row itself.
    Concept,
    /// FSN or synonym.
    Description,
    /// Text definition.
    TextDefinition,
    /// Relationship to another concept.
    Relationship,
    /// Relationship with a concrete value.
    ConcreteRelationship,
    /// OWL axiom.
    Axiom,
    /// Language reference set member.
    LangRefsetEntry,
    /// Inactivation indicator reference set member.
    InactivationIndicator,
    /// Historical association reference set member.
    HistoricalAssociation,
}

impl ComponentType {
    /// Sub-component types recorded in a historic snapshot, in column order.
    pub const TRACKED: [ComponentType; 8] = [
        Self::Description,
        Self::TextDefinition,
        Self::Relationship,
        Self::ConcreteRelationship,
        Self::Axiom,
        Self::LangRefsetEntry,
        Self::InactivationIndicator,
        Self::HistoricalAssociation,
    ];

    /// Position of this type in [`Self::TRACKED`], `None` for concepts.
    pub fn tracked_index(&self) -> Option<usize> {
        Self::TRACKED.iter().position(|t| t == self)
    }

    /// Whether components of this type are reference set members.
    pub fn is_refset_member(&self) -> bool {
        matches!(
            self,
            Self::LangRefsetEntry | Self::InactivationIndicator | Self::HistoricalAssociation
        )
    }

    /// Whether components of this type are descriptions of any kind.
    pub fn is_description(&self) -> bool {
        matches!(self, Self::Description | Self::TextDefinition)
    }

    /// Screaming snake case name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Concept => "CONCEPT",
            Self::Description => "DESCRIPTION",
            Self::TextDefinition => "TEXT_DEFINITION",
            Self::Relationship => "RELATIONSHIP",
            Self::ConcreteRelationship => "CONCRETE_RELATIONSHIP",
            Self::Axiom => "AXIOM",
            Self::LangRefsetEntry => "LANG_REFSET_ENTRY",
            Self::InactivationIndicator => "INACTIVATION_INDICATOR",
            Self::HistoricalAssociation => "HISTORICAL_ASSOCIATION",
        }
    }
}

impl fmt::Display for ComponentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ComponentType {
    type Err = UnknownComponentType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "CONCEPT" => Ok(Self::Concept),
            "DESCRIPTION" => Ok(Self::Description),
            "TEXT_DEFINITION" => Ok(Self::TextDefinition),
            "RELATIONSHIP" => Ok(Self::Relationship),
            "CONCRETE_RELATIONSHIP" => Ok(Self::ConcreteRelationship),
            "AXIOM" => Ok(Self::Axiom),
            "LANG_REFSET_ENTRY" => Ok(Self::LangRefsetEntry),
            "INACTIVATION_INDICATOR" => Ok(Self::InactivationIndicator),
            "HISTORICAL_ASSOCIATION" => Ok(Self::HistoricalAssociation),
            _ => Err(UnknownComponentType(s.to_string())),
        }
    }
}

/// Characteristic view of the concept graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CharacteristicView {
    /// Classifier output.
    Inferred,
    /// Author-asserted modelling.
    Stated,
}

impl CharacteristicView {
    /// Both views, inferred first.
    pub const ALL: [CharacteristicView; 2] = [Self::Inferred, Self::Stated];
}

impl Default for CharacteristicView {
    fn default() -> Self {
        Self::Inferred
    }
}

impl fmt::Display for CharacteristicView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Inferred => write!(f, "inferred"),
            Self::Stated => write!(f, "stated"),
        }
    }
}

/// Type-specific payload of a component.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ComponentDetail {
    /// No extra data (concepts, axioms).
    None,
    /// Description or text definition.
    Description {
        /// Declared language code, e.g. `en`.
        language_code: String,
    },
    /// Relationship or concrete relationship.
    Relationship {
        /// Attribute type.
        type_id: SctId,
        /// Target concept; `None` for concrete values.
        destination: Option<SctId>,
        /// View the relationship belongs to.
        view: CharacteristicView,
    },
    /// Reference set member.
    RefsetMember {
        /// Reference set the member belongs to.
        refset_id: SctId,
        /// Value or target component (inactivation value, association target).
        target: Option<SctId>,
    },
}

/// A component attached to a concept.
///
/// Immutable for the duration of one analysis pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Component {
    /// Component identifier.
    pub id: ComponentId,
    /// Concept that owns this component.
    pub owner: SctId,
    /// Kind of component.
    pub component_type: ComponentType,
    /// Authoring module.
    pub module_id: SctId,
    /// Whether the component is active.
    pub active: bool,
    /// Publication date; `None` when unreleased.
    pub effective_time: Option<EffectiveTime>,
    /// Type-specific payload.
    pub detail: ComponentDetail,
}

impl Component {
    /// Create an active, unreleased component with no detail.
    pub fn new(
        id: ComponentId,
        owner: SctId,
        component_type: ComponentType,
        module_id: SctId,
    ) -> Self {
        Self {
            id,
            owner,
            component_type,
            module_id,
            active: true,
            effective_time: None,
            detail: ComponentDetail::None,
        }
    }

    /// Create a description (or text definition).
    pub fn description(
        id: ComponentId,
        owner: SctId,
        module_id: SctId,
        language_code: impl Into<String>,
        text_definition: bool,
    ) -> Self {
        let component_type = if text_definition {
            ComponentType::TextDefinition
        } else {
            ComponentType::Description
        };
        Self::new(id, owner, component_type, module_id).with_detail(ComponentDetail::Description {
            language_code: language_code.into(),
        })
    }

    /// Create a relationship to `destination`.
    pub fn relationship(
        id: ComponentId,
        owner: SctId,
        module_id: SctId,
        type_id: SctId,
        destination: SctId,
        view: CharacteristicView,
    ) -> Self {
        Self::new(id, owner, ComponentType::Relationship, module_id).with_detail(
            ComponentDetail::Relationship {
                type_id,
                destination: Some(destination),
                view,
            },
        )
    }

    /// Create an IS-A relationship to `parent`.
    pub fn is_a(
        id: ComponentId,
        owner: SctId,
        module_id: SctId,
        parent: SctId,
        view: CharacteristicView,
    ) -> Self {
        Self::relationship(id, owner, module_id, IS_A, parent, view)
    }

    /// Create a reference set member of the given member type.
    pub fn refset_member(
        id: ComponentId,
        owner: SctId,
        component_type: ComponentType,
        module_id: SctId,
        refset_id: SctId,
        target: Option<SctId>,
    ) -> Self {
        Self::new(id, owner, component_type, module_id)
            .with_detail(ComponentDetail::RefsetMember { refset_id, target })
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

    /// Set the detail payload.
    pub fn with_detail(mut self, detail: ComponentDetail) -> Self {
        self.detail = detail;
        self
    }

    /// Declared language code, for descriptions.
    pub fn language_code(&self) -> Option<&str> {
        match &self.detail {
            ComponentDetail::Description { language_code } => Some(language_code),
            _ => None,
        }
    }

    /// Reference set id, for refset members.
    pub fn refset_id(&self) -> Option<SctId> {
        match &self.detail {
            ComponentDetail::RefsetMember { refset_id, .. } => Some(*refset_id),
            _ => None,
        }
    }

    /// Value or target id, for refset members.
    pub fn target(&self) -> Option<SctId> {
        match &self.detail {
            ComponentDetail::RefsetMember { target, .. } => *target,
            _ => None,
        }
    }

    /// Parent concept if this is an active IS-A relationship in `view`.
    pub fn is_a_parent(&self, view: CharacteristicView) -> Option<SctId> {
        match &self.detail {
            ComponentDetail::Relationship {
                type_id,
                destination: Some(destination),
                view: v,
            } if self.active && *type_id == IS_A && *v == view => Some(*destination),
            _ => None,
        }
    }

    /// Whether this is an active inferred non-hierarchical attribute.
    pub fn is_inferred_attribute(&self) -> bool {
        match &self.detail {
            ComponentDetail::Relationship { type_id, view, .. } => {
                self.active && *type_id != IS_A && *view == CharacteristicView::Inferred
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cid(s: &str) -> ComponentId {
        ComponentId::new(s).unwrap()
    }

    #[test]
    fn test_tracked_index() {
        assert_eq!(ComponentType::Concept.tracked_index(), None);
        assert_eq!(ComponentType::Description.tracked_index(), Some(0));
        assert_eq!(ComponentType::HistoricalAssociation.tracked_index(), Some(7));
    }

    #[test]
    fn test_component_type_names_round_trip() {
        for t in ComponentType::TRACKED.into_iter().chain([ComponentType::Concept]) {
            assert_eq!(t.as_str().parse::<ComponentType>(), Ok(t));
            assert_eq!(t.to_string(), t.as_str());
        }
        assert_eq!(
            "BOGUS".parse::<ComponentType>(),
            Err(UnknownComponentType("BOGUS".to_string()))
        );
    }

    #[test]
    fn test_is_a_parent_respects_view_and_activity() {
        let owner = SctId::new(10);
        let module = SctId::new(1);
        let parent = SctId::new(20);

        let inferred =
            Component::is_a(cid("1"), owner, module, parent, CharacteristicView::Inferred);
        assert_eq!(inferred.is_a_parent(CharacteristicView::Inferred), Some(parent));
        assert_eq!(inferred.is_a_parent(CharacteristicView::Stated), None);

        let inactive = inferred.clone().with_active(false);
        assert_eq!(inactive.is_a_parent(CharacteristicView::Inferred), None);
        assert!(!inferred.is_inferred_attribute());
    }

    #[test]
    fn test_attribute_detection() {
        let rel = Component::relationship(
            cid("2"),
            SctId::new(10),
            SctId::new(1),
            SctId::new(363698007),
            SctId::new(30),
            CharacteristicView::Inferred,
        );
        assert!(rel.is_inferred_attribute());
        assert!(!rel.clone().with_active(false).is_inferred_attribute());
    }
}
