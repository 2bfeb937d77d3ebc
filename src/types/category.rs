//! Lifecycle categories assigned by the classifier.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Mutually exclusive lifecycle outcome of one component between releases.
///
/// `NewWithNewConcept`, `NewPrimitive` and `NewFullyDefined` are refinements
/// recorded alongside `New`, never instead of it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LifecycleCategory {
    /// Active now, unknown before.
    New,
    /// Active before and now, modified since the previous release.
    Changed,
    /// Active before, inactive now.
    Inactivated,
    /// Inactive before, active now.
    Reactivated,
    /// Created already inactive.
    NewInactive,
    /// Inactive before and now, modified since the previous release.
    ChangedInactive,
    /// New component whose owning concept is also new.
    NewWithNewConcept,
    /// Concept moved between two in-scope modules.
    MovedModule,
    /// Concept moved out of the analysed module scope.
    Promoted,
    /// New concept, primitive.
    NewPrimitive,
    /// New concept, sufficiently defined.
    NewFullyDefined,
}

impl LifecycleCategory {
    /// All categories in slot order.
    pub const ALL: [LifecycleCategory; 11] = [
        Self::New,
        Self::Changed,
        Self::Inactivated,
        Self::Reactivated,
        Self::NewInactive,
        Self::ChangedInactive,
        Self::NewWithNewConcept,
        Self::MovedModule,
        Self::Promoted,
        Self::NewPrimitive,
        Self::NewFullyDefined,
    ];

    /// Slot index in a count vector.
    pub fn index(&self) -> usize {
        *self as usize
    }

    /// Report column label.
    pub fn label(&self) -> &'static str {
        match self {
            Self::New => "NEW",
            Self::Changed => "CHANGED",
            Self::Inactivated => "INACTIVATED",
            Self::Reactivated => "REACTIVATED",
            Self::NewInactive => "NEW_INACTIVE",
            Self::ChangedInactive => "CHANGED_INACTIVE",
            Self::NewWithNewConcept => "NEW_WITH_NEW_CONCEPT",
            Self::MovedModule => "MOVED_MODULE",
            Self::Promoted => "PROMOTED",
            Self::NewPrimitive => "NEW_PRIMITIVE",
            Self::NewFullyDefined => "NEW_FULLY_DEFINED",
        }
    }
}

impl fmt::Display for LifecycleCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_indices_follow_declaration_order() {
        for (i, category) in LifecycleCategory::ALL.iter().enumerate() {
            assert_eq!(category.index(), i);
        }
    }
}
