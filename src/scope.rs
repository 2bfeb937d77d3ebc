//! Module scope filtering.
//!
//! The same predicate judges a concept's current and previous module, so a
//! concept can never be counted as both promoted and moved.

use std::collections::BTreeSet;

use crate::types::SctId;

/// Where a concept stands relative to the module filter across two releases.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScopeTransition {
    /// In scope now; classify normally.
    InScope,
    /// In scope before, out of scope now.
    Promoted,
    /// Out of scope now and not promoted; ignore.
    OutOfScope,
}

/// Module filter predicate.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ModuleScope {
    /// `None` means unrestricted.
    modules: Option<BTreeSet<SctId>>,
}

impl ModuleScope {
    /// Scope accepting every module.
    pub fn unrestricted() -> Self {
        Self::default()
    }

    /// Scope accepting only the listed modules.
    pub fn only(modules: impl IntoIterator<Item = SctId>) -> Self {
        Self {
            modules: Some(modules.into_iter().collect()),
        }
    }

    /// Build from an optional filter list.
    pub fn from_filter(filter: Option<&[SctId]>) -> Self {
        match filter {
            Some(modules) => Self::only(modules.iter().copied()),
            None => Self::unrestricted(),
        }
    }

    /// Whether the scope is restricted at all.
    pub fn is_restricted(&self) -> bool {
        self.modules.is_some()
    }

    /// Whether a module is in scope.
    pub fn in_scope(&self, module_id: SctId) -> bool {
        self.modules
            .as_ref()
            .map_or(true, |modules| modules.contains(&module_id))
    }

    /// Compare the current module against the previous one, if any.
    pub fn transition(&self, current: SctId, previous: Option<SctId>) -> ScopeTransition {
        if self.in_scope(current) {
            ScopeTransition::InScope
        } else if previous.map_or(false, |m| self.in_scope(m)) {
            ScopeTransition::Promoted
        } else {
            ScopeTransition::OutOfScope
        }
    }
}
