//! Run configuration for a lifecycle diff.
//!
//! ## Example
//!
//! ```json
//! {
//!   "previous_effective_time": "20240101",
//!   "module_filter": [999000011000000103],
//!   "refsets": [
//!     { "refset_id": 900000000000509007, "name": "US English", "kind": "language" }
//!   ]
//! }
//! ```

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::canonical::canonical_hash_hex;
use crate::scope::ModuleScope;
use crate::types::{ComponentType, EffectiveTime, SctId};

/// Error type for configuration loading.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// JSON could not be parsed (including malformed effective times).
    #[error("invalid configuration: {0}")]
    Parse(#[from] serde_json::Error),
    /// A module filter was given but lists no modules.
    #[error("module_filter is present but empty; omit it for an unrestricted run")]
    EmptyModuleFilter,
    /// The same refset was tagged twice.
    #[error("refset {0} is tagged more than once")]
    DuplicateRefset(SctId),
}

/// Natural grouping of a reference set in summary subtotals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RefsetKind {
    /// Historical association refsets.
    Association,
    /// Language refsets.
    Language,
    /// Inactivation indicator refsets.
    Indicator,
    /// Anything else.
    Other,
}

impl RefsetKind {
    /// Default grouping for an untagged refset, inferred from its member type.
    pub fn for_member_type(component_type: ComponentType) -> Self {
        match component_type {
            ComponentType::HistoricalAssociation => Self::Association,
            ComponentType::LangRefsetEntry => Self::Language,
            ComponentType::InactivationIndicator => Self::Indicator,
            _ => Self::Other,
        }
    }
}

impl fmt::Display for RefsetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Association => write!(f, "association"),
            Self::Language => write!(f, "language"),
            Self::Indicator => write!(f, "indicator"),
            Self::Other => write!(f, "other"),
        }
    }
}

/// Explicit grouping assigned to a refset id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefsetTag {
    /// Reference set concept id.
    pub refset_id: SctId,
    /// Display name, carried into reports.
    pub name: String,
    /// Grouping used for subtotals.
    pub kind: RefsetKind,
}

/// Configuration of one lifecycle diff run.
///
/// Unknown keys are rejected. The integrity census is not configurable and
/// always runs at the end of a pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DiffConfig {
    /// Effective time of the previous release; later dates count as changed.
    pub previous_effective_time: EffectiveTime,
    /// Modules in scope; absent means unrestricted.
    #[serde(default)]
    pub module_filter: Option<Vec<SctId>>,
    /// Explicit refset groupings.
    #[serde(default)]
    pub refsets: Vec<RefsetTag>,
}

impl DiffConfig {
    /// Create an unrestricted configuration.
    pub fn new(previous_effective_time: EffectiveTime) -> Self {
        Self {
            previous_effective_time,
            module_filter: None,
            refsets: Vec::new(),
        }
    }

    /// Restrict the run to the given modules.
    pub fn with_module_filter(mut self, modules: impl IntoIterator<Item = SctId>) -> Self {
        self.module_filter = Some(modules.into_iter().collect());
        self
    }

    /// Tag a refset with an explicit grouping.
    pub fn with_refset(
        mut self,
        refset_id: SctId,
        name: impl Into<String>,
        kind: RefsetKind,
    ) -> Self {
        self.refsets.push(RefsetTag {
            refset_id,
            name: name.into(),
            kind,
        });
        self
    }

    /// Parse and validate a JSON configuration.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Check cross-field constraints.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.module_filter.as_ref().map_or(false, Vec::is_empty) {
            return Err(ConfigError::EmptyModuleFilter);
        }
        let mut seen = std::collections::BTreeSet::new();
        for tag in &self.refsets {
            if !seen.insert(tag.refset_id) {
                return Err(ConfigError::DuplicateRefset(tag.refset_id));
            }
        }
        Ok(())
    }

    /// Module scope built from the filter.
    pub fn module_scope(&self) -> ModuleScope {
        ModuleScope::from_filter(self.module_filter.as_deref())
    }

    /// Explicit refset groupings by id.
    pub fn refset_kinds(&self) -> BTreeMap<SctId, RefsetKind> {
        self.refsets.iter().map(|t| (t.refset_id, t.kind)).collect()
    }

    /// Stable fingerprint of this configuration.
    pub fn fingerprint(&self) -> String {
        canonical_hash_hex(self)
    }
}
