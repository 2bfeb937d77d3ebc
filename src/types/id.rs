//! Identifier types for concepts and components.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Identifier of a concept, module or reference set.
///
/// Wraps the numeric SCTID and implements `Ord` for deterministic ordering.
/// `0` is never issued as an SCTID and is reserved as a sentinel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SctId(u64);

impl SctId {
    /// Create a new SctId from its numeric value.
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    /// Get the numeric value.
    pub const fn value(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for SctId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for SctId {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

impl FromStr for SctId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(s.parse()?))
    }
}

/// Error raised when a string cannot be used as a [`ComponentId`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ComponentIdError {
    /// Identifier was empty.
    #[error("component id is empty")]
    Empty,
    /// Identifier contains a character reserved by the snapshot format.
    #[error("component id {0:?} contains a reserved character")]
    ReservedCharacter(String),
}

/// Identifier of a sub-component of a concept.
///
/// Descriptions and relationships carry SCTIDs, axioms and refset members
/// carry UUIDs, so the id is kept opaque. The snapshot format nests id lists
/// inside tab-delimited columns, which is why tab, newline and comma are
/// rejected at construction.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ComponentId(String);

impl ComponentId {
    /// Characters that may never appear in a component id.
    pub const RESERVED: [char; 4] = ['\t', '\n', '\r', ','];

    /// Create a component id, validating it against the reserved characters.
    pub fn new(id: impl Into<String>) -> Result<Self, ComponentIdError> {
        let id = id.into();
        if id.is_empty() {
            return Err(ComponentIdError::Empty);
        }
        if id.contains(&Self::RESERVED[..]) {
            return Err(ComponentIdError::ReservedCharacter(id));
        }
        Ok(Self(id))
    }

    /// Get the id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ComponentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<SctId> for ComponentId {
    fn from(id: SctId) -> Self {
        Self(id.to_string())
    }
}

impl TryFrom<String> for ComponentId {
    type Error = ComponentIdError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<ComponentId> for String {
    fn from(id: ComponentId) -> Self {
        id.0
    }
}

impl FromStr for ComponentId {
    type Err = ComponentIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sctid_ordering() {
        assert!(SctId::new(1) < SctId::new(2));
        assert_eq!("404684003".parse::<SctId>().unwrap(), SctId::new(404684003));
        assert!("40468x003".parse::<SctId>().is_err());
    }

    #[test]
    fn test_component_id_rejects_reserved() {
        assert_eq!(ComponentId::new(""), Err(ComponentIdError::Empty));
        assert!(ComponentId::new("a,b").is_err());
        assert!(ComponentId::new("a\tb").is_err());
        assert!(ComponentId::new("6c4d1f4e-0f2e-4a9b-9d55-1f6b3c6a2a10").is_ok());
    }

    #[test]
    fn test_component_id_from_sctid() {
        let id: ComponentId = SctId::new(12345).into();
        assert_eq!(id.as_str(), "12345");
    }
}
