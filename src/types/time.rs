//! Release effective times.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Format of an effective time in release files.
const EFFECTIVE_TIME_FORMAT: &str = "%Y%m%d";

/// Error raised for a malformed effective time.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid effective time {value:?}: expected an 8 digit YYYYMMDD date")]
pub struct EffectiveTimeError {
    /// The rejected input.
    pub value: String,
}

/// Date a component's current state was published.
///
/// Always exactly eight ASCII digits forming a valid calendar date, so
/// string order and date order agree. Unreleased components carry no
/// effective time at all (`Option<EffectiveTime>::None`).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct EffectiveTime(String);

impl EffectiveTime {
    /// Parse and validate an effective time.
    pub fn parse(value: &str) -> Result<Self, EffectiveTimeError> {
        let well_formed = value.len() == 8 && value.bytes().all(|b| b.is_ascii_digit());
        if !well_formed || NaiveDate::parse_from_str(value, EFFECTIVE_TIME_FORMAT).is_err() {
            return Err(EffectiveTimeError {
                value: value.to_string(),
            });
        }
        Ok(Self(value.to_string()))
    }

    /// Parse an optional effective time where the empty string means unreleased.
    pub fn parse_optional(value: &str) -> Result<Option<Self>, EffectiveTimeError> {
        if value.is_empty() {
            Ok(None)
        } else {
            Self::parse(value).map(Some)
        }
    }

    /// Get the effective time as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Whether a component state published at `effective_time` postdates `since`.
///
/// Unreleased components always count as changed.
pub fn changed_since(effective_time: Option<&EffectiveTime>, since: &EffectiveTime) -> bool {
    match effective_time {
        None => true,
        Some(et) => et > since,
    }
}

impl fmt::Display for EffectiveTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for EffectiveTime {
    type Err = EffectiveTimeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for EffectiveTime {
    type Error = EffectiveTimeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<EffectiveTime> for String {
    fn from(et: EffectiveTime) -> Self {
        et.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_malformed() {
        assert!(EffectiveTime::parse("2024011").is_err());
        assert!(EffectiveTime::parse("2024-01-31").is_err());
        assert!(EffectiveTime::parse("20240230").is_err());
        assert!(EffectiveTime::parse("+2024013").is_err());
        assert!(EffectiveTime::parse("20240131").is_ok());
    }

    #[test]
    fn test_string_order_matches_date_order() {
        let a = EffectiveTime::parse("19991231").unwrap();
        let b = EffectiveTime::parse("20000101").unwrap();
        assert!(a < b);
        let da = NaiveDate::parse_from_str(a.as_str(), EFFECTIVE_TIME_FORMAT).unwrap();
        let db = NaiveDate::parse_from_str(b.as_str(), EFFECTIVE_TIME_FORMAT).unwrap();
        assert!(da < db);
    }

    #[test]
    fn test_changed_since() {
        let release = EffectiveTime::parse("20240101").unwrap();
        let older = EffectiveTime::parse("20230731").unwrap();
        let newer = EffectiveTime::parse("20240301").unwrap();

        assert!(changed_since(None, &release));
        assert!(!changed_since(Some(&older), &release));
        assert!(!changed_since(Some(&release), &release));
        assert!(changed_since(Some(&newer), &release));
    }

    #[test]
    fn test_parse_optional() {
        assert_eq!(EffectiveTime::parse_optional("").unwrap(), None);
        assert!(EffectiveTime::parse_optional("20240101").unwrap().is_some());
    }
}
