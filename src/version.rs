//! Schema version tags
//!
//! Webhook payloads carry their schema generation as a short dotted string
//! in `meta.version` (`"1.0"`, `"2.0"`). The raw string is the registry key;
//! ordering pads missing components with zeros and compares as semver.

use regex::Regex;
use semver::Version;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

use crate::error::SchemaError;

fn version_pattern() -> &'static Result<Regex, regex::Error> {
    static PATTERN: OnceLock<Result<Regex, regex::Error>> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^\d+(\.\d+){0,2}$"))
}

/// A validated version string, e.g. `"2.0"`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct VersionTag {
    raw: String,
    semver: Version,
}

impl VersionTag {
    pub fn parse(raw: &str) -> Result<Self, SchemaError> {
        let pattern = version_pattern()
            .as_ref()
            .map_err(|e| SchemaError::InvalidVersion(format!("{}: {}", raw, e)))?;
        if !pattern.is_match(raw) {
            return Err(SchemaError::InvalidVersion(raw.to_string()));
        }
        let mut parts = raw
            .split('.')
            .map(|p| p.parse::<u64>().map_err(|_| SchemaError::InvalidVersion(raw.to_string())));
        let major = parts.next().transpose()?.unwrap_or(0);
        let minor = parts.next().transpose()?.unwrap_or(0);
        let patch = parts.next().transpose()?.unwrap_or(0);
        Ok(Self {
            raw: raw.to_string(),
            semver: Version::new(major, minor, patch),
        })
    }

    /// The string exactly as it appears on the wire
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Zero-padded semver form used for ordering
    pub fn semver(&self) -> &Version {
        &self.semver
    }

    pub fn major(&self) -> u64 {
        self.semver.major
    }
}

impl fmt::Display for VersionTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

impl FromStr for VersionTag {
    type Err = SchemaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for VersionTag {
    type Error = SchemaError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<VersionTag> for String {
    fn from(tag: VersionTag) -> Self {
        tag.raw
    }
}

// Equality is on the raw string: "2" and "2.0" are distinct registrations.
impl PartialEq for VersionTag {
    fn eq(&self, other: &Self) -> bool {
        self.raw == other.raw
    }
}

impl Eq for VersionTag {}

impl std::hash::Hash for VersionTag {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.raw.hash(state);
    }
}

impl PartialOrd for VersionTag {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for VersionTag {
    fn cmp(&self, other: &Self) -> Ordering {
        self.semver
            .cmp(&other.semver)
            .then_with(|| self.raw.len().cmp(&other.raw.len()))
            .then_with(|| self.raw.cmp(&other.raw))
    }
}
