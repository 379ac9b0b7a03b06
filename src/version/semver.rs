//! # Version Triple
//!
//! `major.minor.patch` with component-wise ordering.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// A published artifact version.
///
/// Field order matters: the derived `Ord` compares major, then minor,
/// then patch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Version {
    pub major: u64,
    pub minor: u64,
    pub patch: u64,
}

impl Version {
    /// First version assigned to an empty lineage.
    pub const INITIAL: Version = Version::new(1, 0, 0);

    pub const fn new(major: u64, minor: u64, patch: u64) -> Self {
        Self { major, minor, patch }
    }

    /// Same major/minor, patch + 1. `None` once patch is `u64::MAX`.
    pub fn bump_patch(&self) -> Option<Self> {
        let patch = self.patch.checked_add(1)?;
        Some(Self::new(self.major, self.minor, patch))
    }

    /// Next major, minor and patch reset. `None` once major is `u64::MAX`.
    pub fn bump_major(&self) -> Option<Self> {
        let major = self.major.checked_add(1)?;
        Some(Self::new(major, 0, 0))
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

/// Error returned when a string is not a `major.minor.patch` triple.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Invalid version: {0}")]
pub struct ParseVersionError(pub String);

impl FromStr for Version {
    type Err = ParseVersionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ParseVersionError(s.to_string());

        let mut parts = s.split('.');
        let mut next = || -> Result<u64, ParseVersionError> {
            let part = parts.next().ok_or_else(invalid)?;
            // u64::from_str accepts a leading '+', digits only here
            if part.is_empty() || !part.bytes().all(|b| b.is_ascii_digit()) {
                return Err(invalid());
            }
            part.parse().map_err(|_| invalid())
        };

        let version = Version::new(next()?, next()?, next()?);
        if parts.next().is_some() {
            return Err(invalid());
        }
        Ok(version)
    }
}

impl TryFrom<String> for Version {
    type Error = ParseVersionError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Version> for String {
    fn from(version: Version) -> Self {
        version.to_string()
    }
}

/// What a reader asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VersionSelector {
    /// Whatever the alias currently holds
    Latest,
    /// One specific published version
    Exact(Version),
}

impl VersionSelector {
    /// Parse a selector as it appears in a URL path segment.
    ///
    /// Accepts `latest`, `latest.<ext>`, `M.m.p` and `v-M.m.p.<ext>`.
    /// The extension is compared case-insensitively.
    pub fn parse(s: &str, extension: &str) -> Option<Self> {
        let stem = strip_extension(s, extension).unwrap_or(s);

        if stem == "latest" {
            return Some(VersionSelector::Latest);
        }

        let raw = stem.strip_prefix("v-").unwrap_or(stem);
        raw.parse().ok().map(VersionSelector::Exact)
    }
}

fn strip_extension<'a>(s: &'a str, extension: &str) -> Option<&'a str> {
    let split = s.len().checked_sub(extension.len() + 1)?;
    if !s.is_char_boundary(split) {
        return None;
    }
    let (stem, suffix) = s.split_at(split);
    let suffix = suffix.strip_prefix('.')?;
    suffix.eq_ignore_ascii_case(extension).then_some(stem)
}

impl fmt::Display for VersionSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VersionSelector::Latest => write!(f, "latest"),
            VersionSelector::Exact(v) => write!(f, "{}", v),
        }
    }
}
