//! # Bump Policies

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::store::errors::{StoreError, StoreResult};

use super::semver::Version;

/// How the next version is derived from the current maximum.
///
/// One policy per storage directory. The store records it on first open
/// and refuses to reopen the directory under another one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BumpPolicy {
    /// `1.0.0`, then keep major/minor and increment patch
    #[default]
    Patch,
    /// `1.0.0`, then increment major and reset minor/patch
    Major,
    /// No history: every publish overwrites the alias only
    FixedAlias,
}

impl BumpPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            BumpPolicy::Patch => "patch",
            BumpPolicy::Major => "major",
            BumpPolicy::FixedAlias => "fixed_alias",
        }
    }

    /// Whether publishes under this policy produce versioned files.
    pub fn is_versioned(&self) -> bool {
        !matches!(self, BumpPolicy::FixedAlias)
    }

    /// Next version given the current maximum, `None` when versioning is off.
    ///
    /// Fails with `PublishFailed` when the bumped component would overflow;
    /// the lineage never wraps back below its maximum.
    pub fn next(&self, current_max: Option<Version>) -> StoreResult<Option<Version>> {
        let next = match (self, current_max) {
            (BumpPolicy::FixedAlias, _) => return Ok(None),
            (_, None) => Some(Version::INITIAL),
            (BumpPolicy::Patch, Some(max)) => max.bump_patch(),
            (BumpPolicy::Major, Some(max)) => max.bump_major(),
        };

        match next {
            Some(version) => Ok(Some(version)),
            None => Err(StoreError::PublishFailed(format!(
                "version {} has no successor under the {} policy",
                current_max.unwrap_or(Version::INITIAL),
                self
            ))),
        }
    }
}

impl fmt::Display for BumpPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BumpPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "patch" => Ok(BumpPolicy::Patch),
            "major" => Ok(BumpPolicy::Major),
            "fixed_alias" => Ok(BumpPolicy::FixedAlias),
            other => Err(format!(
                "Invalid bump_policy: '{}'. Must be 'patch', 'major' or 'fixed_alias'.",
                other
            )),
        }
    }
}
