//! # Artifact Naming
//!
//! Storage identifiers inside the lineage directory:
//!
//! - `v-<major>.<minor>.<patch>.<ext>`: one immutable file per version
//! - `latest.<ext>`: the alias, overwritten on every publish
//! - `.staging-<uuid>.<ext>.tmp`: in-flight writes, never read

use regex::Regex;
use uuid::Uuid;

use super::semver::Version;

pub const ALIAS_STEM: &str = "latest";
pub const STAGING_PREFIX: &str = ".staging-";

/// Builds and parses the file names of one lineage.
#[derive(Debug, Clone)]
pub struct ArtifactNaming {
    extension: String,
    pattern: Regex,
}

impl ArtifactNaming {
    /// Create naming rules for the given extension (without the dot).
    pub fn new(extension: &str) -> Result<Self, regex::Error> {
        let pattern = Regex::new(&format!(
            r"^v-([0-9]+)\.([0-9]+)\.([0-9]+)\.(?i:{})$",
            regex::escape(extension)
        ))?;

        Ok(Self {
            extension: extension.to_string(),
            pattern,
        })
    }

    pub fn extension(&self) -> &str {
        &self.extension
    }

    /// File name of a versioned artifact
    pub fn versioned_name(&self, version: &Version) -> String {
        format!("v-{}.{}", version, self.extension)
    }

    /// File name of the alias
    pub fn alias_name(&self) -> String {
        format!("{}.{}", ALIAS_STEM, self.extension)
    }

    /// Fresh staging file name; unique per call.
    pub fn staging_name(&self) -> String {
        format!("{}{}.{}.tmp", STAGING_PREFIX, Uuid::new_v4(), self.extension)
    }

    /// Strictly parse a versioned artifact name.
    ///
    /// Anything else in the directory (alias, staging files, unrelated
    /// files, components overflowing `u64`) yields `None`.
    pub fn parse(&self, file_name: &str) -> Option<Version> {
        let caps = self.pattern.captures(file_name)?;
        let component = |i: usize| caps.get(i)?.as_str().parse::<u64>().ok();
        Some(Version::new(component(1)?, component(2)?, component(3)?))
    }
}

/// Identifier without its extension, as returned to upload clients.
pub fn identifier_stem(identifier: &str) -> &str {
    identifier
        .rsplit_once('.')
        .map(|(stem, _)| stem)
        .unwrap_or(identifier)
}
