//! # Version Index
//!
//! The directory is the source of truth: every call rescans it. There is
//! no cached registry to drift out of sync with the files.

use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

use crate::observability::Event;
use crate::store::errors::{StoreError, StoreResult};

use super::naming::ArtifactNaming;
use super::policy::BumpPolicy;
use super::semver::Version;

/// Discovers published versions in one storage directory.
#[derive(Debug, Clone)]
pub struct VersionIndex {
    dir: PathBuf,
    naming: ArtifactNaming,
}

impl VersionIndex {
    pub fn new(dir: impl Into<PathBuf>, naming: ArtifactNaming) -> Self {
        Self {
            dir: dir.into(),
            naming,
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn naming(&self) -> &ArtifactNaming {
        &self.naming
    }

    /// All versions currently published.
    ///
    /// Only regular files whose names parse are counted. An unreadable or
    /// missing directory is an empty lineage, not an error.
    pub fn list_versions(&self) -> BTreeSet<Version> {
        let entries = match fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) => {
                tracing::warn!(
                    event = Event::IndexUnreadable.as_str(),
                    dir = %self.dir.display(),
                    error = %e,
                    "treating storage directory as empty"
                );
                return BTreeSet::new();
            }
        };

        entries
            .filter_map(Result::ok)
            .filter(|entry| entry.file_type().map(|t| t.is_file()).unwrap_or(false))
            .filter_map(|entry| entry.file_name().to_str().and_then(|n| self.naming.parse(n)))
            .collect()
    }

    /// Greatest version in the set.
    pub fn max(versions: &BTreeSet<Version>) -> StoreResult<Version> {
        versions.last().copied().ok_or(StoreError::EmptyIndex)
    }

    /// Version the next publish should take, `None` under `FixedAlias`.
    ///
    /// This is a read-then-decide step. Callers that go on to write must
    /// hold the directory lock across this call and the write.
    pub fn next_version(&self, policy: BumpPolicy) -> StoreResult<Option<Version>> {
        if !policy.is_versioned() {
            return Ok(None);
        }
        let current = Self::max(&self.list_versions()).ok();
        policy.next(current)
    }
}
