//! # Policy Marker
//!
//! Mixing bump policies on one directory gives an ill-defined version
//! order. The first open records the policy in `.docvault-policy`; later
//! opens with a different policy fail.

use std::fs;

use crate::version::{BumpPolicy, VersionIndex};

use super::errors::{StoreError, StoreResult};
use super::staging;

pub const MARKER_NAME: &str = ".docvault-policy";

/// Check the directory's recorded policy against `policy`, recording it
/// when absent. Callers hold the directory lock.
pub fn ensure_policy(index: &VersionIndex, policy: BumpPolicy) -> StoreResult<()> {
    let dir = index.dir();
    let marker = dir.join(MARKER_NAME);

    match fs::read_to_string(&marker) {
        Ok(recorded) => {
            let recorded: BumpPolicy = recorded.parse().map_err(|e| {
                StoreError::ConfigurationError(format!("{}: {}", marker.display(), e))
            })?;
            if recorded != policy {
                return Err(StoreError::ConfigurationError(format!(
                    "{} was created with bump_policy '{}', configured '{}'",
                    dir.display(),
                    recorded,
                    policy
                )));
            }
            Ok(())
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            if !policy.is_versioned() && !index.list_versions().is_empty() {
                return Err(StoreError::ConfigurationError(format!(
                    "{} already holds versioned artifacts; bump_policy '{}' would stop extending them",
                    dir.display(),
                    policy
                )));
            }
            record(index, policy)
        }
        Err(e) => Err(StoreError::ConfigurationError(format!(
            "{}: {}",
            marker.display(),
            e
        ))),
    }
}

fn record(index: &VersionIndex, policy: BumpPolicy) -> StoreResult<()> {
    let dir = index.dir();
    let staging_name = index.naming().staging_name();
    let staged = staging::stage(dir, &staging_name, policy.as_str().as_bytes())?;
    staged.publish(&dir.join(MARKER_NAME))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::version::ArtifactNaming;
    use tempfile::TempDir;

    fn index_in(temp: &TempDir) -> VersionIndex {
        VersionIndex::new(temp.path(), ArtifactNaming::new("pdf").unwrap())
    }

    #[test]
    fn test_first_open_records_policy() {
        let temp = TempDir::new().unwrap();
        ensure_policy(&index_in(&temp), BumpPolicy::Major).unwrap();

        let recorded = fs::read_to_string(temp.path().join(MARKER_NAME)).unwrap();
        assert_eq!(recorded, "major");
    }

    #[test]
    fn test_same_policy_reopens() {
        let temp = TempDir::new().unwrap();
        ensure_policy(&index_in(&temp), BumpPolicy::Patch).unwrap();
        ensure_policy(&index_in(&temp), BumpPolicy::Patch).unwrap();
    }

    #[test]
    fn test_mixed_policy_is_rejected() {
        let temp = TempDir::new().unwrap();
        ensure_policy(&index_in(&temp), BumpPolicy::Patch).unwrap();

        let result = ensure_policy(&index_in(&temp), BumpPolicy::Major);
        assert!(matches!(result, Err(StoreError::ConfigurationError(_))));
    }

    #[test]
    fn test_fixed_alias_over_history_is_rejected() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("v-1.0.0.pdf"), b"x").unwrap();

        let result = ensure_policy(&index_in(&temp), BumpPolicy::FixedAlias);
        assert!(matches!(result, Err(StoreError::ConfigurationError(_))));
        assert!(!temp.path().join(MARKER_NAME).exists());
    }

    #[test]
    fn test_existing_history_adopts_versioned_policy() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("v-1.0.4.pdf"), b"x").unwrap();

        ensure_policy(&index_in(&temp), BumpPolicy::Patch).unwrap();
    }

    #[test]
    fn test_garbage_marker_is_rejected() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join(MARKER_NAME), b"sometimes").unwrap();

        let result = ensure_policy(&index_in(&temp), BumpPolicy::Patch);
        assert!(matches!(result, Err(StoreError::ConfigurationError(_))));
    }
}
