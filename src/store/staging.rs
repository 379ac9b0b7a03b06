//! # Stage-then-Rename Writes
//!
//! Bytes go to a uniquely named staging file in the target directory,
//! are fsynced, and only then moved to the final name. Readers see
//! either the previous file or the complete new one.
//!
//! Mutable names (the alias) are replaced by rename. Immutable names
//! (versioned slots) are claimed by hard link, which fails if the slot
//! is already taken.
//!
//! Staging lives in the same directory as the target so the rename never
//! crosses a filesystem boundary.

use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use super::errors::{StoreError, StoreResult};

/// A fully written, fsynced file that is not yet visible under its final name.
#[derive(Debug)]
pub struct StagedFile {
    path: PathBuf,
}

impl StagedFile {
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Atomically move the staged file to `target`.
    ///
    /// On failure the staged file stays where it is and `target` is
    /// untouched.
    pub fn publish(self, target: &Path) -> StoreResult<()> {
        fs::rename(&self.path, target).map_err(|e| {
            StoreError::PublishFailed(format!(
                "rename {} -> {}: {}",
                self.path.display(),
                target.display(),
                e
            ))
        })?;

        sync_parent(target);
        Ok(())
    }

    /// Move the staged file to `target`, refusing to replace anything there.
    ///
    /// The file is hard-linked under its final name, which fails with
    /// `AlreadyExists` if the slot is taken, and the staging name is then
    /// unlinked. On failure the staged file stays and `target` is untouched.
    pub fn publish_new(self, target: &Path) -> StoreResult<()> {
        fs::hard_link(&self.path, target).map_err(|e| {
            StoreError::PublishFailed(format!(
                "link {} -> {}: {}",
                self.path.display(),
                target.display(),
                e
            ))
        })?;

        // The artifact is already visible; a leftover staging name is inert
        if let Err(e) = fs::remove_file(&self.path) {
            tracing::warn!(
                path = %self.path.display(),
                error = %e,
                "failed to remove staging name after link"
            );
        }

        sync_parent(target);
        Ok(())
    }
}

/// The rename or link already happened; a failed directory fsync only
/// weakens durability across power loss.
fn sync_parent(target: &Path) {
    if let Some(dir) = target.parent() {
        if let Err(e) = fsync_dir(dir) {
            tracing::warn!(dir = %dir.display(), error = %e, "directory fsync failed");
        }
    }
}

/// Write `data` to `dir/staging_name` and fsync it.
///
/// A failed write removes the partial staging file before returning
/// `WriteFailed`.
pub fn stage(dir: &Path, staging_name: &str, data: &[u8]) -> StoreResult<StagedFile> {
    let path = dir.join(staging_name);
    let write_failed = |e: std::io::Error| {
        StoreError::WriteFailed(format!("{}: {}", path.display(), e))
    };

    let mut file = OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(&path)
        .map_err(write_failed)?;

    // fsync is mandatory before the rename makes the file visible
    if let Err(e) = file.write_all(data).and_then(|_| file.sync_all()) {
        drop(file);
        // Best effort removal - we're already in an error path
        let _ = fs::remove_file(&path);
        return Err(write_failed(e));
    }

    Ok(StagedFile { path })
}

/// fsync a directory so a completed rename survives power loss.
fn fsync_dir(path: &Path) -> std::io::Result<()> {
    File::open(path)?.sync_all()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_stage_then_publish() {
        let temp = TempDir::new().unwrap();
        let staged = stage(temp.path(), ".staging-1.tmp", b"content").unwrap();
        let staged_path = staged.path().to_path_buf();
        assert_eq!(fs::read(&staged_path).unwrap(), b"content");

        let target = temp.path().join("final.pdf");
        staged.publish(&target).unwrap();

        assert_eq!(fs::read(&target).unwrap(), b"content");
        assert!(!staged_path.exists());
    }

    #[test]
    fn test_publish_replaces_existing_target_whole() {
        let temp = TempDir::new().unwrap();
        let target = temp.path().join("latest.pdf");
        fs::write(&target, b"old and much longer content").unwrap();

        stage(temp.path(), ".staging-2.tmp", b"new")
            .unwrap()
            .publish(&target)
            .unwrap();

        assert_eq!(fs::read(&target).unwrap(), b"new");
    }

    #[test]
    fn test_failed_rename_leaves_staging_and_no_target() {
        let temp = TempDir::new().unwrap();
        let staged = stage(temp.path(), ".staging-3.tmp", b"orphan").unwrap();
        let staged_path = staged.path().to_path_buf();
        let target = temp.path().join("missing-subdir").join("v-1.0.0.pdf");

        let result = staged.publish(&target);

        assert!(matches!(result, Err(StoreError::PublishFailed(_))));
        assert!(!target.exists());
        assert_eq!(fs::read(&staged_path).unwrap(), b"orphan");
    }

    #[test]
    fn test_publish_new_never_replaces_target() {
        let temp = TempDir::new().unwrap();
        let target = temp.path().join("v-1.0.0.pdf");
        fs::write(&target, b"immutable").unwrap();

        let staged = stage(temp.path(), ".staging-6.tmp", b"intruder").unwrap();
        let staged_path = staged.path().to_path_buf();
        let result = staged.publish_new(&target);

        assert!(matches!(result, Err(StoreError::PublishFailed(_))));
        assert_eq!(fs::read(&target).unwrap(), b"immutable");
        assert_eq!(fs::read(&staged_path).unwrap(), b"intruder");
    }

    #[test]
    fn test_publish_new_into_empty_slot() {
        let temp = TempDir::new().unwrap();
        let staged = stage(temp.path(), ".staging-7.tmp", b"fresh").unwrap();
        let staged_path = staged.path().to_path_buf();
        let target = temp.path().join("v-1.0.1.pdf");

        staged.publish_new(&target).unwrap();

        assert_eq!(fs::read(&target).unwrap(), b"fresh");
        assert!(!staged_path.exists());
    }

    #[test]
    fn test_failed_stage_reports_write_failed() {
        let temp = TempDir::new().unwrap();
        let missing = temp.path().join("nope");

        let result = stage(&missing, ".staging-4.tmp", b"data");

        assert!(matches!(result, Err(StoreError::WriteFailed(_))));
    }

    #[test]
    fn test_stage_never_reuses_a_name() {
        let temp = TempDir::new().unwrap();
        stage(temp.path(), ".staging-5.tmp", b"first").unwrap();

        let result = stage(temp.path(), ".staging-5.tmp", b"second");

        assert!(matches!(result, Err(StoreError::WriteFailed(_))));
        // The pre-existing file is not the partial one and must survive
        assert_eq!(fs::read(temp.path().join(".staging-5.tmp")).unwrap(), b"first");
    }
}
