//! # Per-Directory Publish Lock
//!
//! Computing the next version and writing it is a read-then-decide
//! sequence, so publishers to one directory must be serialized. Every
//! store opened on the same directory in this process shares one mutex,
//! keyed by the canonical directory path. Readers never take it.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, OnceLock, PoisonError};

static REGISTRY: OnceLock<Mutex<HashMap<PathBuf, Arc<DirectoryLock>>>> = OnceLock::new();

/// Mutual exclusion for all mutation of one storage directory.
#[derive(Debug, Default)]
pub struct DirectoryLock {
    inner: Mutex<()>,
}

impl DirectoryLock {
    /// Block until the critical section is free.
    ///
    /// A panic inside a previous holder leaves nothing half-updated in
    /// memory (the guarded state is the directory itself), so poisoning
    /// is ignored.
    pub fn acquire(&self) -> MutexGuard<'_, ()> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Shared lock for `dir`, which must already be canonical.
pub fn for_directory(dir: &Path) -> Arc<DirectoryLock> {
    let registry = REGISTRY.get_or_init(|| Mutex::new(HashMap::new()));
    let mut locks = registry.lock().unwrap_or_else(PoisonError::into_inner);
    locks
        .entry(dir.to_path_buf())
        .or_insert_with(|| Arc::new(DirectoryLock::default()))
        .clone()
}
