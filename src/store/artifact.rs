//! # Artifact Store
//!
//! Publish assigns the next version and moves the upload into its slot:
//!
//! ```text
//! Absent -> Staged (invisible) -> Published (immutable, visible)
//! ```
//!
//! The whole next-version / stage / rename / alias sequence runs inside
//! the directory lock. Resolve never locks: visibility only changes
//! through atomic renames, so a reader sees the old state or the new one.
//!
//! "Latest" is the alias file `latest.<ext>`. Publish updates it after the
//! versioned file, and resolve of `Latest` only ever reads the alias.

use std::fs::{self, File};
use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use sha2::{Digest, Sha256};

use crate::crash_point::{maybe_crash, points};
use crate::observability::Event;
use crate::version::{ArtifactNaming, BumpPolicy, Version, VersionIndex, VersionSelector};

use super::errors::{StoreError, StoreResult};
use super::lock::{self, DirectoryLock};
use super::marker;
use super::staging;

/// Default upload limit: 25 MiB
pub const DEFAULT_MAX_UPLOAD_BYTES: u64 = 25 * 1024 * 1024;

/// How one lineage is stored.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    pub dir: PathBuf,
    pub policy: BumpPolicy,
    pub max_upload_bytes: u64,
    pub extension: String,
}

impl StoreConfig {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            policy: BumpPolicy::default(),
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            extension: "pdf".to_string(),
        }
    }

    pub fn with_policy(mut self, policy: BumpPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_max_upload_bytes(mut self, max: u64) -> Self {
        self.max_upload_bytes = max;
        self
    }
}

/// What a successful publish made visible.
#[derive(Debug, Clone, Serialize)]
pub struct PublishReceipt {
    /// Assigned version, `None` under `FixedAlias`
    pub version: Option<Version>,
    pub latest_identifier: String,
    pub versioned_identifier: Option<String>,
    pub size: u64,
    /// Hex SHA-256 of the content
    pub sha256: String,
    pub published_at: DateTime<Utc>,
}

/// An opened, published artifact.
///
/// The file is opened during resolve, so a publish that later replaces the
/// alias does not change what this handle reads.
#[derive(Debug)]
pub struct ArtifactHandle {
    identifier: String,
    version: Option<Version>,
    size: u64,
    modified: Option<DateTime<Utc>>,
    file: File,
}

impl ArtifactHandle {
    /// Storage identifier (file name) the handle was resolved from
    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    /// Version, when resolved by explicit version
    pub fn version(&self) -> Option<Version> {
        self.version
    }

    pub fn size(&self) -> u64 {
        self.size
    }

    pub fn modified(&self) -> Option<DateTime<Utc>> {
        self.modified
    }

    /// Take the open file for streaming
    pub fn into_file(self) -> File {
        self.file
    }

    /// Read the whole artifact into memory
    pub fn read_all(mut self) -> StoreResult<Vec<u8>> {
        let mut buf = Vec::with_capacity(self.size as usize);
        self.file
            .read_to_end(&mut buf)
            .map_err(|e| StoreError::ReadFailed(format!("{}: {}", self.identifier, e)))?;
        Ok(buf)
    }
}

/// Versioned store for one artifact lineage.
#[derive(Debug, Clone)]
pub struct ArtifactStore {
    index: VersionIndex,
    policy: BumpPolicy,
    max_upload_bytes: u64,
    lock: Arc<DirectoryLock>,
}

impl ArtifactStore {
    /// Open (creating if needed) the storage directory.
    ///
    /// Fails with `ConfigurationError` when the directory was set up under
    /// a different bump policy.
    pub fn open(config: StoreConfig) -> StoreResult<Self> {
        if config.max_upload_bytes == 0 {
            return Err(StoreError::ConfigurationError(
                "max_upload_bytes must be > 0".to_string(),
            ));
        }

        let naming = ArtifactNaming::new(&config.extension).map_err(|e| {
            StoreError::ConfigurationError(format!("Invalid extension '{}': {}", config.extension, e))
        })?;

        fs::create_dir_all(&config.dir).map_err(|e| {
            StoreError::WriteFailed(format!("create {}: {}", config.dir.display(), e))
        })?;
        let dir = fs::canonicalize(&config.dir).map_err(|e| {
            StoreError::ConfigurationError(format!("{}: {}", config.dir.display(), e))
        })?;

        let store = Self {
            index: VersionIndex::new(dir.clone(), naming),
            policy: config.policy,
            max_upload_bytes: config.max_upload_bytes,
            lock: lock::for_directory(&dir),
        };

        {
            let _guard = store.lock.acquire();
            marker::ensure_policy(&store.index, store.policy)?;
        }

        tracing::info!(
            event = Event::StoreOpened.as_str(),
            dir = %dir.display(),
            policy = %store.policy,
            "artifact store opened"
        );

        Ok(store)
    }

    pub fn dir(&self) -> &Path {
        self.index.dir()
    }

    pub fn policy(&self) -> BumpPolicy {
        self.policy
    }

    pub fn max_upload_bytes(&self) -> u64 {
        self.max_upload_bytes
    }

    pub fn naming(&self) -> &ArtifactNaming {
        self.index.naming()
    }

    pub fn index(&self) -> &VersionIndex {
        &self.index
    }

    fn validate_payload(&self, content: &[u8]) -> StoreResult<()> {
        let size = content.len() as u64;
        if size == 0 {
            return Err(StoreError::EmptyPayload);
        }
        if size > self.max_upload_bytes {
            return Err(StoreError::PayloadTooLarge {
                size,
                max: self.max_upload_bytes,
            });
        }
        Ok(())
    }

    /// Publish `content` under the next version and point the alias at it.
    ///
    /// If the alias update fails after the versioned file was renamed into
    /// place, that version stays published and the error is returned.
    pub fn publish(&self, content: &[u8]) -> StoreResult<PublishReceipt> {
        self.validate_payload(content)?;

        let result = {
            let _guard = self.lock.acquire();
            self.publish_locked(content)
        };

        match &result {
            Ok(receipt) => tracing::info!(
                event = Event::PublishComplete.as_str(),
                version = ?receipt.version.map(|v| v.to_string()),
                identifier = receipt
                    .versioned_identifier
                    .as_deref()
                    .unwrap_or(&receipt.latest_identifier),
                size = receipt.size,
                "artifact published"
            ),
            Err(e) => tracing::error!(
                event = Event::PublishFailed.as_str(),
                dir = %self.dir().display(),
                error = %e,
                "publish failed"
            ),
        }

        result
    }

    fn publish_locked(&self, content: &[u8]) -> StoreResult<PublishReceipt> {
        let naming = self.naming();
        let version = self.index.next_version(self.policy)?;

        let versioned_identifier = match version {
            Some(version) => {
                let name = naming.versioned_name(&version);
                let target = self.dir().join(&name);

                let staged = staging::stage(self.dir(), &naming.staging_name(), content)?;
                maybe_crash(points::PUBLISH_AFTER_STAGING);
                // Published artifacts are immutable; never replace one
                staged.publish_new(&target)?;
                maybe_crash(points::PUBLISH_AFTER_RENAME);

                Some(name)
            }
            None => None,
        };

        let latest_identifier = naming.alias_name();
        let staged = staging::stage(self.dir(), &naming.staging_name(), content)?;
        maybe_crash(points::ALIAS_AFTER_STAGING);
        staged.publish(&self.dir().join(&latest_identifier))?;

        Ok(PublishReceipt {
            version,
            latest_identifier,
            versioned_identifier,
            size: content.len() as u64,
            sha256: format!("{:x}", Sha256::digest(content)),
            published_at: Utc::now(),
        })
    }

    /// Open the artifact `selector` names. Read-only, lock-free.
    pub fn resolve(&self, selector: VersionSelector) -> StoreResult<ArtifactHandle> {
        let naming = self.naming();
        let (identifier, version) = match selector {
            VersionSelector::Latest => (naming.alias_name(), None),
            VersionSelector::Exact(v) => (naming.versioned_name(&v), Some(v)),
        };
        let path = self.dir().join(&identifier);

        let file = match File::open(&path) {
            Ok(file) => file,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(
                    event = Event::ResolveMiss.as_str(),
                    selector = %selector,
                    "nothing published under selector"
                );
                return Err(StoreError::NotFound(identifier));
            }
            Err(e) => return Err(StoreError::ReadFailed(format!("{}: {}", identifier, e))),
        };

        let metadata = file
            .metadata()
            .map_err(|e| StoreError::ReadFailed(format!("{}: {}", identifier, e)))?;
        if !metadata.is_file() {
            return Err(StoreError::NotFound(identifier));
        }

        Ok(ArtifactHandle {
            identifier,
            version,
            size: metadata.len(),
            modified: metadata.modified().ok().map(DateTime::<Utc>::from),
            file,
        })
    }

    /// Published versions, ascending.
    pub fn versions(&self) -> Vec<Version> {
        self.index.list_versions().into_iter().collect()
    }
}
