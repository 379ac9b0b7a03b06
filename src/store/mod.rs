//! # Artifact Store
//!
//! Durable, versioned storage for one artifact lineage in one directory.

pub mod artifact;
pub mod errors;
pub mod lock;
pub mod marker;
pub mod staging;

pub use artifact::{
    ArtifactHandle, ArtifactStore, PublishReceipt, StoreConfig, DEFAULT_MAX_UPLOAD_BYTES,
};
pub use errors::{StoreError, StoreResult};
