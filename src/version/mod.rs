//! # Versioning
//!
//! Semantic versions for published artifacts, the bump policies that derive
//! the next one, and the index that discovers published versions from the
//! storage directory.

pub mod index;
pub mod naming;
pub mod policy;
pub mod semver;

pub use index::VersionIndex;
pub use naming::ArtifactNaming;
pub use policy::BumpPolicy;
pub use semver::{Version, VersionSelector};
