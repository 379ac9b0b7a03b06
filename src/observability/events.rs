//! Observable events for docvault
//!
//! Every log line carries one of these names in its `event` field, so
//! operators can filter on a stable vocabulary instead of message text.

use std::fmt;

/// Observable events
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    // Boot & Lifecycle
    /// Configuration loaded
    ConfigLoaded,
    /// Storage directory opened and policy checked
    StoreOpened,
    /// HTTP server listening
    Serving,

    // Publish
    /// Upload accepted at the HTTP boundary
    UploadReceived,
    /// Upload refused before reaching the store
    UploadRejected,
    /// Versioned artifact and alias are visible
    PublishComplete,
    /// Publish aborted
    PublishFailed,

    // Resolve
    /// Selector named nothing published
    ResolveMiss,
    /// Directory listing failed, treated as empty
    IndexUnreadable,
}

impl Event {
    /// Returns the string representation of the event
    pub fn as_str(&self) -> &'static str {
        match self {
            Event::ConfigLoaded => "CONFIG_LOADED",
            Event::StoreOpened => "STORE_OPENED",
            Event::Serving => "DOCVAULT_SERVING",
            Event::UploadReceived => "UPLOAD_RECEIVED",
            Event::UploadRejected => "UPLOAD_REJECTED",
            Event::PublishComplete => "PUBLISH_COMPLETE",
            Event::PublishFailed => "PUBLISH_FAILED",
            Event::ResolveMiss => "RESOLVE_MISS",
            Event::IndexUnreadable => "INDEX_UNREADABLE",
        }
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
