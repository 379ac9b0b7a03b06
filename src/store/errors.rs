//! # Artifact Store Errors

use thiserror::Error;

/// Result type for store operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Artifact store errors
#[derive(Debug, Clone, Error)]
pub enum StoreError {
    // Payload validation
    #[error("Empty payload")]
    EmptyPayload,

    #[error("Payload too large: {size} bytes (max: {max})")]
    PayloadTooLarge { size: u64, max: u64 },

    // Durable write
    #[error("Staging write failed: {0}")]
    WriteFailed(String),

    #[error("Publish failed: {0}")]
    PublishFailed(String),

    // Index
    #[error("No published versions")]
    EmptyIndex,

    // Resolve
    #[error("Artifact not found: {0}")]
    NotFound(String),

    #[error("Read failed: {0}")]
    ReadFailed(String),

    // Deployment
    #[error("Configuration error: {0}")]
    ConfigurationError(String),
}

impl StoreError {
    /// Get HTTP status code
    pub fn status_code(&self) -> u16 {
        match self {
            StoreError::EmptyPayload => 400,
            StoreError::PayloadTooLarge { .. } => 413,
            StoreError::ConfigurationError(_) => 400,
            StoreError::NotFound(_) => 404,
            StoreError::WriteFailed(_) => 500,
            StoreError::PublishFailed(_) => 500,
            StoreError::EmptyIndex => 500,
            StoreError::ReadFailed(_) => 500,
        }
    }

    /// Whether the caller, not the server, is at fault
    pub fn is_client_fault(&self) -> bool {
        (400..500).contains(&self.status_code())
    }
}
