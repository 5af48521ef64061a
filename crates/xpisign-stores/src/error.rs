//! Store error types

use thiserror::Error;

/// Errors from the blob store and invocation boundary
#[derive(Debug, Error)]
pub enum StoreError {
    /// No AWS region could be resolved from the environment or profile
    #[error("You must specify a region.")]
    NoRegionConfigured,

    /// Upload to the blob store failed
    #[error("Upload failed: {0}")]
    UploadFailed(String),

    /// Download from the blob store failed
    #[error("Download failed: {0}")]
    DownloadFailed(String),

    /// Invoking the remote signing function failed at the transport level
    #[error("Invocation failed: {0}")]
    InvocationFailed(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type for store operations
pub type Result<T> = std::result::Result<T, StoreError>;
