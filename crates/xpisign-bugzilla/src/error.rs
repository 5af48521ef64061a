//! Bugzilla error types

use thiserror::Error;

/// Errors from the Bugzilla REST boundary
#[derive(Debug, Error)]
pub enum BugzillaError {
    /// The API reported an error in its response body
    #[error("Bugzilla API error: {0}")]
    Api(String),

    /// The response did not have the expected shape
    #[error("Unexpected Bugzilla response: {0}")]
    UnexpectedResponse(String),

    /// The configured API key is not a valid header value
    #[error("Invalid API key")]
    InvalidApiKey(#[from] reqwest::header::InvalidHeaderValue),

    /// HTTP error
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Attachment data was not valid base64
    #[error("Invalid attachment data: {0}")]
    Decode(#[from] base64::DecodeError),
}

/// Result type for Bugzilla operations
pub type Result<T> = std::result::Result<T, BugzillaError>;
