//! Error types for xpisign

use std::path::PathBuf;

use thiserror::Error;

use xpisign_stores::StoreError;

/// Errors from inspecting a package archive
#[derive(Debug, Error)]
pub enum XpiError {
    /// The path does not reference an existing regular file
    #[error("`{0}` does not exist.")]
    NotFound(PathBuf),

    /// The file could not be opened as a zip container
    #[error("`{0}` could not be unzipped.")]
    CorruptArchive(PathBuf),

    /// Neither a legacy descriptor nor a manifest was found
    #[error("`{0}` is not a valid addon package.")]
    UnrecognizedFormat(PathBuf),

    /// No extension id is present in the package metadata
    #[error("`{0}` has no extension id in its metadata.")]
    MissingId(PathBuf),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The manifest file is not valid JSON
    #[error("Invalid manifest.json: {0}")]
    Manifest(#[from] serde_json::Error),
}

/// Errors from the configuration store
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Keys are dotted two-level `section.option` pairs
    #[error("Configuration keys look like `section.option`, got `{0}`")]
    InvalidKey(String),

    /// No home directory to anchor the config path
    #[error("Could not determine a home directory")]
    NoHomeDirectory,

    /// Failed to parse the store file
    #[error("Failed to parse configuration: {0}")]
    Parse(#[from] toml::de::Error),

    /// Failed to serialize the store
    #[error("Failed to serialize configuration: {0}")]
    Serialize(#[from] toml::ser::Error),

    /// IO error
    #[error("IO error reading config: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors from the signing workflow
#[derive(Debug, Error)]
pub enum WorkflowError {
    /// The user declined a confirmation step
    #[error("Aborted!")]
    Aborted,

    /// No valid choice was made within the bounded re-prompt loop
    #[error("Invalid selection: {0}")]
    InvalidSelection(String),

    /// The signer reported a structured failure
    #[error("Invoking the signing function failed: {0}")]
    RemoteInvocationFailure(String),

    /// The signer response could not be decoded
    #[error("Couldn't parse signer response: {0}")]
    MalformedResponse(String),

    /// The destination exists and the conflict was never resolved
    #[error("`{0}` already exists and was not overwritten.")]
    DestinationConflict(PathBuf),

    /// Reading a choice from the prompt source failed
    #[error("Prompt failed: {0}")]
    Prompt(String),

    /// Package inspection error
    #[error(transparent)]
    Xpi(#[from] XpiError),

    /// Blob store or invocation error
    #[error(transparent)]
    Store(#[from] StoreError),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
