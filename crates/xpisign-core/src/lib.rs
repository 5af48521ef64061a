//! Core library for xpisign
//!
//! Holds the pieces the CLI is a thin shell over: the package inspector
//! ([`xpi::Xpi`]), the signing workflow state machine
//! ([`workflow::SignWorkflow`]), the persisted configuration store
//! ([`config::ConfigStore`]), and the prompt seam ([`prompt::Prompter`])
//! that keeps interactive choices injectable for tests.

pub mod config;
pub mod error;
pub mod prompt;
pub mod workflow;
pub mod xpi;

pub use config::ConfigStore;
pub use error::{ConfigError, WorkflowError, XpiError};
pub use prompt::Prompter;
pub use workflow::{AddonType, Environment, SignOptions, SignOutcome, SignWorkflow};
pub use xpi::{AddonKind, Xpi};
