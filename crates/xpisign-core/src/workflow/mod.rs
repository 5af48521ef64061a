//! Signing workflow
//!
//! Sequences a package through upload, remote signing, and output
//! resolution. The closed choice sets for addon type and environment
//! live here; the state machine itself is in [`sign`].

pub mod sign;

use std::fmt;
use std::str::FromStr;

use crate::error::WorkflowError;

pub use sign::{SignOptions, SignOutcome, SignWorkflow};

/// The kind of addon being signed; selects the signing function
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddonType {
    SystemAddon,
    GenericExtension,
}

impl AddonType {
    /// The closed set of valid addon types, in prompt order
    pub const ALL: [AddonType; 2] = [AddonType::SystemAddon, AddonType::GenericExtension];

    pub fn as_str(&self) -> &'static str {
        match self {
            AddonType::SystemAddon => "system-addon",
            AddonType::GenericExtension => "generic-extension",
        }
    }
}

impl fmt::Display for AddonType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AddonType {
    type Err = WorkflowError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "system-addon" => Ok(AddonType::SystemAddon),
            "generic-extension" => Ok(AddonType::GenericExtension),
            other => Err(WorkflowError::InvalidSelection(format!(
                "unknown addon type `{}`",
                other
            ))),
        }
    }
}

/// Signing environment; selects the signing function and default bucket
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Environment {
    #[default]
    Production,
    Staging,
}

impl Environment {
    /// The closed set of valid environments, in prompt order
    pub const ALL: [Environment; 2] = [Environment::Production, Environment::Staging];

    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::Production => "production",
            Environment::Staging => "staging",
        }
    }

    /// Input bucket used when the caller did not name one explicitly
    pub fn default_bucket(&self) -> String {
        let slug = match self {
            Environment::Production => "prod",
            Environment::Staging => "stage",
        };
        format!("net-mozaws-{}-addons-signxpi-input", slug)
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Environment {
    type Err = WorkflowError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "production" => Ok(Environment::Production),
            "staging" => Ok(Environment::Staging),
            other => Err(WorkflowError::InvalidSelection(format!(
                "unknown environment `{}`",
                other
            ))),
        }
    }
}
