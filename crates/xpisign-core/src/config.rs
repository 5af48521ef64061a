//! Persisted key/value configuration store
//!
//! A flat two-level store (`section.option` -> string) kept as TOML at a
//! fixed well-known path, lazily created on first save. The store is an
//! explicit handle constructed at process entry and passed by reference;
//! there is no ambient singleton. Concurrent invocations racing on the
//! same file are an accepted hazard.

use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::ConfigError;

/// Result type for configuration operations
pub type Result<T> = std::result::Result<T, ConfigError>;

/// Handle over the configuration file
#[derive(Debug, Clone)]
pub struct ConfigStore {
    path: PathBuf,
    table: toml::Table,
}

impl ConfigStore {
    /// The well-known store location: `~/.xpisign/config.toml`
    pub fn default_path() -> Result<PathBuf> {
        let home = dirs::home_dir().ok_or(ConfigError::NoHomeDirectory)?;
        Ok(home.join(".xpisign").join("config.toml"))
    }

    /// Load the store from the well-known location
    pub fn load_default() -> Result<Self> {
        Self::load(Self::default_path()?)
    }

    /// Load the store from a path; a missing file is an empty store
    pub fn load(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let table = if path.is_file() {
            let content = std::fs::read_to_string(&path)?;
            content.parse::<toml::Table>()?
        } else {
            debug!(path = %path.display(), "no config file yet, starting empty");
            toml::Table::new()
        };
        Ok(Self { path, table })
    }

    /// Path of the backing file
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn split_key(key: &str) -> Result<(&str, &str)> {
        key.split_once('.')
            .filter(|(section, option)| !section.is_empty() && !option.is_empty())
            .ok_or_else(|| ConfigError::InvalidKey(key.to_string()))
    }

    /// Look up a value by dotted key
    pub fn get(&self, key: &str) -> Option<String> {
        let (section, option) = Self::split_key(key).ok()?;
        self.table
            .get(section)?
            .get(option)?
            .as_str()
            .map(String::from)
    }

    /// Look up a value, falling back to a caller-supplied default
    pub fn get_or(&self, key: &str, default: &str) -> String {
        self.get(key).unwrap_or_else(|| default.to_string())
    }

    /// True if the key is present
    pub fn has(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Set a value by dotted key; `None` deletes the entry
    pub fn set(&mut self, key: &str, value: Option<&str>) -> Result<()> {
        let (section, option) = Self::split_key(key)?;
        match value {
            Some(value) => {
                let entry = self
                    .table
                    .entry(section.to_string())
                    .or_insert_with(|| toml::Value::Table(toml::Table::new()));
                if let Some(table) = entry.as_table_mut() {
                    table.insert(option.to_string(), toml::Value::String(value.to_string()));
                }
            }
            None => {
                if let Some(table) = self.table.get_mut(section).and_then(|v| v.as_table_mut()) {
                    table.remove(option);
                }
            }
        }
        Ok(())
    }

    /// Write the store back to its file, creating parent directories
    pub fn save(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&self.path, toml::to_string_pretty(&self.table)?)?;
        debug!(path = %self.path.display(), "config saved");
        Ok(())
    }
}
