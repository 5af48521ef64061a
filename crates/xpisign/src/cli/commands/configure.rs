//! Configure command

use clap::Args;
use dialoguer::{Confirm, Input};

use xpisign_core::ConfigStore;

use crate::cli::output;

/// Settings covered by the interactive wizard
const WIZARD_STEPS: &[(&str, &str)] = &[
    ("aws.profile_name", "Default AWS Profile"),
    ("bugzilla.api_key", "Default Bugzilla API Key"),
];

/// Configure defaults for this tool
#[derive(Debug, Args)]
pub struct ConfigureCommand {
    /// Configuration key (`section.option`)
    pub key: Option<String>,

    /// Value to assign to the key
    pub value: Option<String>,
}

impl ConfigureCommand {
    /// Execute the configure command
    pub fn execute(&self, config: &mut ConfigStore) -> anyhow::Result<()> {
        match (&self.key, &self.value) {
            (Some(key), Some(value)) => {
                config.set(key, Some(value))?;
                config.save()?;
            }
            (Some(key), None) => {
                println!("{}", config.get_or(key, ""));
            }
            _ => self.wizard(config)?,
        }
        Ok(())
    }

    fn wizard(&self, config: &mut ConfigStore) -> anyhow::Result<()> {
        for (key, name) in WIZARD_STEPS {
            if config.has(key) {
                output::info(&format!(
                    "{} is already set to: {}",
                    name,
                    config.get_or(key, "")
                ));
                let change = Confirm::new()
                    .with_prompt("Do you want to change this value?")
                    .default(false)
                    .interact()?;
                if !change {
                    println!();
                    continue;
                }
            }

            let value: String = Input::new()
                .with_prompt(*name)
                .allow_empty(true)
                .interact_text()?;
            // An empty answer clears the setting.
            let value = (!value.is_empty()).then_some(value);
            config.set(key, value.as_deref())?;
        }

        config.save()?;
        Ok(())
    }
}
