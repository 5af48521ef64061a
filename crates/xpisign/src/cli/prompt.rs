//! Terminal prompter backed by dialoguer

use dialoguer::{Confirm, Input, Select};

use xpisign_core::{Prompter, WorkflowError};

use crate::cli::output;

/// Interactive choice source for a terminal session
#[derive(Debug, Default)]
pub struct TerminalPrompter;

impl Prompter for TerminalPrompter {
    fn confirm(&mut self, message: &str, default: bool) -> Result<bool, WorkflowError> {
        Confirm::new()
            .with_prompt(message)
            .default(default)
            .interact()
            .map_err(|err| WorkflowError::Prompt(err.to_string()))
    }

    fn select(
        &mut self,
        message: &str,
        items: &[String],
        default: Option<usize>,
    ) -> Result<usize, WorkflowError> {
        let mut select = Select::new().with_prompt(message).items(items);
        if let Some(default) = default {
            select = select.default(default);
        }
        select
            .interact()
            .map_err(|err| WorkflowError::Prompt(err.to_string()))
    }

    fn input(&mut self, message: &str) -> Result<String, WorkflowError> {
        Input::<String>::new()
            .with_prompt(message)
            .interact_text()
            .map_err(|err| WorkflowError::Prompt(err.to_string()))
    }

    fn warn(&mut self, message: &str) {
        output::warning(message);
    }
}
