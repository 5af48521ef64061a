//! Prompt seam
//!
//! Interactive choices go through the [`Prompter`] trait so the workflow
//! can be driven by a terminal in production and by a scripted choice
//! source in tests. Re-prompt loops over a prompter are always bounded.

use crate::error::WorkflowError;

/// Maximum attempts for any re-prompt loop before giving up
pub const MAX_PROMPT_ATTEMPTS: usize = 5;

/// Source of interactive choices
pub trait Prompter {
    /// Yes/no question
    fn confirm(&mut self, message: &str, default: bool) -> Result<bool, WorkflowError>;

    /// Pick one item; returns the chosen index
    fn select(
        &mut self,
        message: &str,
        items: &[String],
        default: Option<usize>,
    ) -> Result<usize, WorkflowError>;

    /// Free-form text input
    fn input(&mut self, message: &str) -> Result<String, WorkflowError>;

    /// Show a recoverable warning ahead of a prompt
    fn warn(&mut self, message: &str);
}
