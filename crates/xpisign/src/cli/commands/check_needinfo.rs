//! Check-needinfo command

use clap::Args;

use xpisign_bugzilla::{find_own_needinfo, BugzillaClient};
use xpisign_core::{ConfigStore, Prompter};

use crate::cli::output;
use crate::cli::prompt::TerminalPrompter;

/// Check for an open needinfo on the given bug, and offer to clear it
#[derive(Debug, Args)]
pub struct CheckNeedinfoCommand {
    /// The Bugzilla API key to use
    #[arg(short = 'k', long)]
    pub api_key: Option<String>,

    /// The bug to check
    pub bug_number: String,
}

impl CheckNeedinfoCommand {
    /// Execute the check-needinfo command
    pub fn execute(&self, config: &ConfigStore) -> anyhow::Result<()> {
        let rt = tokio::runtime::Runtime::new()?;
        rt.block_on(async {
            let api_key = self
                .api_key
                .clone()
                .or_else(|| config.get("bugzilla.api_key"));
            let bugzilla = BugzillaClient::new(api_key.as_deref())?;
            let mut prompter = TerminalPrompter;
            clear_own_needinfo(&bugzilla, &self.bug_number, &mut prompter).await
        })
    }
}

/// Clear the current user's pending needinfo on a bug, if any.
///
/// At most one flag is cleared, the first match in the tracker's own
/// ordering; finding none is a no-op.
pub(crate) async fn clear_own_needinfo(
    bugzilla: &BugzillaClient,
    bug: &str,
    prompter: &mut dyn Prompter,
) -> anyhow::Result<()> {
    let user = bugzilla.whoami().await?.name;
    let flags = bugzilla.flags(bug).await?;

    if let Some(flag) = find_own_needinfo(&flags, &user) {
        let message = format!("Clear your needinfo from {}?", flag.setter);
        if prompter.confirm(&message, true)? {
            bugzilla.clear_flag(bug, flag.id).await?;
            output::success("Needinfo cleared");
        }
    }
    Ok(())
}
