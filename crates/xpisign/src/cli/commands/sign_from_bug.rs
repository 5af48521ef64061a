//! Sign-from-bug command

use std::path::PathBuf;

use anyhow::Context;
use clap::Args;
use tracing::debug;

use xpisign_bugzilla::{filter_candidates, BugzillaClient};
use xpisign_core::{ConfigStore, Prompter, SignOptions, SignWorkflow};
use xpisign_stores::aws::AwsBackend;

use crate::cli::output;
use crate::cli::prompt::TerminalPrompter;

use super::sign::resolve_outcome;

/// Sign an XPI attached to a Bugzilla bug
#[derive(Debug, Args)]
pub struct SignFromBugCommand {
    /// The type of addon that you want to sign
    #[arg(short = 't', long)]
    pub addon_type: Option<String>,

    /// The Bugzilla API key to use
    #[arg(short = 'k', long)]
    pub api_key: Option<String>,

    /// The S3 bucket to upload the file to
    #[arg(long)]
    pub bucket_name: Option<String>,

    /// The environment to sign in
    #[arg(short, long)]
    pub env: Option<String>,

    /// The name of the AWS profile to use
    #[arg(short, long)]
    pub profile: Option<String>,

    /// Verbose output
    #[arg(short, long)]
    pub verbose: bool,

    /// Include obsolete attachments among the candidates
    #[arg(short = 'o', long)]
    pub include_obsolete: bool,

    /// Additional content type to accept as a candidate
    #[arg(short = 'C', long, value_name = "CONTENT_TYPE")]
    pub include_content_type: Option<String>,

    /// Do not reattach the signed XPI to the bug
    #[arg(long)]
    pub no_attach: bool,

    /// The bug to pull the attachment from
    pub bug_number: String,

    /// Destination path for the signed XPI
    pub dest: Option<PathBuf>,
}

impl SignFromBugCommand {
    /// Execute the sign-from-bug command
    pub fn execute(&self, config: &ConfigStore) -> anyhow::Result<()> {
        let rt = tokio::runtime::Runtime::new()?;
        rt.block_on(self.run(config))
    }

    async fn run(&self, config: &ConfigStore) -> anyhow::Result<()> {
        let api_key = self
            .api_key
            .clone()
            .or_else(|| config.get("bugzilla.api_key"));
        let bugzilla = BugzillaClient::new(api_key.as_deref())?;
        let mut prompter = TerminalPrompter;

        let attachments = bugzilla.attachments(&self.bug_number).await?;
        let extra: Vec<String> = self.include_content_type.iter().cloned().collect();
        let candidates = filter_candidates(&attachments, self.include_obsolete, &extra);
        if candidates.is_empty() {
            anyhow::bail!("No valid attachments found. Try --verbose to see more details.");
        }

        let labels: Vec<String> = candidates
            .iter()
            .map(|a| format!("{} by {}", a.summary, a.creator))
            .collect();
        let index = prompter.select("Select attachment", &labels, None)?;
        let attachment = candidates
            .get(index)
            .context("invalid attachment selection")?;

        let bytes = bugzilla.attachment_data(attachment.id).await?;
        let scratch = tempfile::tempdir()?;
        let src = scratch.path().join(&attachment.file_name);
        std::fs::write(&src, &bytes)?;
        debug!(src = %src.display(), "attachment staged for signing");

        let profile = self
            .profile
            .clone()
            .or_else(|| config.get("aws.profile_name"));
        let backend = AwsBackend::connect(profile.as_deref()).await?;

        let options = SignOptions {
            addon_type: self.addon_type.clone(),
            environment: self.env.clone(),
            bucket_name: self.bucket_name.clone(),
            dest: self.dest.clone(),
            attach_bug: (!self.no_attach).then(|| self.bug_number.clone()),
            verbose: self.verbose,
        };

        let outcome = SignWorkflow::new(&backend, &backend, &mut prompter)
            .run(&src, &options)
            .await?;
        output::success("Successfully signed!");

        resolve_outcome(outcome, config, self.api_key.as_deref(), &mut prompter).await
    }
}
