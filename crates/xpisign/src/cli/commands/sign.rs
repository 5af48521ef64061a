//! Sign command

use std::path::PathBuf;

use anyhow::Context;
use clap::Args;
use tracing::info;

use xpisign_bugzilla::{BugzillaClient, XPI_CONTENT_TYPE};
use xpisign_core::{ConfigStore, Prompter, SignOptions, SignOutcome, SignWorkflow};
use xpisign_stores::aws::AwsBackend;

use crate::cli::output;
use crate::cli::prompt::TerminalPrompter;

use super::check_needinfo;

/// Upload and sign an addon XPI file
#[derive(Debug, Args)]
pub struct SignCommand {
    /// The type of addon that you want to sign
    #[arg(short = 't', long)]
    pub addon_type: Option<String>,

    /// The Bugzilla API key to use
    #[arg(short = 'k', long)]
    pub api_key: Option<String>,

    /// Attach the signed addon to a bug
    #[arg(short = 'b', long, value_name = "BUG")]
    pub attach: Option<String>,

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

    /// Path to the XPI file to sign
    pub src: PathBuf,

    /// Destination path for the signed XPI
    pub dest: Option<PathBuf>,
}

impl SignCommand {
    /// Execute the sign command
    pub fn execute(&self, config: &ConfigStore) -> anyhow::Result<()> {
        let rt = tokio::runtime::Runtime::new()?;
        rt.block_on(self.run(config))
    }

    async fn run(&self, config: &ConfigStore) -> anyhow::Result<()> {
        let profile = self
            .profile
            .clone()
            .or_else(|| config.get("aws.profile_name"));
        let backend = AwsBackend::connect(profile.as_deref()).await?;
        let mut prompter = TerminalPrompter;

        let options = SignOptions {
            addon_type: self.addon_type.clone(),
            environment: self.env.clone(),
            bucket_name: self.bucket_name.clone(),
            dest: self.dest.clone(),
            attach_bug: self.attach.clone(),
            verbose: self.verbose,
        };

        let outcome = SignWorkflow::new(&backend, &backend, &mut prompter)
            .run(&self.src, &options)
            .await?;
        output::success("Successfully signed!");

        resolve_outcome(outcome, config, self.api_key.as_deref(), &mut prompter).await
    }
}

/// Handle the terminal outcome of a signing run.
///
/// Shared with `sign-from-bug`, which delegates here after staging the
/// chosen attachment.
pub(crate) async fn resolve_outcome(
    outcome: SignOutcome,
    config: &ConfigStore,
    api_key: Option<&str>,
    prompter: &mut dyn Prompter,
) -> anyhow::Result<()> {
    match outcome {
        SignOutcome::Downloaded { dest } => {
            info!(dest = %dest.display(), "signed package downloaded");
            output::info(&format!("Saved to {}", dest.display()));
        }
        SignOutcome::Printed { payload } => {
            println!("\n{}", serde_json::to_string_pretty(&payload)?);
        }
        SignOutcome::FetchedForAttach {
            bug,
            bytes,
            filename,
        } => {
            let api_key = api_key
                .map(String::from)
                .or_else(|| config.get("bugzilla.api_key"));
            let bugzilla = BugzillaClient::new(api_key.as_deref())?;
            bugzilla
                .create_attachment(&bug, &bytes, &filename, &filename, XPI_CONTENT_TYPE)
                .await
                .context("could not attach the signed addon")?;
            output::success("Attachment successfully created!");

            // Needinfo clearing is non-fatal after a successful attach.
            if let Err(err) = check_needinfo::clear_own_needinfo(&bugzilla, &bug, prompter).await {
                output::warning(&format!("Could not check needinfo: {err:#}"));
            }
        }
    }
    Ok(())
}
