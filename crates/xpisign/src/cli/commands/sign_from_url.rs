//! Sign-from-url command

use std::path::{Path, PathBuf};

use clap::Args;
use tracing::debug;

use xpisign_core::{ConfigStore, SignOptions, SignWorkflow};
use xpisign_stores::aws::AwsBackend;

use crate::cli::output;
use crate::cli::prompt::TerminalPrompter;

use super::sign::resolve_outcome;

/// Filename the downloaded package is staged under before signing
const STAGED_FILENAME: &str = "tmp.xpi";

/// Sign an XPI fetched from a URL
#[derive(Debug, Args)]
pub struct SignFromUrlCommand {
    /// The type of addon that you want to sign
    #[arg(short = 't', long)]
    pub addon_type: Option<String>,

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

    /// URL to fetch the XPI from
    pub url: String,

    /// Destination path for the signed XPI
    pub dest: Option<PathBuf>,
}

impl SignFromUrlCommand {
    /// Execute the sign-from-url command
    pub fn execute(&self, config: &ConfigStore) -> anyhow::Result<()> {
        let rt = tokio::runtime::Runtime::new()?;
        rt.block_on(self.run(config))
    }

    async fn run(&self, config: &ConfigStore) -> anyhow::Result<()> {
        let scratch = tempfile::tempdir()?;
        let src = stage_url(&self.url, scratch.path()).await?;

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
            attach_bug: None,
            verbose: self.verbose,
        };

        let outcome = SignWorkflow::new(&backend, &backend, &mut prompter)
            .run(&src, &options)
            .await?;
        output::success("Successfully signed!");

        resolve_outcome(outcome, config, None, &mut prompter).await
    }
}

/// Fetch the package at `url` and stage it under `dir` for signing.
///
/// A non-success HTTP status is an error; nothing is written in that case.
async fn stage_url(url: &str, dir: &Path) -> anyhow::Result<PathBuf> {
    let response = reqwest::get(url).await?.error_for_status()?;
    let bytes = response.bytes().await?;

    let path = dir.join(STAGED_FILENAME);
    std::fs::write(&path, &bytes)?;
    debug!(url, src = %path.display(), "package staged for signing");
    Ok(path)
}
