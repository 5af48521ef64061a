//! CLI definition and command handling

pub mod commands;
pub mod output;
pub mod prompt;

use clap::{Parser, Subcommand};

use xpisign_core::ConfigStore;

use commands::{
    CheckNeedinfoCommand, ConfigureCommand, ShowCertCommand, SignCommand, SignFromBugCommand,
    SignFromUrlCommand,
};

/// xpisign - sign Mozilla addon packages through the remote signing service
#[derive(Debug, Parser)]
#[command(name = "xpisign")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Configure defaults for this tool
    Configure(ConfigureCommand),

    /// Upload and sign an addon XPI file
    Sign(SignCommand),

    /// Sign an XPI attached to a Bugzilla bug
    SignFromBug(SignFromBugCommand),

    /// Sign an XPI fetched from a URL
    SignFromUrl(SignFromUrlCommand),

    /// Check for an open needinfo on a bug, and offer to clear it
    CheckNeedinfo(CheckNeedinfoCommand),

    /// Inspect the certificate for a signed addon
    ShowCert(ShowCertCommand),
}

impl Cli {
    /// Execute the CLI command
    pub fn execute(self) -> anyhow::Result<()> {
        // One explicit configuration handle per process; commands receive
        // it by reference.
        let mut config = ConfigStore::load_default()?;

        match self.command {
            Commands::Configure(ref cmd) => cmd.execute(&mut config),
            Commands::Sign(ref cmd) => cmd.execute(&config),
            Commands::SignFromBug(ref cmd) => cmd.execute(&config),
            Commands::SignFromUrl(ref cmd) => cmd.execute(&config),
            Commands::CheckNeedinfo(ref cmd) => cmd.execute(&config),
            Commands::ShowCert(ref cmd) => cmd.execute(),
        }
    }
}
