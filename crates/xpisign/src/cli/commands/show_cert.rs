//! Show-cert command

use std::path::PathBuf;
use std::process::Command;

use anyhow::Context;
use clap::Args;

use xpisign_core::Xpi;

use crate::cli::output;

/// Inspect the certificate for a signed addon
#[derive(Debug, Args)]
pub struct ShowCertCommand {
    /// Path to the signed XPI
    pub src: PathBuf,

    /// Verbose output
    #[arg(short, long)]
    pub verbose: bool,
}

impl ShowCertCommand {
    /// Execute the show-cert command
    pub fn execute(&self) -> anyhow::Result<()> {
        let xpi = Xpi::open(&self.src)?;
        if !xpi.is_signed() {
            anyhow::bail!("Source file is not a signed addon.");
        }

        if self.verbose {
            output::info(&format!(
                "Signature entry extracted to {}",
                xpi.certificate_path().display()
            ));
        }

        let openssl =
            which::which("openssl").context("openssl is required to print certificates")?;
        let result = Command::new(openssl)
            .arg("pkcs7")
            .args(["-inform", "der"])
            .arg("-in")
            .arg(xpi.certificate_path())
            .args(["-print_certs", "-text"])
            .output()?;

        if !result.status.success() {
            output::error("An error occurred!");
            anyhow::bail!("{}", String::from_utf8_lossy(&result.stderr).trim_end());
        }
        print!("{}", String::from_utf8_lossy(&result.stdout));
        Ok(())
    }
}
