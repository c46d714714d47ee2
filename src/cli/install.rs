//! `switch-up install <ZIP>`

use anyhow::Result;
use clap::Args;
use std::path::PathBuf;

use super::common::{resolve_volume, run_install};
use crate::config::GlobalConfig;

/// Install a local release archive.
#[derive(Args, Debug)]
pub struct InstallCommand {
    /// Release archive (.zip) to install
    #[arg(value_name = "ZIP")]
    archive: PathBuf,

    /// SD card mount point (auto-detected when omitted)
    #[arg(short, long, value_name = "PATH")]
    sd_path: Option<PathBuf>,
}

impl InstallCommand {
    pub async fn execute(self, config: &GlobalConfig) -> Result<()> {
        let volume = resolve_volume(self.sd_path, config)?;
        run_install(config, &self.archive, &volume).await?;
        Ok(())
    }
}
