//! `switch-up update`: download the latest releases and install them.

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use std::path::PathBuf;
use tracing::{debug, warn};

use super::common::{resolve_volume, run_install};
use crate::config::GlobalConfig;
use crate::constants::TEMP_DIR_PREFIX;
use crate::release::ReleaseClient;

/// Fetch and install the latest Atmosphere (and Hekate) release.
#[derive(Args, Debug)]
pub struct UpdateCommand {
    /// SD card mount point (auto-detected when omitted)
    #[arg(short, long, value_name = "PATH")]
    sd_path: Option<PathBuf>,

    /// Only update Atmosphere, leave Hekate alone
    #[arg(long)]
    ams_only: bool,
}

impl UpdateCommand {
    pub async fn execute(self, config: &GlobalConfig) -> Result<()> {
        let volume = resolve_volume(self.sd_path, config)?;
        let client = ReleaseClient::from_config(&config.releases)?;

        let mut repos = vec![("Atmosphere", config.releases.atmosphere_repo.as_str())];
        if !self.ams_only {
            repos.push(("Hekate", config.releases.hekate_repo.as_str()));
        }

        let downloads = tempfile::Builder::new()
            .prefix(&format!("{TEMP_DIR_PREFIX}download_"))
            .tempdir()
            .context("Failed to create download directory")?;

        // Downloads are removed by the guard's Drop when an error returns early.
        for (name, repo) in repos {
            println!("{} latest {} release...", "Checking".cyan(), name);
            let (release, asset) = client.latest_zip_asset(repo).await?;
            println!("  {} {} ({})", name.bold(), release.tag_name, asset.name);

            let archive = client.download_asset(&asset.browser_download_url, downloads.path()).await?;
            run_install(config, &archive, &volume).await?;
        }

        let path = downloads.path().to_path_buf();
        match downloads.close() {
            Ok(()) => debug!("Removed download directory {}", path.display()),
            Err(e) => warn!("Failed to remove download directory {}: {}", path.display(), e),
        }

        println!("{}", "✓ SD card is up to date".green().bold());
        Ok(())
    }
}
