//! Command-line interface for switch-up.
//!
//! # Commands
//!
//! - `install <ZIP>` - install a local Atmosphere or Hekate archive
//! - `update` - download the latest releases and install them
//! - `fix-archive-bit` - remove macOS junk files from the SD card
//! - `backups list` / `backups restore` - inspect and restore configuration backups
//!
//! # Global Options
//!
//! All commands accept `--verbose`, `--quiet`, `--config <PATH>` and
//! `--no-progress`. Verbosity only affects log output on stderr; the stage
//! summary printed on stdout is always shown.
//!
//! ```bash
//! # Install onto the only mounted SD card
//! switch-up install ~/Downloads/atmosphere-1.8.0-master.zip
//!
//! # Update both Atmosphere and Hekate on a specific card, with debug logs
//! switch-up --verbose update --sd-path /Volumes/SWITCH
//! ```

mod backups;
mod clean;
pub mod common;
mod install;
mod update;


use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use crate::config::GlobalConfig;
use crate::utils::progress::set_progress_disabled;

/// Settings derived from the global flags, applied once before a command
/// runs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CliConfig {
    /// Log filter used when `RUST_LOG` is not set.
    pub log_level: String,

    pub no_progress: bool,

    /// Explicit config file from `--config`.
    pub config_path: Option<PathBuf>,
}

impl CliConfig {
    /// Disable progress bars if requested and install the log subscriber.
    ///
    /// Safe to call more than once; only the first subscriber is kept.
    pub fn apply(&self) {
        if self.no_progress {
            set_progress_disabled(true);
        }

        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(&self.log_level));
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .with_target(false)
            .try_init();
    }
}

/// Safe firmware updater for Nintendo Switch SD cards.
#[derive(Parser)]
#[command(
    name = "switch-up",
    about = "Install Atmosphere and Hekate updates onto a Switch SD card without losing your configuration",
    version,
    long_about = "switch-up backs up your SD card configuration, merges a release archive over it \
                  without touching your mods or saves, and restores the backup automatically if \
                  anything goes wrong."
)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Show debug logs on stderr
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    verbose: bool,

    /// Only log errors
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Path to the config file (default: ~/.switch-up/config.toml)
    #[arg(short, long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Hide progress bars
    #[arg(long, global = true)]
    no_progress: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Install a local release archive onto the SD card
    Install(install::InstallCommand),

    /// Download the latest Atmosphere and Hekate releases and install them
    Update(update::UpdateCommand),

    /// Remove macOS junk files and clear extended attributes on the SD card
    FixArchiveBit(clean::FixArchiveBitCommand),

    /// List or restore configuration backups
    #[command(subcommand)]
    Backups(backups::BackupsCommand),
}

impl Cli {
    pub async fn execute(self) -> Result<()> {
        let config = self.build_config();
        self.execute_with_config(config).await
    }

    #[must_use]
    pub fn build_config(&self) -> CliConfig {
        let log_level = if self.verbose {
            "debug"
        } else if self.quiet {
            "error"
        } else {
            "warn"
        };

        CliConfig {
            log_level: log_level.to_string(),
            no_progress: self.no_progress,
            config_path: self.config.clone(),
        }
    }

    pub async fn execute_with_config(self, config: CliConfig) -> Result<()> {
        config.apply();
        let global = GlobalConfig::load_with_optional(config.config_path.clone()).await?;

        match self.command {
            Commands::Install(cmd) => cmd.execute(&global).await,
            Commands::Update(cmd) => cmd.execute(&global).await,
            Commands::FixArchiveBit(cmd) => cmd.execute(&global).await,
            Commands::Backups(cmd) => cmd.execute(&global).await,
        }
    }
}
