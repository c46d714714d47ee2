//! `switch-up backups list|restore`

use anyhow::{Context, Result};
use clap::Subcommand;
use colored::Colorize;
use std::path::PathBuf;

use super::common::resolve_volume;
use crate::backup::BackupEntry;
use crate::config::GlobalConfig;

#[derive(Subcommand, Debug)]
pub enum BackupsCommand {
    /// List configuration backups, newest first
    List {
        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Copy a backup's files back onto the SD card
    Restore {
        /// Backup directory name, as shown by `backups list`
        name: String,

        /// SD card mount point (auto-detected when omitted)
        #[arg(short, long, value_name = "PATH")]
        sd_path: Option<PathBuf>,
    },
}

impl BackupsCommand {
    pub async fn execute(self, config: &GlobalConfig) -> Result<()> {
        match self {
            Self::List {
                json,
            } => list(config, json),
            Self::Restore {
                name,
                sd_path,
            } => restore(config, &name, sd_path),
        }
    }
}

fn list(config: &GlobalConfig, json: bool) -> Result<()> {
    let manager = config.backup_manager()?;
    let backups = manager.list_backups()?;

    if json {
        println!("{}", serde_json::to_string_pretty(&backups).context("Failed to serialize backups")?);
        return Ok(());
    }

    if backups.is_empty() {
        println!("No backups in {}", manager.root().display());
        return Ok(());
    }

    println!("{} ({})", "Backups".bold(), manager.root().display());
    for backup in &backups {
        println!("  {}", format_entry(backup));
    }
    Ok(())
}

fn format_entry(backup: &BackupEntry) -> String {
    let created = backup
        .created_at
        .map_or_else(|| "unknown date".to_string(), |t| t.format("%Y-%m-%d %H:%M:%S").to_string());
    format!("{}  {}  {} file(s)", backup.name.cyan(), created, backup.files.len())
}

fn restore(config: &GlobalConfig, name: &str, sd_path: Option<PathBuf>) -> Result<()> {
    let manager = config.backup_manager()?;
    let backup = manager.find_backup(name)?;
    let volume = resolve_volume(sd_path, config)?;

    manager.restore_backup(&backup.path, &volume)?;

    println!("{} Restored {} file(s) from {}", "✓".green().bold(), backup.files.len(), backup.name);
    for file in &backup.files {
        println!("  {}", file.display());
    }
    Ok(())
}
