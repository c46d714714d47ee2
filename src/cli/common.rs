//! Helpers shared by the CLI commands: volume resolution, running an install
//! off the async runtime, and rendering its progress and outcome.

use anyhow::{Context, Result};
use colored::Colorize;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::config::GlobalConfig;
use crate::installer::{InstallError, InstallObserver, InstallReport, InstallStage, Installer};
use crate::volume::resolve_sd_path;

/// Resolve the SD card from `--sd-path` or by scanning the configured mount
/// root, and announce it.
pub fn resolve_volume(explicit: Option<PathBuf>, config: &GlobalConfig) -> Result<PathBuf> {
    let volume = resolve_sd_path(explicit, &config.mount_root)?;
    println!("{} {}", "SD card:".bold(), volume.display());
    Ok(volume)
}

/// Prints each install stage as it starts.
pub struct ConsoleObserver;

impl InstallObserver for ConsoleObserver {
    fn stage_started(&self, stage: InstallStage) {
        match stage {
            InstallStage::Done => {}
            InstallStage::Restoring => println!("  {} {}...", "↺".yellow(), stage),
            _ => println!("  {} {}...", "→".cyan(), stage),
        }
    }
}

/// Run an install on the blocking thread pool and report the result.
///
/// The installer does synchronous filesystem I/O, so it must not run on the
/// async runtime's worker threads.
pub async fn run_install(config: &GlobalConfig, archive: &Path, volume: &Path) -> Result<InstallReport> {
    let installer = Installer::new(config.backup_manager()?).with_observer(Arc::new(ConsoleObserver));
    let archive = archive.to_path_buf();
    let volume = volume.to_path_buf();

    let label = archive.file_name().map(|n| n.to_string_lossy().into_owned()).unwrap_or_default();
    println!("{} {}", "Installing".cyan().bold(), label);

    let outcome = tokio::task::spawn_blocking(move || installer.install(&archive, &volume))
        .await
        .context("Install task panicked")?;

    match outcome {
        Ok(report) => {
            print_report(&report);
            Ok(report)
        }
        Err(e) => {
            print_failure(&e);
            Err(e.into())
        }
    }
}

fn print_report(report: &InstallReport) {
    let stats = &report.merge;
    println!(
        "{} {} added, {} replaced, {} directories created",
        "✓ Install complete:".green().bold(),
        stats.files_added,
        stats.files_replaced,
        stats.dirs_created
    );
    match report.junk_removed {
        Some(0) => {}
        Some(count) => println!("  Removed {count} macOS junk file(s)"),
        None => println!("  {}", "Junk cleanup failed; run 'switch-up fix-archive-bit'".yellow()),
    }
    println!("  Backup: {}", report.backup_dir.display());
}

/// Say which stage failed and whether the configuration is safe. The error
/// itself is rendered by the caller.
pub fn print_failure(error: &InstallError) {
    if let Some(stage) = error.stage() {
        println!("{} {}", "✗ Failed while".red().bold(), stage.to_string().to_lowercase());
    }
    match error {
        InstallError::MergeRolledBack {
            backup_dir,
            ..
        } => println!(
            "  {} {}",
            "Configuration restored from".green(),
            backup_dir.display()
        ),
        InstallError::RestoreFailed {
            backup_dir,
            ..
        } => println!(
            "  {} {}",
            "Restore failed. Your backup is at".red().bold(),
            backup_dir.display()
        ),
        _ if !error.volume_modified() && error.stage().is_some() => {
            println!("  Nothing on the SD card was changed");
        }
        _ => {}
    }
}
