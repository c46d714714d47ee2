//! `switch-up fix-archive-bit`

use anyhow::Result;
use clap::Args;
use colored::Colorize;
use std::path::PathBuf;

use super::common::resolve_volume;
use crate::cleaner::{XattrOutcome, clean_macos_junk, remove_xattrs};
use crate::config::GlobalConfig;

/// Remove macOS junk files and clear extended attributes.
///
/// Fixes consoles that refuse to see homebrew or crash at boot after files
/// were copied from a Mac.
#[derive(Args, Debug)]
pub struct FixArchiveBitCommand {
    /// SD card mount point (auto-detected when omitted)
    #[arg(value_name = "SD_PATH")]
    sd_path: Option<PathBuf>,
}

impl FixArchiveBitCommand {
    pub async fn execute(self, config: &GlobalConfig) -> Result<()> {
        let volume = resolve_volume(self.sd_path, config)?;

        let (removed, xattrs) = tokio::task::spawn_blocking(move || -> Result<_> {
            let removed = clean_macos_junk(&volume)?;
            let xattrs = remove_xattrs(&volume)?;
            Ok((removed, xattrs))
        })
        .await??;

        println!("{} Removed {} junk file(s)/folder(s)", "✓".green().bold(), removed);
        match xattrs {
            XattrOutcome::Cleared => println!("{} Extended attributes cleared", "✓".green().bold()),
            XattrOutcome::Unavailable => {
                println!("  {}", "xattr not available, attributes left as they are".dimmed());
            }
            XattrOutcome::Failed(code) => println!(
                "  {} xattr exited with status {}",
                "warning:".yellow(),
                code.map_or_else(|| "unknown".to_string(), |c| c.to_string())
            ),
        }
        Ok(())
    }
}
