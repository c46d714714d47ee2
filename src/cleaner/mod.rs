//! Removal of macOS metadata from the SD card.
//!
//! Finder and Archive Utility sprinkle `._*` AppleDouble files, `.DS_Store`
//! indexes and `__MACOSX/` directories over FAT32 volumes. Horizon and
//! Atmosphere choke on some of them (the "archive bit" problem), so they are
//! removed after every successful install and on demand with
//! `switch-up fix-archive-bit`.

use anyhow::{Context, Result, bail};
use std::fs;
use std::path::Path;
use std::process::Command;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::constants::{APPLEDOUBLE_PREFIX, DS_STORE, MACOSX_DIR};
use crate::utils::fs::remove_dir_all;

/// Collaborator that strips junk from a volume after a merge.
pub trait JunkCleaner: Send + Sync {
    /// Returns how many files and directories were removed.
    fn clean(&self, volume: &Path) -> Result<usize>;
}

/// Removes macOS junk files and clears extended attributes.
#[derive(Debug, Clone, Copy)]
pub struct MacJunkCleaner {
    clear_xattrs: bool,
}

impl Default for MacJunkCleaner {
    fn default() -> Self {
        Self {
            clear_xattrs: true,
        }
    }
}

impl MacJunkCleaner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether to run `xattr -cr` after removing files.
    pub fn clear_xattrs(mut self, enabled: bool) -> Self {
        self.clear_xattrs = enabled;
        self
    }
}

impl JunkCleaner for MacJunkCleaner {
    fn clean(&self, volume: &Path) -> Result<usize> {
        let removed = clean_macos_junk(volume)?;
        if self.clear_xattrs {
            match remove_xattrs(volume) {
                Ok(XattrOutcome::Failed(code)) => {
                    warn!("xattr exited with status {code:?}; some attributes may remain");
                }
                Ok(_) => {}
                Err(e) => warn!("Could not clear extended attributes: {e:#}"),
            }
        }
        Ok(removed)
    }
}

fn is_junk_file(name: &str) -> bool {
    name.starts_with(APPLEDOUBLE_PREFIX) || name == DS_STORE
}

/// Recursively delete `._*` files, `.DS_Store` files and `__MACOSX`
/// directories under `path`.
///
/// The walk is bottom-up, so junk files inside a `__MACOSX` directory are
/// counted before the directory itself.
///
/// # Returns
///
/// The number of files and directories removed.
///
/// # Errors
///
/// Fails if `path` is not a directory or if an entry cannot be removed.
pub fn clean_macos_junk(path: &Path) -> Result<usize> {
    if !path.is_dir() {
        bail!("Path is not a directory: {}", path.display());
    }

    let mut removed = 0usize;
    for entry in WalkDir::new(path).min_depth(1).contents_first(true) {
        let entry = entry.with_context(|| format!("Failed to scan {}", path.display()))?;
        let name = entry.file_name().to_string_lossy();

        if entry.file_type().is_dir() {
            if name == MACOSX_DIR {
                remove_dir_all(entry.path())?;
                debug!("Removed {}", entry.path().display());
                removed += 1;
            }
        } else if is_junk_file(&name) {
            fs::remove_file(entry.path())
                .with_context(|| format!("Failed to remove file: {}", entry.path().display()))?;
            debug!("Removed {}", entry.path().display());
            removed += 1;
        }
    }

    info!("Removed {removed} junk files/folders from {}", path.display());
    Ok(removed)
}

/// Result of clearing extended attributes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum XattrOutcome {
    Cleared,
    /// The `xattr` tool is not installed (non-macOS systems).
    Unavailable,
    /// `xattr` ran but exited unsuccessfully, with its exit code if any.
    Failed(Option<i32>),
}

/// Clear extended attributes from everything under `path` with `xattr -cr`.
///
/// # Errors
///
/// Fails if `path` is not a directory or the tool cannot be spawned.
pub fn remove_xattrs(path: &Path) -> Result<XattrOutcome> {
    if !path.is_dir() {
        bail!("Path is not a directory: {}", path.display());
    }

    let Ok(xattr) = which::which("xattr") else {
        debug!("xattr not found on PATH, skipping attribute cleanup");
        return Ok(XattrOutcome::Unavailable);
    };

    let output = Command::new(xattr)
        .arg("-cr")
        .arg(path)
        .output()
        .context("Failed to run xattr")?;

    if output.status.success() {
        Ok(XattrOutcome::Cleared)
    } else {
        debug!("xattr stderr: {}", String::from_utf8_lossy(&output.stderr));
        Ok(XattrOutcome::Failed(output.status.code()))
    }
}
