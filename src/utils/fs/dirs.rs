//! Directory operations for creating and removing directories.

use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

/// Ensures a directory exists, creating it and all parent directories if necessary.
///
/// # Returns
///
/// - `Ok(())` if the directory exists or was successfully created
/// - `Err` if the path exists but is not a directory, or creation fails
///
/// # Examples
///
/// ```rust,no_run
/// use switch_up::utils::fs::ensure_dir;
/// use std::path::Path;
///
/// # fn example() -> anyhow::Result<()> {
/// ensure_dir(Path::new("/Volumes/SWITCH/atmosphere/config"))?;
/// # Ok(())
/// # }
/// ```
pub fn ensure_dir(path: &Path) -> Result<()> {
    if !path.exists() {
        fs::create_dir_all(path)
            .with_context(|| format!("Failed to create directory: {}", path.display()))?;
    } else if !path.is_dir() {
        return Err(anyhow::anyhow!("Path exists but is not a directory: {}", path.display()));
    }
    Ok(())
}

/// Ensures that the parent directory of a file path exists.
///
/// Paths without a parent (bare file names, filesystem roots) are accepted as-is.
pub fn ensure_parent_dir(path: &Path) -> Result<()> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => ensure_dir(parent)?,
        _ => {}
    }
    Ok(())
}

/// Recursively removes a directory and all its contents.
///
/// Missing directories are not an error, which makes this safe for cleanup
/// paths that may run after a partial failure.
pub fn remove_dir_all(path: &Path) -> Result<()> {
    if path.exists() {
        fs::remove_dir_all(path)
            .with_context(|| format!("Failed to remove directory: {}", path.display()))?;
    }
    Ok(())
}
