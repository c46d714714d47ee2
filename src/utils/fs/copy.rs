//! File copy helpers that keep modification metadata.
//!
//! Backups, restores and merges all go through [`copy_file`] so a file
//! written to the SD card looks the same whichever path wrote it: identical
//! bytes, permissions and modification time.

use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

use super::dirs::ensure_parent_dir;

/// Copies a single file, creating the destination's parent directories.
///
/// Content and permissions are copied by [`std::fs::copy`]; the source's
/// modification time is then applied to the destination. An existing file at
/// `dst` is replaced. Symbolic links at `src` are followed.
///
/// # Returns
///
/// The number of bytes copied.
///
/// # Errors
///
/// - `src` does not exist or is not readable (including broken symlinks)
/// - `dst` exists and is a directory
/// - the destination cannot be written
///
/// A read-only file at `dst` is made writable first, so the source always
/// wins.
pub fn copy_file(src: &Path, dst: &Path) -> Result<u64> {
    ensure_parent_dir(dst)?;
    make_writable(dst)?;

    let bytes = fs::copy(src, dst).with_context(|| {
        format!("Failed to copy file from {} to {}", src.display(), dst.display())
    })?;

    let modified = fs::metadata(src)
        .and_then(|meta| meta.modified())
        .with_context(|| format!("Failed to read modification time of {}", src.display()))?;
    // Read-only copies cannot be reopened for writing; a read handle is enough
    // to set timestamps on Unix.
    fs::OpenOptions::new()
        .write(true)
        .open(dst)
        .or_else(|_| fs::File::open(dst))
        .and_then(|file| file.set_modified(modified))
        .with_context(|| format!("Failed to set modification time on {}", dst.display()))?;

    Ok(bytes)
}

/// Clears the read-only bit of an existing regular file at `path`.
fn make_writable(path: &Path) -> Result<()> {
    let Ok(meta) = fs::symlink_metadata(path) else {
        return Ok(());
    };
    if !meta.is_file() || !meta.permissions().readonly() {
        return Ok(());
    }

    let mut permissions = meta.permissions();
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        permissions.set_mode(permissions.mode() | 0o200);
    }
    #[cfg(not(unix))]
    {
        #[allow(clippy::permissions_set_readonly_false)]
        permissions.set_readonly(false);
    }
    fs::set_permissions(path, permissions)
        .with_context(|| format!("Failed to make {} writable", path.display()))
}
