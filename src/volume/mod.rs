//! Locating the Switch SD card among mounted volumes.
//!
//! A directory is considered a Switch SD card when it contains a `Nintendo/`
//! folder (created by Horizon) or a `bootloader/` folder (created by Hekate).
//! Detection only looks at the immediate children of the mount root, which
//! is `/Volumes` on macOS unless configured otherwise.

use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

use crate::constants::SD_MARKERS;

/// Errors raised while resolving the target volume.
#[derive(Error, Debug)]
pub enum VolumeError {
    /// An explicitly supplied path does not exist or is not a directory.
    #[error("SD card path not found: {}", path.display())]
    NotFound {
        path: PathBuf,
    },

    #[error("No Switch SD card detected under {}", mount_root.display())]
    NoneDetected {
        mount_root: PathBuf,
    },

    #[error("Multiple Switch SD cards detected under {}", mount_root.display())]
    Multiple {
        mount_root: PathBuf,
        candidates: Vec<PathBuf>,
    },
}

/// Returns true if `path` looks like a Switch SD card.
pub fn detect_sd_path(path: &Path) -> bool {
    path.is_dir() && SD_MARKERS.iter().any(|marker| path.join(marker).is_dir())
}

/// List every SD card mounted directly under `mount_root`, sorted by path.
///
/// An unreadable or missing mount root yields an empty list.
pub fn find_sd_volumes(mount_root: &Path) -> Vec<PathBuf> {
    let Ok(entries) = fs::read_dir(mount_root) else {
        debug!("Mount root {} is not readable", mount_root.display());
        return Vec::new();
    };

    let mut volumes: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| detect_sd_path(path))
        .collect();
    volumes.sort();
    debug!("Found {} SD card candidate(s) under {}", volumes.len(), mount_root.display());
    volumes
}

/// Pick the volume an operation should run against.
///
/// An explicit path wins but must be an existing directory; it is not
/// required to carry the SD markers, so a freshly formatted card can be
/// targeted. Without one, exactly one detected card must be mounted.
///
/// # Errors
///
/// - [`VolumeError::NotFound`] if `explicit` is not a directory
/// - [`VolumeError::NoneDetected`] if no card is mounted
/// - [`VolumeError::Multiple`] if more than one card is mounted
pub fn resolve_sd_path(
    explicit: Option<PathBuf>,
    mount_root: &Path,
) -> Result<PathBuf, VolumeError> {
    if let Some(path) = explicit {
        if !path.is_dir() {
            return Err(VolumeError::NotFound {
                path,
            });
        }
        return Ok(path);
    }

    let mut candidates = find_sd_volumes(mount_root);
    match candidates.len() {
        0 => Err(VolumeError::NoneDetected {
            mount_root: mount_root.to_path_buf(),
        }),
        1 => Ok(candidates.remove(0)),
        _ => Err(VolumeError::Multiple {
            mount_root: mount_root.to_path_buf(),
            candidates,
        }),
    }
}
