//! Outcomes of a failed install.

use std::path::{Path, PathBuf};
use thiserror::Error;

use super::InstallStage;
use crate::archive::ArchiveError;

/// Why an install did not complete.
///
/// The variants are ordered by pipeline stage. Only the last two can leave
/// files on the volume different from before the install, and only
/// [`InstallError::RestoreFailed`] means the critical configuration may be
/// damaged.
#[derive(Error, Debug)]
pub enum InstallError {
    #[error("SD card path is not a directory: {}", path.display())]
    InvalidVolume {
        path: PathBuf,
    },

    #[error("Archive not found: {}", path.display())]
    ArchiveNotFound {
        path: PathBuf,
    },

    /// The backup could not be taken; the volume was not touched.
    #[error("Failed to back up critical configuration files")]
    Backup(#[source] anyhow::Error),

    /// The archive could not be unpacked; the volume was not touched.
    #[error("Failed to extract the update archive")]
    Extraction {
        backup_dir: PathBuf,
        #[source]
        source: ArchiveError,
    },

    /// The merge failed and the backed-up configuration was put back.
    #[error("Merge failed; configuration restored from {}", backup_dir.display())]
    MergeRolledBack {
        backup_dir: PathBuf,
        #[source]
        source: anyhow::Error,
    },

    /// The merge failed and so did the restore. Manual recovery from
    /// `backup_dir` is needed.
    #[error(
        "Merge failed and the backup could not be restored ({restore_error:#}); backup kept at {}",
        backup_dir.display()
    )]
    RestoreFailed {
        backup_dir: PathBuf,
        #[source]
        merge_error: anyhow::Error,
        restore_error: anyhow::Error,
    },
}

impl InstallError {
    /// True when the volume's critical files are known to be in a safe
    /// state: either untouched or restored.
    pub fn is_rolled_back(&self) -> bool {
        !matches!(self, Self::RestoreFailed { .. })
    }

    /// The backup taken for this install, if one was taken.
    pub fn backup_dir(&self) -> Option<&Path> {
        match self {
            Self::Extraction {
                backup_dir,
                ..
            }
            | Self::MergeRolledBack {
                backup_dir,
                ..
            }
            | Self::RestoreFailed {
                backup_dir,
                ..
            } => Some(backup_dir),
            Self::InvalidVolume {
                ..
            }
            | Self::ArchiveNotFound {
                ..
            }
            | Self::Backup(_) => None,
        }
    }

    /// The stage that failed, or `None` for a precondition failure.
    pub fn stage(&self) -> Option<InstallStage> {
        match self {
            Self::InvalidVolume {
                ..
            }
            | Self::ArchiveNotFound {
                ..
            } => None,
            Self::Backup(_) => Some(InstallStage::BackingUp),
            Self::Extraction {
                ..
            } => Some(InstallStage::Extracting),
            Self::MergeRolledBack {
                ..
            }
            | Self::RestoreFailed {
                ..
            } => Some(InstallStage::Merging),
        }
    }

    /// Whether anything on the volume may have been written.
    pub fn volume_modified(&self) -> bool {
        matches!(self, Self::MergeRolledBack { .. } | Self::RestoreFailed { .. })
    }
}
