//! Install orchestration: backup, extract, merge, and roll back on failure.
//!
//! An install moves through a fixed sequence of stages:
//!
//! ```text
//! BackingUp -> Extracting -> Merging -+-> Cleaning  -+-> Done
//!                                     +-> Restoring -+
//! ```
//!
//! Preconditions (volume is a directory, archive is a file) are checked
//! before the first stage, so a bad invocation never creates a backup.
//! A failed backup or extraction leaves the volume untouched. A failed merge
//! triggers a restore of the backup, and the outcome of that restore
//! decides between [`InstallError::MergeRolledBack`] and
//! [`InstallError::RestoreFailed`].
//!
//! The temporary extraction directory is discarded once the merge (and
//! cleanup or restore) has finished, whatever the outcome. A failure to
//! remove it is logged and never changes the result.
//!
//! Every collaborator is a trait object so that failure at any stage can be
//! injected in tests. [`Installer::new`] wires up the real implementations.
//!
//! # Example
//!
//! ```rust,no_run
//! use switch_up::backup::BackupManager;
//! use switch_up::installer::Installer;
//! use std::path::Path;
//!
//! let installer = Installer::new(BackupManager::new("/home/me/.switch-up/backups"));
//! match installer.install(Path::new("atmosphere-1.8.0.zip"), Path::new("/Volumes/SWITCH")) {
//!     Ok(report) => println!("{} files written", report.merge.files_written()),
//!     Err(e) if e.is_rolled_back() => eprintln!("Install failed, SD card restored: {e}"),
//!     Err(e) => eprintln!("Install failed: {e}"),
//! }
//! ```

mod error;

pub use error::InstallError;

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{error, info, warn};

use crate::archive::{ArchiveExtractor, ZipExtractor};
use crate::backup::BackupManager;
use crate::cleaner::{JunkCleaner, MacJunkCleaner};
use crate::merge::{MergeStats, SmartMerge, TreeMerger};

/// A stage of the install pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InstallStage {
    BackingUp,
    Extracting,
    Merging,
    Cleaning,
    Restoring,
    Done,
}

impl fmt::Display for InstallStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::BackingUp => "Backing up configuration",
            Self::Extracting => "Extracting archive",
            Self::Merging => "Merging files",
            Self::Cleaning => "Removing macOS junk",
            Self::Restoring => "Restoring backup",
            Self::Done => "Done",
        };
        f.write_str(label)
    }
}

/// Receives stage transitions as an install progresses.
pub trait InstallObserver: Send + Sync {
    fn stage_started(&self, stage: InstallStage) {
        let _ = stage;
    }
}

struct SilentObserver;

impl InstallObserver for SilentObserver {}

/// What a successful install did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallReport {
    /// Backup taken before the merge.
    pub backup_dir: PathBuf,
    pub merge: MergeStats,
    /// Junk items removed after the merge, or `None` if cleanup failed.
    pub junk_removed: Option<usize>,
}

/// Runs the install pipeline against one volume.
pub struct Installer {
    backups: BackupManager,
    extractor: Box<dyn ArchiveExtractor>,
    merger: Box<dyn TreeMerger>,
    cleaner: Box<dyn JunkCleaner>,
    observer: Arc<dyn InstallObserver>,
}

impl Installer {
    /// An installer using zip extraction, the smart merge and macOS junk
    /// cleanup.
    pub fn new(backups: BackupManager) -> Self {
        Self {
            backups,
            extractor: Box::new(ZipExtractor),
            merger: Box::new(SmartMerge),
            cleaner: Box::new(MacJunkCleaner::new()),
            observer: Arc::new(SilentObserver),
        }
    }

    pub fn with_extractor(mut self, extractor: Box<dyn ArchiveExtractor>) -> Self {
        self.extractor = extractor;
        self
    }

    pub fn with_merger(mut self, merger: Box<dyn TreeMerger>) -> Self {
        self.merger = merger;
        self
    }

    pub fn with_cleaner(mut self, cleaner: Box<dyn JunkCleaner>) -> Self {
        self.cleaner = cleaner;
        self
    }

    pub fn with_observer(mut self, observer: Arc<dyn InstallObserver>) -> Self {
        self.observer = observer;
        self
    }

    pub fn backup_manager(&self) -> &BackupManager {
        &self.backups
    }

    /// Install `archive` onto `volume`.
    ///
    /// # Errors
    ///
    /// See [`InstallError`]. Every error except
    /// [`InstallError::RestoreFailed`] leaves the critical configuration
    /// files as they were before the call.
    pub fn install(&self, archive: &Path, volume: &Path) -> Result<InstallReport, InstallError> {
        if !volume.is_dir() {
            return Err(InstallError::InvalidVolume {
                path: volume.to_path_buf(),
            });
        }
        if !archive.is_file() {
            return Err(InstallError::ArchiveNotFound {
                path: archive.to_path_buf(),
            });
        }
        info!("Installing {} onto {}", archive.display(), volume.display());

        self.enter(InstallStage::BackingUp);
        let backup_dir = self.backups.create_backup(volume).map_err(InstallError::Backup)?;

        self.enter(InstallStage::Extracting);
        let extracted =
            self.extractor.extract(archive).map_err(|source| InstallError::Extraction {
                backup_dir: backup_dir.clone(),
                source,
            })?;

        self.enter(InstallStage::Merging);
        let outcome = match self.merger.merge(extracted.root(), volume) {
            Ok(merge) => {
                self.enter(InstallStage::Cleaning);
                let junk_removed = match self.cleaner.clean(volume) {
                    Ok(count) => Some(count),
                    Err(e) => {
                        warn!("Cleanup after install failed: {e:#}");
                        None
                    }
                };
                Ok(InstallReport {
                    backup_dir,
                    merge,
                    junk_removed,
                })
            }
            Err(merge_error) => {
                error!("Merge failed: {merge_error:#}");
                self.enter(InstallStage::Restoring);
                Err(self.roll_back(volume, backup_dir, merge_error))
            }
        };

        extracted.discard();
        self.enter(InstallStage::Done);
        outcome
    }

    fn roll_back(
        &self,
        volume: &Path,
        backup_dir: PathBuf,
        merge_error: anyhow::Error,
    ) -> InstallError {
        match self.backups.restore_backup(&backup_dir, volume) {
            Ok(()) => {
                info!("Configuration restored from {}", backup_dir.display());
                InstallError::MergeRolledBack {
                    backup_dir,
                    source: merge_error,
                }
            }
            Err(restore_error) => {
                error!(
                    "Restoring {} failed: {restore_error:#}. Copy the files back manually.",
                    backup_dir.display()
                );
                InstallError::RestoreFailed {
                    backup_dir,
                    merge_error,
                    restore_error,
                }
            }
        }
    }

    fn enter(&self, stage: InstallStage) {
        self.observer.stage_started(stage);
    }
}
