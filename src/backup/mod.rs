//! Backup and restoration of critical SD card configuration.
//!
//! Before an archive is merged onto the SD card, the files listed in
//! [`CRITICAL_FILES`](crate::constants::CRITICAL_FILES) are copied into a new
//! timestamped directory under the backup root (by default
//! `~/.switch-up/backups`). If the merge fails, the installer copies them
//! back so the console still boots with the user's configuration.
//!
//! # Backup Layout
//!
//! ```text
//! ~/.switch-up/backups/
//! ├── 20250301_142210/
//! │   ├── hekate_ipl.ini
//! │   ├── exosphere.ini
//! │   └── atmosphere/config/system_settings.ini
//! └── 20250301_142210_1/      # second install within the same second
//! ```
//!
//! Backups are append-only: the manager never prunes old snapshots.

use anyhow::{Context, Result, bail};
use chrono::{Local, NaiveDateTime};
use serde::Serialize;
use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};
use tracing::{debug, info};

use crate::constants::{BACKUP_TIMESTAMP_FORMAT, CRITICAL_FILES};
use crate::core::SwitchUpError;
use crate::utils::fs::{copy_file, ensure_dir};

/// Manages snapshots of critical configuration files.
///
/// The backup root is passed in explicitly rather than read from a global, so
/// tests (and users with a custom config) can point it anywhere.
///
/// # Examples
///
/// ```rust,no_run
/// use switch_up::backup::BackupManager;
/// use std::path::Path;
///
/// # fn example() -> anyhow::Result<()> {
/// let manager = BackupManager::new("/home/me/.switch-up/backups");
/// let sd = Path::new("/Volumes/SWITCH");
///
/// let backup_dir = manager.create_backup(sd)?;
/// // ... something went wrong ...
/// manager.restore_backup(&backup_dir, sd)?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct BackupManager {
    /// Directory holding one subdirectory per backup.
    root: PathBuf,
    /// Relative paths copied by each backup.
    files: Vec<PathBuf>,
}

impl BackupManager {
    /// Creates a manager writing under `root`, backing up [`CRITICAL_FILES`].
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            files: CRITICAL_FILES.iter().map(PathBuf::from).collect(),
        }
    }

    /// Replaces the set of files that are backed up.
    pub fn with_files<I, P>(mut self, files: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        self.files = files.into_iter().map(Into::into).collect();
        self
    }

    /// Directory under which backups are created.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Relative paths covered by each backup, in backup order.
    pub fn files(&self) -> &[PathBuf] {
        &self.files
    }

    /// Snapshot the critical files of `volume` into a new backup directory.
    ///
    /// Files missing from the volume are skipped; a volume without any of them
    /// produces an empty backup directory. The volume itself is not
    /// validated beyond reading from it.
    ///
    /// # Returns
    ///
    /// The path of the newly created backup directory.
    ///
    /// # Errors
    ///
    /// Any I/O failure while creating the directory or copying a file. A
    /// partially written backup is left on disk but must not be trusted.
    pub fn create_backup(&self, volume: &Path) -> Result<PathBuf> {
        let backup_dir = self.claim_backup_dir()?;
        info!("Backing up configuration from {} to {}", volume.display(), backup_dir.display());

        let mut copied = 0usize;
        for relative in &self.files {
            let source = volume.join(relative);
            if !source.is_file() {
                debug!("Skipping {}: not present on volume", relative.display());
                continue;
            }
            copy_file(&source, &backup_dir.join(relative))
                .with_context(|| format!("Failed to back up {}", relative.display()))?;
            debug!("Backed up {}", relative.display());
            copied += 1;
        }

        info!("Backup complete: {copied} file(s) saved");
        Ok(backup_dir)
    }

    /// Copy every file present in `backup_dir` back onto `volume`.
    ///
    /// Files on the volume without a counterpart in the backup are left alone,
    /// and running the restore twice leaves the volume exactly as running it
    /// once does.
    ///
    /// # Errors
    ///
    /// Fails if `backup_dir` is not a directory or if any copy fails.
    pub fn restore_backup(&self, backup_dir: &Path, volume: &Path) -> Result<()> {
        if !backup_dir.is_dir() {
            bail!("No backup found at {}", backup_dir.display());
        }
        info!("Restoring configuration from {} to {}", backup_dir.display(), volume.display());

        for relative in &self.files {
            let source = backup_dir.join(relative);
            if !source.is_file() {
                continue;
            }
            copy_file(&source, &volume.join(relative))
                .with_context(|| format!("Failed to restore {}", relative.display()))?;
            debug!("Restored {}", relative.display());
        }

        Ok(())
    }

    /// List existing backups, newest first.
    ///
    /// A missing backup root simply means no backups have been made yet.
    pub fn list_backups(&self) -> Result<Vec<BackupEntry>> {
        if !self.root.exists() {
            return Ok(Vec::new());
        }

        let mut entries = Vec::new();
        for entry in fs::read_dir(&self.root)
            .with_context(|| format!("Failed to read backup directory: {}", self.root.display()))?
        {
            let entry = entry?;
            if !entry.file_type()?.is_dir() {
                continue;
            }
            entries.push(self.describe(entry.path()));
        }

        // Timestamped names sort chronologically; suffixed names sort after their base.
        entries.sort_by(|a, b| b.name.cmp(&a.name));
        Ok(entries)
    }

    /// Look up a backup by directory name.
    ///
    /// # Errors
    ///
    /// [`SwitchUpError::BackupNotFound`] if `name` is not a directory directly
    /// under the backup root.
    pub fn find_backup(&self, name: &str) -> Result<BackupEntry> {
        let mut components = Path::new(name).components();
        let single_normal =
            matches!((components.next(), components.next()), (Some(Component::Normal(_)), None));
        let path = self.root.join(name);
        if !single_normal || name.contains(['/', '\\']) || !path.is_dir() {
            return Err(SwitchUpError::BackupNotFound {
                name: name.to_string(),
            }
            .into());
        }
        Ok(self.describe(path))
    }

    fn describe(&self, path: PathBuf) -> BackupEntry {
        let name = path.file_name().map(|n| n.to_string_lossy().into_owned()).unwrap_or_default();
        let files = self.files.iter().filter(|rel| path.join(rel).is_file()).cloned().collect();
        BackupEntry {
            created_at: parse_backup_timestamp(&name),
            name,
            path,
            files,
        }
    }

    /// Create a fresh, uniquely named backup directory.
    ///
    /// `create_dir` (not `create_dir_all`) is the claim: if another install
    /// already took this second's name, a `_N` suffix is tried next.
    fn claim_backup_dir(&self) -> Result<PathBuf> {
        ensure_dir(&self.root)?;
        let stamp = Local::now().format(BACKUP_TIMESTAMP_FORMAT).to_string();

        let mut suffix = 0u32;
        loop {
            let name = if suffix == 0 { stamp.clone() } else { format!("{stamp}_{suffix}") };
            let candidate = self.root.join(name);
            match fs::create_dir(&candidate) {
                Ok(()) => return Ok(candidate),
                Err(e) if e.kind() == io::ErrorKind::AlreadyExists => suffix += 1,
                Err(e) => {
                    return Err(e).with_context(|| {
                        format!("Failed to create backup directory: {}", candidate.display())
                    });
                }
            }
        }
    }
}

/// A backup directory found under the backup root.
#[derive(Debug, Clone, Serialize)]
pub struct BackupEntry {
    /// Directory name, e.g. `20250301_142210`.
    pub name: String,
    pub path: PathBuf,
    /// Creation time parsed from the name, if it follows the timestamp format.
    pub created_at: Option<NaiveDateTime>,
    /// Critical files present in this backup.
    pub files: Vec<PathBuf>,
}

fn parse_backup_timestamp(name: &str) -> Option<NaiveDateTime> {
    // Strip a collision suffix such as `_1`
    let stamp = name.get(..15).unwrap_or(name);
    NaiveDateTime::parse_from_str(stamp, BACKUP_TIMESTAMP_FORMAT).ok()
}
