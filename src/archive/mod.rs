//! Extraction of release archives into temporary directories.
//!
//! The installer never merges straight out of a zip: the archive is unpacked
//! into a private temporary directory first, so a corrupt archive is
//! detected before anything on the SD card changes.
//!
//! [`ExtractedArchive`] owns that directory. [`ExtractedArchive::discard`]
//! removes it and logs (rather than returns) any failure; if the guard is
//! dropped without being discarded, for example while unwinding from a
//! panic, the directory is still removed.

use anyhow::Context;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info, warn};
use zip::ZipArchive;

use crate::constants::TEMP_DIR_PREFIX;
use crate::utils::fs::{ensure_dir, ensure_parent_dir};

/// Errors raised while extracting an archive.
#[derive(Error, Debug)]
pub enum ArchiveError {
    #[error("Archive not found: {}", path.display())]
    NotFound {
        path: PathBuf,
    },

    #[error("Not a valid ZIP file: {}", path.display())]
    InvalidArchive {
        path: PathBuf,
        #[source]
        source: zip::result::ZipError,
    },

    #[error("Failed to extract {}", path.display())]
    Extraction {
        path: PathBuf,
        #[source]
        source: anyhow::Error,
    },
}

/// Collaborator that unpacks an archive for the installer.
pub trait ArchiveExtractor: Send + Sync {
    fn extract(&self, archive: &Path) -> Result<ExtractedArchive, ArchiveError>;
}

/// A temporary directory holding an unpacked archive.
#[derive(Debug)]
pub struct ExtractedArchive {
    dir: tempfile::TempDir,
    entries: usize,
}

impl ExtractedArchive {
    /// Wraps an already populated temporary directory.
    pub fn new(dir: tempfile::TempDir, entries: usize) -> Self {
        Self {
            dir,
            entries,
        }
    }

    /// Creates an empty extraction directory in the system temp location.
    pub fn create() -> io::Result<Self> {
        let dir = tempfile::Builder::new().prefix(TEMP_DIR_PREFIX).tempdir()?;
        Ok(Self::new(dir, 0))
    }

    /// Root of the unpacked tree.
    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    /// Number of entries (files and directories) written.
    pub fn entries(&self) -> usize {
        self.entries
    }

    /// Removes the directory. Failures are logged, never returned: losing a
    /// few megabytes of temp space must not change an install's outcome.
    pub fn discard(self) {
        let path = self.dir.path().to_path_buf();
        match self.dir.close() {
            Ok(()) => debug!("Removed temporary directory {}", path.display()),
            Err(e) => warn!("Failed to remove temporary directory {}: {}", path.display(), e),
        }
    }
}

/// Extracts `.zip` archives.
#[derive(Debug, Clone, Copy, Default)]
pub struct ZipExtractor;

impl ArchiveExtractor for ZipExtractor {
    fn extract(&self, archive: &Path) -> Result<ExtractedArchive, ArchiveError> {
        extract_zip(archive)
    }
}

/// Unpack `archive` into a fresh temporary directory.
///
/// # Errors
///
/// - [`ArchiveError::NotFound`] if `archive` is not a regular file
/// - [`ArchiveError::InvalidArchive`] if it is not a readable zip
/// - [`ArchiveError::Extraction`] for I/O failures while writing entries
pub fn extract_zip(archive: &Path) -> Result<ExtractedArchive, ArchiveError> {
    let mut zip = open_zip(archive)?;
    let extraction_error = |source: anyhow::Error| ArchiveError::Extraction {
        path: archive.to_path_buf(),
        source,
    };

    let mut extracted = ExtractedArchive::create()
        .context("Failed to create temporary extraction directory")
        .map_err(extraction_error)?;
    extracted.entries = unpack(&mut zip, extracted.root()).map_err(extraction_error)?;

    info!(
        "Extracted {} entries from {} to {}",
        extracted.entries,
        archive.display(),
        extracted.root().display()
    );
    Ok(extracted)
}

/// Unpack `archive` into an existing (or to-be-created) directory.
///
/// The caller owns `dest`; nothing is cleaned up on failure.
pub fn extract_zip_to(archive: &Path, dest: &Path) -> Result<usize, ArchiveError> {
    let mut zip = open_zip(archive)?;
    unpack(&mut zip, dest).map_err(|source| ArchiveError::Extraction {
        path: archive.to_path_buf(),
        source,
    })
}

fn open_zip(archive: &Path) -> Result<ZipArchive<fs::File>, ArchiveError> {
    if !archive.is_file() {
        return Err(ArchiveError::NotFound {
            path: archive.to_path_buf(),
        });
    }
    let file = fs::File::open(archive).map_err(|e| ArchiveError::Extraction {
        path: archive.to_path_buf(),
        source: anyhow::Error::new(e).context("Failed to open archive"),
    })?;
    ZipArchive::new(file).map_err(|source| ArchiveError::InvalidArchive {
        path: archive.to_path_buf(),
        source,
    })
}

fn unpack(zip: &mut ZipArchive<fs::File>, dest: &Path) -> anyhow::Result<usize> {
    ensure_dir(dest)?;

    let mut written = 0usize;
    for index in 0..zip.len() {
        let mut entry =
            zip.by_index(index).with_context(|| format!("Failed to read entry {index}"))?;

        // enclosed_name rejects absolute paths and `..` components
        let Some(relative) = entry.enclosed_name() else {
            warn!("Skipping archive entry with unsafe path: {}", entry.name());
            continue;
        };
        let target = dest.join(relative);

        if entry.is_dir() {
            ensure_dir(&target)?;
        } else {
            ensure_parent_dir(&target)?;
            let mut out = fs::File::create(&target)
                .with_context(|| format!("Failed to create {}", target.display()))?;
            // Stored unix modes are not applied; files keep default permissions
            io::copy(&mut entry, &mut out)
                .with_context(|| format!("Failed to write {}", target.display()))?;
        }
        written += 1;
    }

    Ok(written)
}
