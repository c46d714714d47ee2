//! switch-up - safe firmware updates for Nintendo Switch SD cards
//!
//! Installs Atmosphere and Hekate release archives onto an SD card that
//! already holds the user's configuration, mods and saves, without
//! destroying any of it and without leaving the card half-updated if the
//! install fails partway through.
//!
//! # Architecture Overview
//!
//! Every install runs the same linear pipeline:
//!
//! 1. **Backup** the critical configuration files into a timestamped
//!    directory under `~/.switch-up/backups`
//! 2. **Extract** the archive into a private temporary directory
//! 3. **Merge** the extracted tree onto the card: files the archive ships
//!    are overwritten, everything else is left alone
//! 4. **Clean** macOS junk on success, or **restore** the backup if the merge
//!    failed
//!
//! The temporary directory is always removed, and a failed restore is
//! reported separately from a successful rollback so the user knows when
//! manual recovery is needed.
//!
//! # Core Modules
//!
//! ## Install Pipeline
//! - [`backup`] - Snapshots and restoration of critical configuration files
//! - [`merge`] - Overwrite-if-present, preserve-if-absent tree merge
//! - [`installer`] - Stage orchestration and rollback
//!
//! ## Collaborators
//! - [`archive`] - Zip extraction into temporary directories
//! - [`cleaner`] - Removal of `._*`, `.DS_Store` and `__MACOSX`
//! - [`volume`] - SD card detection under the mount root
//! - [`release`] - GitHub release lookup and download
//!
//! ## Supporting Modules
//! - [`cli`] - Command-line interface
//! - [`config`] - Global configuration (`~/.switch-up/config.toml`)
//! - [`core`] - User-facing error reporting
//! - [`constants`] - File sets, names and defaults
//! - [`utils`] - Filesystem helpers and progress bars
//!
//! # Command-Line Usage
//!
//! ```bash
//! # Install a downloaded release onto the detected SD card
//! switch-up install atmosphere-1.8.0-master.zip
//!
//! # Fetch and install the latest Atmosphere and Hekate
//! switch-up update --sd-path /Volumes/SWITCH
//!
//! # Something went wrong? Put a configuration backup back
//! switch-up backups list
//! switch-up backups restore 20250301_142210
//! ```

// Install pipeline
pub mod backup;
pub mod installer;
pub mod merge;

// Collaborators
pub mod archive;
pub mod cleaner;
pub mod release;
pub mod volume;

// Supporting modules
pub mod cli;
pub mod config;
pub mod constants;
pub mod core;
pub mod utils;

// test_utils module is available for both unit tests and integration tests
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
