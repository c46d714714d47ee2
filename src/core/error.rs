//! User-facing error reporting for switch-up.
//!
//! Library modules return their own typed errors ([`InstallError`],
//! [`VolumeError`], [`ArchiveError`], [`ReleaseError`]) or `anyhow` errors
//! with context. At the CLI boundary [`user_friendly_error`] turns whatever
//! came back into an [`ErrorContext`]: a [`SwitchUpError`] plus optional
//! details and a suggestion the user can act on.
//!
//! # Example
//!
//! ```rust,no_run
//! use switch_up::core::user_friendly_error;
//!
//! # fn run() -> anyhow::Result<()> { Ok(()) }
//! if let Err(e) = run() {
//!     user_friendly_error(e).display();
//!     std::process::exit(1);
//! }
//! ```

use colored::Colorize;
use std::fmt;
use std::io;
use std::path::Path;
use thiserror::Error;

use crate::archive::ArchiveError;
use crate::installer::InstallError;
use crate::release::ReleaseError;
use crate::volume::VolumeError;

/// Error kinds shown to the user.
///
/// Variants carry display strings rather than source errors so that they
/// can be cloned and rendered without the original error.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SwitchUpError {
    #[error("SD card not found: {path}")]
    SdCardNotFound {
        path: String,
    },

    #[error("No Switch SD card detected under {mount_root}")]
    NoSdCardDetected {
        mount_root: String,
    },

    #[error("Multiple Switch SD cards detected: {candidates}")]
    MultipleSdCards {
        candidates: String,
    },

    #[error("Archive not found: {path}")]
    ArchiveNotFound {
        path: String,
    },

    #[error("Invalid archive {path}: {reason}")]
    InvalidArchive {
        path: String,
        reason: String,
    },

    #[error("Backup failed: {reason}")]
    BackupFailed {
        reason: String,
    },

    #[error("Backup '{name}' not found")]
    BackupNotFound {
        name: String,
    },

    #[error("Install failed while extracting: {reason}")]
    ExtractionFailed {
        reason: String,
    },

    #[error("Install failed, SD card configuration restored: {reason}")]
    InstallRolledBack {
        reason: String,
    },

    #[error("Install failed and the configuration backup could not be restored: {reason}")]
    RestoreFailed {
        reason: String,
    },

    #[error("Network error during {operation}: {reason}")]
    NetworkError {
        operation: String,
        reason: String,
    },

    #[error("No .zip asset in release {tag} of {repo}")]
    AssetNotFound {
        repo: String,
        tag: String,
    },

    #[error("Invalid configuration in {file}: {reason}")]
    ConfigParseError {
        file: String,
        reason: String,
    },

    #[error("Permission denied: {operation}")]
    PermissionDenied {
        operation: String,
    },

    #[error("{message}")]
    Other {
        message: String,
    },
}

/// An error with optional details and a suggested fix.
#[derive(Debug)]
pub struct ErrorContext {
    pub error: SwitchUpError,
    /// What to do about it
    pub suggestion: Option<String>,
    /// Why it happened
    pub details: Option<String>,
}

impl ErrorContext {
    #[must_use]
    pub const fn new(error: SwitchUpError) -> Self {
        Self {
            error,
            suggestion: None,
            details: None,
        }
    }

    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    /// Print to stderr: the error in red, details in yellow, the suggestion
    /// in green.
    pub fn display(&self) {
        eprintln!("{}: {}", "error".red().bold(), self.error);

        if let Some(details) = &self.details {
            eprintln!("{}: {}", "details".yellow(), details);
        }

        if let Some(suggestion) = &self.suggestion {
            eprintln!("{}: {}", "suggestion".green(), suggestion);
        }
    }
}

impl fmt::Display for ErrorContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.error)?;

        if let Some(details) = &self.details {
            write!(f, "\nDetails: {details}")?;
        }

        if let Some(suggestion) = &self.suggestion {
            write!(f, "\nSuggestion: {suggestion}")?;
        }

        Ok(())
    }
}

impl std::error::Error for ErrorContext {}

/// Convert any error into an [`ErrorContext`] for display.
///
/// Known error types get tailored suggestions; anything else is shown with
/// its full cause chain.
#[must_use]
pub fn user_friendly_error(error: anyhow::Error) -> ErrorContext {
    if let Some(e) = error.downcast_ref::<SwitchUpError>() {
        return create_error_context(e.clone());
    }

    if let Some(e) = error.downcast_ref::<InstallError>() {
        return install_error_context(e);
    }

    if let Some(e) = error.downcast_ref::<VolumeError>() {
        return volume_error_context(e);
    }

    if let Some(e) = error.downcast_ref::<ArchiveError>() {
        return archive_error_context(e);
    }

    if let Some(e) = error.downcast_ref::<ReleaseError>() {
        return release_error_context(e);
    }

    if let Some(toml_error) = error.downcast_ref::<toml::de::Error>() {
        return ErrorContext::new(SwitchUpError::ConfigParseError {
            file: "config.toml".to_string(),
            reason: toml_error.to_string(),
        })
        .with_suggestion("Check the TOML syntax in ~/.switch-up/config.toml or the file passed with --config");
    }

    let permission_denied =
        error.downcast_ref::<io::Error>().is_some_and(|e| e.kind() == io::ErrorKind::PermissionDenied);
    if permission_denied {
        return ErrorContext::new(SwitchUpError::PermissionDenied {
            operation: error.to_string(),
        })
        .with_suggestion("Check that the SD card is not write-protected and that you own the files")
        .with_details(chain_message(&error));
    }

    ErrorContext::new(SwitchUpError::Other {
        message: chain_message(&error),
    })
}

/// The error message followed by a numbered "Caused by" list.
fn chain_message(error: &anyhow::Error) -> String {
    let mut message = error.to_string();
    let chain: Vec<String> = error.chain().skip(1).map(ToString::to_string).collect();

    if !chain.is_empty() {
        message.push_str("\n\nCaused by:");
        for (i, cause) in chain.iter().enumerate() {
            message.push_str(&format!("\n  {}: {}", i + 1, cause));
        }
    }
    message
}

fn source_chain(error: &dyn std::error::Error) -> String {
    let mut parts = Vec::new();
    let mut current = error.source();
    while let Some(cause) = current {
        parts.push(cause.to_string());
        current = cause.source();
    }
    parts.join(": ")
}

fn manual_restore_hint(backup_dir: &Path) -> String {
    format!(
        "Copy the files from {} back onto the SD card, or run 'switch-up backups restore {}'",
        backup_dir.display(),
        backup_dir.file_name().map(|n| n.to_string_lossy().into_owned()).unwrap_or_default()
    )
}

fn install_error_context(error: &InstallError) -> ErrorContext {
    match error {
        InstallError::InvalidVolume {
            path,
        } => create_error_context(SwitchUpError::SdCardNotFound {
            path: path.display().to_string(),
        }),
        InstallError::ArchiveNotFound {
            path,
        } => create_error_context(SwitchUpError::ArchiveNotFound {
            path: path.display().to_string(),
        }),
        InstallError::Backup(source) => ErrorContext::new(SwitchUpError::BackupFailed {
            reason: format!("{source:#}"),
        })
        .with_details("Nothing on the SD card was changed")
        .with_suggestion("Check that the backup directory is writable and has free space"),
        InstallError::Extraction {
            source,
            ..
        } => archive_error_context(source).with_details("Nothing on the SD card was changed"),
        InstallError::MergeRolledBack {
            backup_dir,
            ..
        } => ErrorContext::new(SwitchUpError::InstallRolledBack {
            reason: source_chain(error),
        })
        .with_details(format!(
            "Critical configuration files were restored from {}. Other files from the archive may have been partially written.",
            backup_dir.display()
        ))
        .with_suggestion("Check free space on the SD card and run the install again"),
        InstallError::RestoreFailed {
            backup_dir,
            merge_error,
            restore_error,
        } => ErrorContext::new(SwitchUpError::RestoreFailed {
            reason: format!("{merge_error:#}"),
        })
        .with_details(format!("Restore error: {restore_error:#}"))
        .with_suggestion(manual_restore_hint(backup_dir)),
    }
}

fn volume_error_context(error: &VolumeError) -> ErrorContext {
    match error {
        VolumeError::NotFound {
            path,
        } => create_error_context(SwitchUpError::SdCardNotFound {
            path: path.display().to_string(),
        }),
        VolumeError::NoneDetected {
            mount_root,
        } => create_error_context(SwitchUpError::NoSdCardDetected {
            mount_root: mount_root.display().to_string(),
        }),
        VolumeError::Multiple {
            candidates,
            ..
        } => create_error_context(SwitchUpError::MultipleSdCards {
            candidates: candidates
                .iter()
                .map(|p| p.display().to_string())
                .collect::<Vec<_>>()
                .join(", "),
        }),
    }
}

fn archive_error_context(error: &ArchiveError) -> ErrorContext {
    match error {
        ArchiveError::NotFound {
            path,
        } => create_error_context(SwitchUpError::ArchiveNotFound {
            path: path.display().to_string(),
        }),
        ArchiveError::InvalidArchive {
            path,
            source,
        } => ErrorContext::new(SwitchUpError::InvalidArchive {
            path: path.display().to_string(),
            reason: source.to_string(),
        })
        .with_suggestion("The download may be incomplete. Download the release again"),
        ArchiveError::Extraction {
            source,
            ..
        } => ErrorContext::new(SwitchUpError::ExtractionFailed {
            reason: format!("{source:#}"),
        })
        .with_suggestion("Check free space in the system temporary directory"),
    }
}

fn release_error_context(error: &ReleaseError) -> ErrorContext {
    match error {
        ReleaseError::NoZipAsset {
            repo,
            tag,
        } => ErrorContext::new(SwitchUpError::AssetNotFound {
            repo: repo.clone(),
            tag: tag.clone(),
        })
        .with_suggestion("Download the archive manually and run 'switch-up install <ZIP>'"),
        other => {
            let cause = source_chain(other);
            let reason = if cause.is_empty() { other.to_string() } else { format!("{other}: {cause}") };
            ErrorContext::new(SwitchUpError::NetworkError {
                operation: "release lookup".to_string(),
                reason,
            })
            .with_suggestion(
                "Check your internet connection. GitHub limits unauthenticated API requests to 60 per hour",
            )
        }
    }
}

fn create_error_context(error: SwitchUpError) -> ErrorContext {
    match &error {
        SwitchUpError::SdCardNotFound {
            ..
        } => ErrorContext::new(error)
            .with_suggestion("Insert the SD card and pass its mount point with --sd-path"),
        SwitchUpError::NoSdCardDetected {
            ..
        } => ErrorContext::new(error)
            .with_details("A Switch SD card contains a 'Nintendo' or 'bootloader' folder")
            .with_suggestion("Mount the SD card or pass its path with --sd-path"),
        SwitchUpError::MultipleSdCards {
            ..
        } => ErrorContext::new(error)
            .with_suggestion("Choose one with --sd-path"),
        SwitchUpError::ArchiveNotFound {
            ..
        } => ErrorContext::new(error).with_suggestion("Check the path to the .zip file"),
        SwitchUpError::BackupNotFound {
            ..
        } => ErrorContext::new(error)
            .with_suggestion("Run 'switch-up backups list' to see available backups"),
        _ => ErrorContext::new(error),
    }
}
