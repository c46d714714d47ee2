//! Shared constants for switch-up.
//!
//! Paths, markers and names that several modules agree on live here so that a
//! change (for example a new critical config file) is a one-line edit.

/// Configuration files that must survive an install.
///
/// Paths are relative to the SD card root and are backed up, in this order,
/// before every install. They are restored automatically if the merge fails.
pub const CRITICAL_FILES: &[&str] = &[
    "hekate_ipl.ini",
    "exosphere.ini",
    "bootloader/hekate_ipl.ini",
    "atmosphere/config/system_settings.ini",
];

/// Top-level directories that identify a Switch SD card.
pub const SD_MARKERS: &[&str] = &["Nintendo", "bootloader"];

/// Default location where removable volumes are mounted (macOS).
pub const DEFAULT_MOUNT_ROOT: &str = "/Volumes";

/// Name of the per-user application directory under the home directory.
pub const APP_DIR_NAME: &str = ".switch-up";

/// Name of the backups directory inside [`APP_DIR_NAME`].
pub const BACKUPS_DIR_NAME: &str = "backups";

/// Timestamp format used to name backup directories (second resolution).
pub const BACKUP_TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

/// Prefix for temporary extraction and download directories.
pub const TEMP_DIR_PREFIX: &str = "switch_up_";

/// Default GitHub API endpoint for release lookups.
pub const DEFAULT_GITHUB_API: &str = "https://api.github.com";

/// Repository publishing Atmosphere releases.
pub const ATMOSPHERE_REPO: &str = "Atmosphere-NX/Atmosphere";

/// Repository publishing Hekate releases.
pub const HEKATE_REPO: &str = "CTCaer/hekate";

/// Default HTTP timeout for release lookups and downloads, in seconds.
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;

/// File names macOS injects next to regular files (resource forks start with `._`).
pub const APPLEDOUBLE_PREFIX: &str = "._";

/// Finder metadata file.
pub const DS_STORE: &str = ".DS_Store";

/// Directory created by Archive Utility when it extracts zips.
pub const MACOSX_DIR: &str = "__MACOSX";

/// Environment variable overriding the global config location.
pub const CONFIG_PATH_ENV: &str = "SWITCH_UP_CONFIG_PATH";

/// Environment variable disabling progress bars.
pub const NO_PROGRESS_ENV: &str = "SWITCH_UP_NO_PROGRESS";
