//! User-wide configuration stored in `~/.switch-up/config.toml`.
//!
//! Every field has a default, so the file is optional and may contain only
//! the settings a user wants to change:
//!
//! ```toml
//! # Where SD cards get mounted
//! mount_root = "/Volumes"
//!
//! [backup]
//! dir = "~/Documents/switch-backups"
//! files = ["hekate_ipl.ini", "exosphere.ini", "bootloader/hekate_ipl.ini",
//!          "atmosphere/config/system_settings.ini"]
//!
//! [releases]
//! api_base = "https://api.github.com"
//! atmosphere_repo = "Atmosphere-NX/Atmosphere"
//! hekate_repo = "CTCaer/hekate"
//! timeout_secs = 30
//! ```

use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::debug;

use crate::backup::BackupManager;
use crate::constants::{
    APP_DIR_NAME, ATMOSPHERE_REPO, BACKUPS_DIR_NAME, CONFIG_PATH_ENV, CRITICAL_FILES,
    DEFAULT_GITHUB_API, DEFAULT_HTTP_TIMEOUT_SECS, DEFAULT_MOUNT_ROOT, HEKATE_REPO,
};

/// Global switch-up configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GlobalConfig {
    /// Directory scanned for mounted SD cards.
    pub mount_root: PathBuf,
    pub backup: BackupConfig,
    pub releases: ReleasesConfig,
}

impl Default for GlobalConfig {
    fn default() -> Self {
        Self {
            mount_root: PathBuf::from(DEFAULT_MOUNT_ROOT),
            backup: BackupConfig::default(),
            releases: ReleasesConfig::default(),
        }
    }
}

/// The `[backup]` table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BackupConfig {
    /// Backup root. `~` and environment variables are expanded.
    /// Unset means `~/.switch-up/backups`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dir: Option<String>,
    /// Files copied before every install, relative to the SD card root.
    pub files: Vec<String>,
}

impl Default for BackupConfig {
    fn default() -> Self {
        Self {
            dir: None,
            files: CRITICAL_FILES.iter().map(ToString::to_string).collect(),
        }
    }
}

/// The `[releases]` table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReleasesConfig {
    pub api_base: String,
    pub atmosphere_repo: String,
    pub hekate_repo: String,
    /// Connect and API request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for ReleasesConfig {
    fn default() -> Self {
        Self {
            api_base: DEFAULT_GITHUB_API.to_string(),
            atmosphere_repo: ATMOSPHERE_REPO.to_string(),
            hekate_repo: HEKATE_REPO.to_string(),
            timeout_secs: DEFAULT_HTTP_TIMEOUT_SECS,
        }
    }
}

impl GlobalConfig {
    /// Load from the default location, falling back to defaults when the
    /// file does not exist.
    ///
    /// # Errors
    ///
    /// Fails if the home directory cannot be determined or the file exists
    /// but cannot be read or parsed.
    pub async fn load() -> Result<Self> {
        Self::load_with_optional(None).await
    }

    /// Load from `path` if given, otherwise from [`default_path`].
    ///
    /// An explicitly given path that does not exist is an error; a missing
    /// file at the default path is not.
    ///
    /// [`default_path`]: GlobalConfig::default_path
    pub async fn load_with_optional(path: Option<PathBuf>) -> Result<Self> {
        match path {
            Some(path) => Self::load_from(&path).await,
            None => {
                let path = Self::default_path()?;
                if path.exists() {
                    Self::load_from(&path).await
                } else {
                    debug!("No config at {}, using defaults", path.display());
                    Ok(Self::default())
                }
            }
        }
    }

    /// Load from a specific file.
    ///
    /// # Examples
    ///
    /// ```rust,no_run
    /// use switch_up::config::GlobalConfig;
    /// use std::path::Path;
    ///
    /// # async fn example() -> anyhow::Result<()> {
    /// let config = GlobalConfig::load_from(Path::new("/custom/config.toml")).await?;
    /// println!("Backups go to {}", config.backup_root()?.display());
    /// # Ok(())
    /// # }
    /// ```
    pub async fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read config from {}", path.display()))?;

        toml::from_str(&content)
            .with_context(|| format!("Failed to parse config from {}", path.display()))
    }

    /// Write the configuration as pretty TOML, creating parent directories.
    pub async fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await.with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let content = toml::to_string_pretty(self).context("Failed to serialize config")?;
        fs::write(path, content)
            .await
            .with_context(|| format!("Failed to write config to {}", path.display()))
    }

    /// `$SWITCH_UP_CONFIG_PATH` if set, otherwise `~/.switch-up/config.toml`.
    pub fn default_path() -> Result<PathBuf> {
        if let Some(path) = std::env::var_os(CONFIG_PATH_ENV) {
            return Ok(PathBuf::from(path));
        }
        Ok(app_dir()?.join("config.toml"))
    }

    /// The backup root: `[backup] dir` expanded, or `~/.switch-up/backups`.
    pub fn backup_root(&self) -> Result<PathBuf> {
        match &self.backup.dir {
            Some(dir) => {
                let expanded = shellexpand::full(dir)
                    .with_context(|| format!("Failed to expand backup directory '{dir}'"))?;
                Ok(PathBuf::from(expanded.as_ref()))
            }
            None => Ok(app_dir()?.join(BACKUPS_DIR_NAME)),
        }
    }

    /// A [`BackupManager`] for the configured root and file set.
    pub fn backup_manager(&self) -> Result<BackupManager> {
        Ok(BackupManager::new(self.backup_root()?).with_files(&self.backup.files))
    }
}

/// `~/.switch-up`
fn app_dir() -> Result<PathBuf> {
    let home = dirs::home_dir().ok_or_else(|| anyhow!("Unable to determine home directory"))?;
    Ok(home.join(APP_DIR_NAME))
}
