//! Latest-release lookup and archive download from GitHub.
//!
//! Atmosphere and Hekate both publish their SD card packages as `.zip`
//! assets on GitHub releases. [`ReleaseClient`] asks the releases API for
//! the latest release of a repository, and [`find_zip_asset`] picks the
//! package out of its assets. [`ReleaseClient::download_asset`] streams it
//! to disk with a progress bar.
//!
//! No retries are attempted and downloads are not resumable.

use reqwest::Url;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info};

use crate::config::ReleasesConfig;
use crate::utils::progress::ProgressBar;

const USER_AGENT: &str = concat!("switch-up/", env!("CARGO_PKG_VERSION"));

/// Errors from the release API or a download.
#[derive(Error, Debug)]
pub enum ReleaseError {
    #[error("Failed to create HTTP client")]
    Client(#[source] reqwest::Error),

    #[error("Request to {url} failed")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{url} returned HTTP {status}")]
    Status {
        url: String,
        status: u16,
    },

    #[error("Unexpected response from {url}")]
    InvalidResponse {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Release {tag} of {repo} has no .zip asset")]
    NoZipAsset {
        repo: String,
        tag: String,
    },

    #[error("Failed to write {}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// A GitHub release, as returned by the releases API.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct Release {
    pub tag_name: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub assets: Vec<Asset>,
}

/// A file attached to a release.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct Asset {
    pub name: String,
    pub browser_download_url: String,
    #[serde(default)]
    pub size: u64,
}

/// The first asset whose name ends in `.zip`, if any.
pub fn find_zip_asset(release: &Release) -> Option<&Asset> {
    release.assets.iter().find(|asset| asset.name.to_ascii_lowercase().ends_with(".zip"))
}

/// HTTP client for the GitHub releases API.
pub struct ReleaseClient {
    http: reqwest::Client,
    api_base: String,
    timeout: Duration,
}

impl ReleaseClient {
    /// Build a client talking to `api_base` (for example
    /// `https://api.github.com`).
    ///
    /// `timeout` bounds connecting and API calls. Downloads only have the
    /// connect timeout, since release archives can be large.
    pub fn new(api_base: impl Into<String>, timeout: Duration) -> Result<Self, ReleaseError> {
        let http = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .connect_timeout(timeout)
            .build()
            .map_err(ReleaseError::Client)?;
        Ok(Self::with_http_client(http, api_base, timeout))
    }

    pub fn from_config(config: &ReleasesConfig) -> Result<Self, ReleaseError> {
        Self::new(config.api_base.clone(), Duration::from_secs(config.timeout_secs))
    }

    /// Use an already configured `reqwest` client.
    pub fn with_http_client(
        http: reqwest::Client,
        api_base: impl Into<String>,
        timeout: Duration,
    ) -> Self {
        let api_base: String = api_base.into();
        Self {
            http,
            api_base: api_base.trim_end_matches('/').to_string(),
            timeout,
        }
    }

    /// Fetch the latest release of `repo` (`owner/name`).
    pub async fn get_latest_release(&self, repo: &str) -> Result<Release, ReleaseError> {
        let url = format!("{}/repos/{}/releases/latest", self.api_base, repo);
        debug!("Fetching {url}");

        let response = self
            .http
            .get(&url)
            .header(reqwest::header::ACCEPT, "application/vnd.github+json")
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|source| ReleaseError::Request {
                url: url.clone(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(ReleaseError::Status {
                url,
                status: status.as_u16(),
            });
        }

        let release: Release = response.json().await.map_err(|source| {
            ReleaseError::InvalidResponse {
                url: url.clone(),
                source,
            }
        })?;
        info!("Latest release of {repo}: {}", release.tag_name);
        Ok(release)
    }

    /// Fetch the latest release of `repo` and return its `.zip` asset.
    pub async fn latest_zip_asset(&self, repo: &str) -> Result<(Release, Asset), ReleaseError> {
        let release = self.get_latest_release(repo).await?;
        let asset = find_zip_asset(&release).cloned().ok_or_else(|| ReleaseError::NoZipAsset {
            repo: repo.to_string(),
            tag: release.tag_name.clone(),
        })?;
        Ok((release, asset))
    }

    /// Stream `url` into `dest_dir`, named after the last URL path segment.
    ///
    /// # Returns
    ///
    /// The path of the downloaded file.
    pub async fn download_asset(&self, url: &str, dest_dir: &Path) -> Result<PathBuf, ReleaseError> {
        let dest = dest_dir.join(download_file_name(url));
        info!("Downloading {url} to {}", dest.display());

        let mut response =
            self.http.get(url).send().await.map_err(|source| ReleaseError::Request {
                url: url.to_string(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(ReleaseError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let write_error = |source| ReleaseError::Write {
            path: dest.clone(),
            source,
        };
        let mut file = tokio::fs::File::create(&dest).await.map_err(write_error)?;

        let progress = ProgressBar::download(response.content_length().unwrap_or(0));
        if let Some(name) = dest.file_name() {
            progress.set_prefix(name.to_string_lossy());
        }

        while let Some(chunk) =
            response.chunk().await.map_err(|source| ReleaseError::InvalidResponse {
                url: url.to_string(),
                source,
            })?
        {
            file.write_all(&chunk).await.map_err(write_error)?;
            progress.inc(chunk.len() as u64);
        }
        file.flush().await.map_err(write_error)?;

        let downloaded = progress.position();
        progress.finish_and_clear();
        info!("Downloaded {downloaded} bytes");
        Ok(dest)
    }
}

/// File name for a download: the last non-empty path segment of `url`.
fn download_file_name(url: &str) -> String {
    Url::parse(url)
        .ok()
        .and_then(|u| u.path_segments().and_then(|mut s| s.next_back().map(str::to_string)))
        .filter(|name| !name.is_empty())
        .unwrap_or_else(|| "download.zip".to_string())
}
