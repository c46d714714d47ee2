//! Progress indicators for release downloads.
//!
//! Thin wrapper around `indicatif` with switch-up styling. Progress output is
//! hidden when the `SWITCH_UP_NO_PROGRESS` environment variable is set or when
//! the CLI was started with `--no-progress`, which keeps CI logs and piped
//! output clean.
//!
//! # Examples
//!
//! ```rust
//! use switch_up::utils::progress::ProgressBar;
//!
//! let progress = ProgressBar::download(4096);
//! progress.set_prefix("package3");
//! progress.inc(4096);
//! progress.finish_and_clear();
//! ```

use indicatif::{ProgressBar as IndicatifBar, ProgressStyle as IndicatifStyle};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use crate::constants::NO_PROGRESS_ENV;

static PROGRESS_DISABLED: AtomicBool = AtomicBool::new(false);

/// Disables (or re-enables) all progress bars created afterwards.
pub fn set_progress_disabled(disabled: bool) {
    PROGRESS_DISABLED.store(disabled, Ordering::Relaxed);
}

fn is_progress_disabled() -> bool {
    PROGRESS_DISABLED.load(Ordering::Relaxed) || std::env::var_os(NO_PROGRESS_ENV).is_some()
}

/// A progress bar with consistent styling.
///
/// When progress is disabled the underlying bar is hidden, so callers never
/// need to branch on it.
#[derive(Clone)]
pub struct ProgressBar {
    inner: IndicatifBar,
}

impl ProgressBar {
    /// Creates a progress bar counting bytes, for downloads.
    ///
    /// A length of zero means the server did not announce a size; the bar
    /// then renders as a spinner with a byte counter.
    pub fn download(len: u64) -> Self {
        if len == 0 {
            let bar = Self::styled(IndicatifBar::new_spinner(), ProgressStyle::download_spinner());
            bar.inner.enable_steady_tick(Duration::from_millis(100));
            bar
        } else {
            Self::styled(IndicatifBar::new(len), ProgressStyle::download())
        }
    }

    fn styled(bar: IndicatifBar, style: IndicatifStyle) -> Self {
        if is_progress_disabled() {
            return Self {
                inner: IndicatifBar::hidden(),
            };
        }
        bar.set_style(style);
        Self {
            inner: bar,
        }
    }

    pub fn set_prefix(&self, prefix: impl Into<String>) {
        self.inner.set_prefix(prefix.into());
    }

    pub fn inc(&self, delta: u64) {
        self.inner.inc(delta);
    }

    pub fn position(&self) -> u64 {
        self.inner.position()
    }

    pub fn finish_and_clear(&self) {
        self.inner.finish_and_clear();
    }
}

/// Predefined styles for switch-up progress indicators.
pub struct ProgressStyle;

impl ProgressStyle {
    pub fn download() -> IndicatifStyle {
        IndicatifStyle::default_bar()
            .template(
                "{prefix:.bold.cyan} [{bar:40.cyan/blue}] {bytes}/{total_bytes} {bytes_per_sec} ({eta})",
            )
            .unwrap_or_else(|_| IndicatifStyle::default_bar())
            .progress_chars("━╸━")
    }

    pub fn download_spinner() -> IndicatifStyle {
        IndicatifStyle::default_spinner()
            .template("{prefix:.bold.cyan} {spinner:.cyan} {bytes} {bytes_per_sec}")
            .unwrap_or_else(|_| IndicatifStyle::default_spinner())
    }
}
