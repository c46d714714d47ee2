//! Test utilities for switch-up
//!
//! Fixtures that build fake SD cards and update archives on disk, plus a
//! one-time tracing initializer. Available to unit tests and, through the
//! `test-utils` feature, to the integration test suite.
//!
//! # Example
//!
//! ```rust,no_run
//! use switch_up::test_utils::{SdCardFixture, ZipFixture};
//!
//! let temp = tempfile::tempdir().unwrap();
//! let sd = SdCardFixture::new(temp.path()).unwrap();
//! let zip = ZipFixture::new()
//!     .file("atmosphere/package3", b"new_package3_data")
//!     .write_to(&temp.path().join("ams.zip"))
//!     .unwrap();
//! ```

pub mod fixtures;

pub use fixtures::{SdCardFixture, USER_MOD_PATH, ZipFixture};

use std::sync::Once;
use tracing::Level;
use tracing_subscriber::EnvFilter;

/// Global flag to ensure logging is only initialized once in tests
static INIT_LOGGING: Once = Once::new();

/// Initialize logging for tests.
///
/// Respects `RUST_LOG` when set, otherwise uses `level`. With neither, tests
/// run silently.
///
/// ```bash
/// RUST_LOG=switch_up=debug cargo test
/// ```
pub fn init_test_logging(level: Option<Level>) {
    INIT_LOGGING.call_once(|| {
        let filter = if let Some(level) = level {
            EnvFilter::new(level.to_string())
        } else if std::env::var("RUST_LOG").is_ok() {
            EnvFilter::from_default_env()
        } else {
            return;
        };

        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .with_target(true)
            .try_init();
    });
}
