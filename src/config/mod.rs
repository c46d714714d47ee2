//! Configuration for switch-up.
//!
//! There is a single user-wide file, `~/.switch-up/config.toml`, described in
//! [`global`]. Its location can be overridden with `--config` or the
//! `SWITCH_UP_CONFIG_PATH` environment variable. Nothing is stored on the SD
//! card itself.

pub mod global;

pub use global::{BackupConfig, GlobalConfig, ReleasesConfig};
