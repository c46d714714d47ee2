//! File system utilities used by the backup, merge and extraction code.
//!
//! Every write to the SD card goes through these helpers so that error
//! messages name the path involved and copies keep their modification time.
//!
//! # Examples
//!
//! ```rust,no_run
//! use switch_up::utils::fs::{copy_file, ensure_dir};
//! use std::path::Path;
//!
//! # fn example() -> anyhow::Result<()> {
//! ensure_dir(Path::new("backup/atmosphere/config"))?;
//! copy_file(
//!     Path::new("/Volumes/SWITCH/atmosphere/config/system_settings.ini"),
//!     Path::new("backup/atmosphere/config/system_settings.ini"),
//! )?;
//! # Ok(())
//! # }
//! ```

pub mod copy;
pub mod dirs;

pub use copy::copy_file;
pub use dirs::{ensure_dir, ensure_parent_dir, remove_dir_all};
