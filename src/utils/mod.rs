//! Cross-platform utilities and helpers
//!
//! # Modules
//!
//! - [`fs`] - File copies that keep modification times, directory helpers
//! - [`progress`] - Download progress bars

pub mod fs;
pub mod progress;

pub use fs::{copy_file, ensure_dir, ensure_parent_dir, remove_dir_all};
pub use progress::{ProgressBar, ProgressStyle};
