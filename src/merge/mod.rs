//! Smart merge of an extracted release onto the SD card.
//!
//! A release archive only contains the files it ships. Replacing whole
//! directories with it would wipe the user's mods, cheats and saves, so the
//! merge works file by file instead:
//!
//! | Source            | Destination          | Result                        |
//! |-------------------|----------------------|-------------------------------|
//! | directory         | missing              | created                       |
//! | directory         | directory            | descended into                |
//! | file              | missing or file      | written (source wins)         |
//! | (nothing)         | anything             | left untouched                |
//! | file / directory  | directory / file     | error                         |
//!
//! There is no content diffing and no conflict resolution beyond "the
//! archive wins at the leaf". An error aborts the merge midway; the caller is
//! expected to treat that as total failure and roll back.

use anyhow::{Context, Result};
use std::path::Path;
use tracing::{debug, info};
use walkdir::WalkDir;

use crate::utils::fs::{copy_file, ensure_dir};

/// Counters describing what a merge did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MergeStats {
    /// Files written that did not exist on the destination.
    pub files_added: usize,
    /// Files written over an existing destination file.
    pub files_replaced: usize,
    /// Directories created on the destination.
    pub dirs_created: usize,
    /// Total bytes written.
    pub bytes_written: u64,
}

impl MergeStats {
    pub fn files_written(&self) -> usize {
        self.files_added + self.files_replaced
    }
}

/// Strategy used by the installer to apply an extracted tree to a volume.
pub trait TreeMerger: Send + Sync {
    fn merge(&self, source: &Path, dest: &Path) -> Result<MergeStats>;
}

/// The default merge: overwrite-if-present, preserve-if-absent.
#[derive(Debug, Clone, Copy, Default)]
pub struct SmartMerge;

impl TreeMerger for SmartMerge {
    fn merge(&self, source: &Path, dest: &Path) -> Result<MergeStats> {
        merge(source, dest)
    }
}

/// Recursively copy `source` into `dest`, keeping everything in `dest` that
/// the source does not mention.
///
/// Entries are visited in file-name order. Symbolic links in the source are
/// followed, so a broken link fails the merge.
///
/// # Errors
///
/// Any I/O failure: unreadable source entries, broken links, a file whose
/// destination is a directory (or the reverse), permission or space
/// problems on the destination.
///
/// # Examples
///
/// ```rust,no_run
/// use switch_up::merge::merge;
/// use std::path::Path;
///
/// # fn example() -> anyhow::Result<()> {
/// let stats = merge(Path::new("/tmp/switch_up_x1y2"), Path::new("/Volumes/SWITCH"))?;
/// println!("{} files written", stats.files_written());
/// # Ok(())
/// # }
/// ```
pub fn merge(source: &Path, dest: &Path) -> Result<MergeStats> {
    info!("Merging {} into {}", source.display(), dest.display());
    ensure_dir(dest)?;

    let mut stats = MergeStats::default();
    for entry in WalkDir::new(source).min_depth(1).follow_links(true).sort_by_file_name() {
        let entry = entry
            .with_context(|| format!("Failed to read source tree: {}", source.display()))?;
        let relative = entry.path().strip_prefix(source).with_context(|| {
            format!("Entry {} is outside {}", entry.path().display(), source.display())
        })?;
        let target = dest.join(relative);

        if entry.file_type().is_dir() {
            if !target.exists() {
                stats.dirs_created += 1;
            }
            ensure_dir(&target)?;
        } else {
            let existed = target.is_file();
            let bytes = copy_file(entry.path(), &target)?;
            if existed {
                stats.files_replaced += 1;
                debug!("Replaced {}", relative.display());
            } else {
                stats.files_added += 1;
                debug!("Added {}", relative.display());
            }
            stats.bytes_written += bytes;
        }
    }

    info!(
        "Merge complete: {} added, {} replaced, {} directories created",
        stats.files_added, stats.files_replaced, stats.dirs_created
    );
    Ok(stats)
}
