//! Recursive input discovery

use crate::error::FsError;
use std::path::{Path, PathBuf};
use walkdir::{DirEntry, WalkDir};

/// File names written by desktop shells, never real inputs
const IGNORED_NAMES: [&str; 3] = [".DS_Store", "Thumbs.db", "desktop.ini"];

/// AppleDouble resource-fork prefix
const APPLE_DOUBLE_PREFIX: &str = "._";

fn is_os_metadata(entry: &DirEntry) -> bool {
    let name = entry.file_name().to_string_lossy();
    IGNORED_NAMES.contains(&name.as_ref()) || name.starts_with(APPLE_DOUBLE_PREFIX)
}

/// All regular files below `dir`, sorted.
///
/// Symlinks are not followed and OS metadata files are skipped. Unreadable
/// entries are logged and skipped.
pub fn collect_files_recursive(dir: &Path) -> Result<Vec<PathBuf>, FsError> {
    let metadata = std::fs::metadata(dir).map_err(|e| FsError::io(dir, e))?;
    if !metadata.is_dir() {
        return Err(FsError::NotADirectory(dir.to_path_buf()));
    }

    let mut files = Vec::new();
    for entry in WalkDir::new(dir).follow_links(false) {
        match entry {
            Ok(entry) => {
                if entry.file_type().is_file() && !is_os_metadata(&entry) {
                    files.push(entry.into_path());
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, "Error accessing entry");
            }
        }
    }

    tracing::debug!(dir = %dir.display(), count = files.len(), "Collected files");

    if files.is_empty() {
        return Err(FsError::EmptyResult(format!(
            "No files found in {}",
            dir.display()
        )));
    }

    files.sort();
    Ok(files)
}
