//! DVD `VIDEO_TS` title set discovery

use crate::error::FsError;
use once_cell::sync::Lazy;
use regex::Regex;
use std::path::{Path, PathBuf};

/// `VTS_<title>_<part>.VOB`; part 0 is the title set's menu
static VOB_RE: Lazy<Option<Regex>> = Lazy::new(|| Regex::new(r"(?i)^VTS_\d+_(\d+)\.VOB$").ok());

fn is_title_part(file_name: &str) -> bool {
    VOB_RE
        .as_ref()
        .and_then(|re| re.captures(file_name))
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse::<u32>().ok())
        .is_some_and(|part| part != 0)
}

/// Title-set VOB files in a `VIDEO_TS` directory, menus excluded, sorted by name
pub async fn read_video_ts(dir: &Path) -> Result<Vec<PathBuf>, FsError> {
    let mut entries = tokio::fs::read_dir(dir)
        .await
        .map_err(|e| FsError::io(dir, e))?;

    let mut parts = Vec::new();
    while let Some(entry) = entries.next_entry().await.map_err(|e| FsError::io(dir, e))? {
        let name = entry.file_name();
        if is_title_part(&name.to_string_lossy()) {
            parts.push(entry.path());
        }
    }

    if parts.is_empty() {
        return Err(FsError::EmptyResult(format!(
            "No VTS_*.VOB title files in {}",
            dir.display()
        )));
    }

    parts.sort();
    tracing::debug!(dir = %dir.display(), count = parts.len(), "Found VIDEO_TS parts");
    Ok(parts)
}
