//! Size sanity checks across a batch of files

use crate::error::FsError;
use cutkit_common::byte_size::format_bytes;
use futures::stream::{self, StreamExt, TryStreamExt};
use serde::Serialize;
use std::path::PathBuf;

/// Concurrent metadata lookups in [`total_file_size`]
pub const SIZE_PROBE_CONCURRENCY: usize = 5;

/// Relative difference above which output and input totals are reported
pub const SIZE_TOLERANCE: f64 = 0.05;

/// Output total diverging from the input total
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SizeMismatch {
    pub input_total: u64,
    pub output_total: u64,
    /// `(output - input) / input`, infinite when input is zero
    pub relative_difference: f64,
    pub message: String,
}

/// Compare totals, flagging a relative difference above [`SIZE_TOLERANCE`].
///
/// An empty input only matches an empty output.
pub fn check_file_sizes(input_total: u64, output_total: u64) -> Option<SizeMismatch> {
    let relative_difference = if input_total == 0 {
        if output_total == 0 {
            return None;
        }
        f64::INFINITY
    } else {
        (output_total as f64 - input_total as f64) / input_total as f64
    };

    if relative_difference.abs() <= SIZE_TOLERANCE {
        return None;
    }

    let message = format!(
        "Output size {} differs from input size {}",
        format_bytes(output_total),
        format_bytes(input_total)
    );
    tracing::warn!(input_total, output_total, relative_difference, "{}", message);

    Some(SizeMismatch {
        input_total,
        output_total,
        relative_difference,
        message,
    })
}

/// Sum of file sizes, looked up [`SIZE_PROBE_CONCURRENCY`] at a time
pub async fn total_file_size(paths: &[PathBuf]) -> Result<u64, FsError> {
    let sizes: Vec<u64> = stream::iter(paths.iter().cloned())
        .map(|path| async move {
            tokio::fs::metadata(&path)
                .await
                .map(|m| m.len())
                .map_err(|e| FsError::io(&path, e))
        })
        .buffered(SIZE_PROBE_CONCURRENCY)
        .try_collect()
        .await?;

    Ok(sizes.into_iter().sum())
}
