//! Copying file timestamps from an input to a derived output
//!
//! Whether a file's modification time marks the *start* or the *end* of its
//! recording differs between cameras and tools. The output's times are shifted
//! so they keep meaning the same thing relative to the cut range:
//!
//! | input is start | output is start | output time                    |
//! |----------------|-----------------|--------------------------------|
//! | yes            | yes             | `t + cut_from`                 |
//! | no             | no              | `t - duration + cut_to`        |
//! | yes            | no              | `t + cut_to`                   |
//! | no             | yes             | `t - duration + cut_from`      |
//!
//! Timestamps are cosmetic: failures are logged and never returned.

use super::retry::{with_retry, Retried, RetryPolicy};
use crate::error::FsError;
use std::fs::{FileTimes, OpenOptions};
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tokio_util::sync::CancellationToken;

/// Parameters for [`transfer_timestamps`]
#[derive(Debug, Clone)]
pub struct TimestampTransfer {
    pub in_path: PathBuf,
    pub out_path: PathBuf,
    /// Cut-in point in seconds
    pub cut_from: f64,
    /// Cut-out point in seconds
    pub cut_to: f64,
    /// Duration of the whole input in seconds
    pub duration: f64,
    pub treat_input_as_start: bool,
    /// `None` disables the transfer
    pub treat_output_as_start: Option<bool>,
}

/// Shift `file_time` (seconds since the epoch) onto the output
pub fn transferred_time(
    file_time: f64,
    cut_from: f64,
    cut_to: f64,
    duration: f64,
    treat_input_as_start: bool,
    treat_output_as_start: bool,
) -> f64 {
    match (treat_input_as_start, treat_output_as_start) {
        (true, true) => file_time + cut_from,
        (false, false) => file_time - duration + cut_to,
        (true, false) => file_time + cut_to,
        (false, true) => file_time - duration + cut_from,
    }
}

/// Seconds since the epoch, negative before 1970
pub fn system_time_to_secs(time: SystemTime) -> f64 {
    match time.duration_since(UNIX_EPOCH) {
        Ok(d) => d.as_secs_f64(),
        Err(e) => -e.duration().as_secs_f64(),
    }
}

/// Inverse of [`system_time_to_secs`]
pub fn secs_to_system_time(secs: f64) -> SystemTime {
    if !secs.is_finite() {
        return UNIX_EPOCH;
    }
    let magnitude = Duration::from_secs_f64(secs.abs());
    if secs >= 0.0 {
        UNIX_EPOCH.checked_add(magnitude).unwrap_or(UNIX_EPOCH)
    } else {
        UNIX_EPOCH.checked_sub(magnitude).unwrap_or(UNIX_EPOCH)
    }
}

fn set_file_times(path: &Path, accessed: SystemTime, modified: SystemTime) -> std::io::Result<()> {
    let mut options = OpenOptions::new();
    // setting times on Windows needs write access to the handle
    if cfg!(windows) {
        options.write(true);
    } else {
        options.read(true);
    }
    let file = options.open(path)?;
    file.set_times(FileTimes::new().set_accessed(accessed).set_modified(modified))
}

/// Set access and modification times, retrying transient failures
pub async fn utimes_with_retry(
    path: &Path,
    accessed: SystemTime,
    modified: SystemTime,
    policy: &RetryPolicy,
    cancel: &CancellationToken,
) -> Result<Retried<()>, FsError> {
    let operation = format!("set timestamps on {}", path.display());
    with_retry(&operation, policy, cancel, || {
        let path = path.to_path_buf();
        async move {
            tokio::task::spawn_blocking(move || set_file_times(&path, accessed, modified))
                .await
                .map_err(std::io::Error::other)?
        }
    })
    .await
}

/// Apply the input's shifted access/modify times to the output.
///
/// Does nothing when `treat_output_as_start` is `None`.
pub async fn transfer_timestamps(
    transfer: &TimestampTransfer,
    policy: &RetryPolicy,
    cancel: &CancellationToken,
) {
    let Some(treat_output_as_start) = transfer.treat_output_as_start else {
        return;
    };

    let metadata = match tokio::fs::metadata(&transfer.in_path).await {
        Ok(m) => m,
        Err(e) => {
            tracing::error!(
                path = %transfer.in_path.display(),
                error = %e,
                "Failed to read input timestamps"
            );
            return;
        }
    };

    let (accessed, modified) = match (metadata.accessed(), metadata.modified()) {
        (Ok(a), Ok(m)) => (a, m),
        (Err(e), _) | (_, Err(e)) => {
            tracing::error!(
                path = %transfer.in_path.display(),
                error = %e,
                "Input timestamps unavailable on this platform"
            );
            return;
        }
    };

    let shift = |time: SystemTime| {
        secs_to_system_time(transferred_time(
            system_time_to_secs(time),
            transfer.cut_from,
            transfer.cut_to,
            transfer.duration,
            transfer.treat_input_as_start,
            treat_output_as_start,
        ))
    };

    if let Err(e) = utimes_with_retry(
        &transfer.out_path,
        shift(accessed),
        shift(modified),
        policy,
        cancel,
    )
    .await
    {
        tracing::error!(
            path = %transfer.out_path.display(),
            error = %e,
            "Failed to set output file modified time"
        );
    }
}
