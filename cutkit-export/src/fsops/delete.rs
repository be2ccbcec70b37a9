//! Deleting files: move to trash first, unlink as a fallback

use super::retry::{with_retry, Retried, RetryPolicy};
use crate::error::FsError;
use serde::Serialize;
use std::io;
use std::path::{Path, PathBuf};
use tokio_util::sync::CancellationToken;

/// Platform move-to-trash capability, supplied by the host application
pub trait TrashCan: Send + Sync {
    fn trash(&self, path: &Path) -> io::Result<()>;
}

/// Per-path outcome of [`delete_files`]
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DeleteReport {
    pub trashed: Vec<PathBuf>,
    pub deleted: Vec<PathBuf>,
    /// Path plus rendered error
    pub failed: Vec<(PathBuf, String)>,
}

impl DeleteReport {
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Remove a file, retrying transient failures
pub async fn unlink_with_retry(
    path: &Path,
    policy: &RetryPolicy,
    cancel: &CancellationToken,
) -> Result<Retried<()>, FsError> {
    let operation = format!("delete {}", path.display());
    with_retry(&operation, policy, cancel, || tokio::fs::remove_file(path)).await
}

/// Delete `paths`, trying the trash first.
///
/// A path whose trashing fails (or when no trash is available) is unlinked
/// only if `delete_if_trash_fails` is set. Individual failures are collected
/// in the report; cancellation aborts the whole batch.
pub async fn delete_files(
    paths: &[PathBuf],
    trash: Option<&dyn TrashCan>,
    delete_if_trash_fails: bool,
    policy: &RetryPolicy,
    cancel: &CancellationToken,
) -> Result<DeleteReport, FsError> {
    let mut report = DeleteReport::default();

    for path in paths {
        if cancel.is_cancelled() {
            return Err(FsError::Cancelled {
                operation: format!("delete {}", path.display()),
            });
        }

        let trash_error = match trash {
            Some(can) => match can.trash(path) {
                Ok(()) => {
                    tracing::debug!(path = %path.display(), "Moved to trash");
                    report.trashed.push(path.clone());
                    continue;
                }
                Err(e) => e.to_string(),
            },
            None => "no trash available".to_string(),
        };

        if !delete_if_trash_fails {
            tracing::warn!(
                path = %path.display(),
                error = %trash_error,
                "Trash failed, not deleting"
            );
            report.failed.push((path.clone(), trash_error));
            continue;
        }

        tracing::info!(path = %path.display(), reason = %trash_error, "Deleting permanently");
        match unlink_with_retry(path, policy, cancel).await {
            Ok(_) => report.deleted.push(path.clone()),
            Err(e @ FsError::Cancelled { .. }) => return Err(e),
            Err(e) => {
                tracing::error!(path = %path.display(), error = %e, "Delete failed");
                report.failed.push((path.clone(), e.to_string()));
            }
        }
    }

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    struct RecordingTrash {
        fail: bool,
        seen: Mutex<Vec<PathBuf>>,
    }

    impl TrashCan for RecordingTrash {
        fn trash(&self, path: &Path) -> io::Result<()> {
            if self.fail {
                return Err(io::Error::new(io::ErrorKind::Unsupported, "trash unavailable"));
            }
            self.seen.lock().unwrap().push(path.to_path_buf());
            std::fs::remove_file(path)
        }
    }

    fn policy() -> RetryPolicy {
        RetryPolicy {
            retries: 2,
            min_delay: std::time::Duration::from_millis(1),
            max_delay: std::time::Duration::from_millis(2),
            ..RetryPolicy::default()
        }
    }

    #[tokio::test]
    async fn test_unlink_missing_file_is_permanent() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope");
        let result = unlink_with_retry(&missing, &policy(), &CancellationToken::new()).await;
        assert!(matches!(result, Err(FsError::Permanent { .. })));
    }

    #[tokio::test]
    async fn test_trash_used_when_available() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("a.mp4");
        std::fs::write(&file, b"x").unwrap();
        let trash = RecordingTrash {
            fail: false,
            seen: Mutex::new(Vec::new()),
        };

        let cancel = CancellationToken::new();
        let report = delete_files(&[file.clone()], Some(&trash), false, &policy(), &cancel)
            .await
            .unwrap();

        assert_eq!(report.trashed, vec![file.clone()]);
        assert!(report.deleted.is_empty());
        assert_eq!(trash.seen.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_failed_trash_falls_back_to_unlink() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("b.mp4");
        std::fs::write(&file, b"x").unwrap();
        let trash = RecordingTrash {
            fail: true,
            seen: Mutex::new(Vec::new()),
        };

        let cancel = CancellationToken::new();
        let report = delete_files(&[file.clone()], Some(&trash), true, &policy(), &cancel)
            .await
            .unwrap();

        assert_eq!(report.deleted, vec![file.clone()]);
        assert!(!file.exists());
        assert!(report.is_complete());
    }

    #[tokio::test]
    async fn test_failed_trash_without_permission_to_delete() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("c.mp4");
        std::fs::write(&file, b"x").unwrap();

        let cancel = CancellationToken::new();
        let report = delete_files(&[file.clone()], None, false, &policy(), &cancel)
            .await
            .unwrap();

        assert_eq!(report.failed.len(), 1);
        assert!(file.exists());
    }

    #[tokio::test]
    async fn test_cancelled_batch() {
        let cancel = CancellationToken::new();
        cancel.cancel();
        let result = delete_files(&[PathBuf::from("/x")], None, true, &policy(), &cancel).await;
        assert!(matches!(result, Err(FsError::Cancelled { .. })));
    }
}
