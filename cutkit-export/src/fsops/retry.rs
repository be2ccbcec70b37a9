//! Retry with exponential backoff for filesystem mutations
//!
//! Deleting files and setting timestamps fail transiently on some systems when
//! another process (antivirus, indexer, preview handler) holds the file. Those
//! failures carry a small set of OS error codes; anything else is returned on
//! the first occurrence.
//!
//! **Algorithm:**
//! 1. Check cancellation, then attempt operation
//! 2. If successful, return value and retry count
//! 3. If the error code is retryable and retries remain: log WARN, back off, retry
//! 4. If retries are exhausted: log ERROR, return `FsError::OperationFailed`
//! 5. If the code is not retryable: return `FsError::Permanent` immediately
//!
//! **Backoff Strategy:** `min(min_delay * 2^n, max_delay)` for the n-th retry.
//! The wait is cancellable.

use crate::error::FsError;
use cutkit_common::config::RetryConfig;
use std::collections::HashSet;
use std::fmt;
use std::future::Future;
use std::io;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;

/// OS error classification relevant to retrying
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    /// Resource busy or locked (EBUSY, sharing/lock violation)
    Busy,
    /// Per-process descriptor limit (EMFILE)
    TooManyOpenFiles,
    /// System-wide descriptor limit (ENFILE)
    TooManyOpenFilesSystem,
    /// Operation not permitted (EPERM, access denied)
    NotPermitted,
    /// Any other raw OS code
    Other(i32),
    /// Error without an OS code
    Unknown,
}

#[cfg(unix)]
fn classify_raw(code: i32) -> ErrorCode {
    const EPERM: i32 = 1;
    const EBUSY: i32 = 16;
    const ENFILE: i32 = 23;
    const EMFILE: i32 = 24;

    match code {
        EBUSY => ErrorCode::Busy,
        EMFILE => ErrorCode::TooManyOpenFiles,
        ENFILE => ErrorCode::TooManyOpenFilesSystem,
        EPERM => ErrorCode::NotPermitted,
        other => ErrorCode::Other(other),
    }
}

#[cfg(windows)]
fn classify_raw(code: i32) -> ErrorCode {
    const ERROR_TOO_MANY_OPEN_FILES: i32 = 4;
    const ERROR_ACCESS_DENIED: i32 = 5;
    const ERROR_SHARING_VIOLATION: i32 = 32;
    const ERROR_LOCK_VIOLATION: i32 = 33;

    match code {
        ERROR_SHARING_VIOLATION | ERROR_LOCK_VIOLATION => ErrorCode::Busy,
        ERROR_TOO_MANY_OPEN_FILES => ErrorCode::TooManyOpenFiles,
        ERROR_ACCESS_DENIED => ErrorCode::NotPermitted,
        other => ErrorCode::Other(other),
    }
}

#[cfg(not(any(unix, windows)))]
fn classify_raw(code: i32) -> ErrorCode {
    ErrorCode::Other(code)
}

impl ErrorCode {
    /// Classify a raw OS error code for the host platform
    pub fn from_raw(code: i32) -> Self {
        classify_raw(code)
    }

    /// Classify an I/O error
    pub fn from_io(err: &io::Error) -> Self {
        match err.raw_os_error() {
            Some(code) => Self::from_raw(code),
            None => ErrorCode::Unknown,
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorCode::Busy => f.write_str("EBUSY"),
            ErrorCode::TooManyOpenFiles => f.write_str("EMFILE"),
            ErrorCode::TooManyOpenFilesSystem => f.write_str("ENFILE"),
            ErrorCode::NotPermitted => f.write_str("EPERM"),
            ErrorCode::Other(code) => write!(f, "os error {}", code),
            ErrorCode::Unknown => f.write_str("no os code"),
        }
    }
}

/// Codes known to be transient: busy, descriptor exhaustion, not permitted
pub fn canonical_retryable_codes() -> HashSet<ErrorCode> {
    [
        ErrorCode::Busy,
        ErrorCode::TooManyOpenFiles,
        ErrorCode::TooManyOpenFilesSystem,
        ErrorCode::NotPermitted,
    ]
    .into_iter()
    .collect()
}

/// Retry budget and backoff bounds for one call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries after the first attempt
    pub retries: u32,
    pub min_delay: Duration,
    pub max_delay: Duration,
    pub retryable: HashSet<ErrorCode>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from(&RetryConfig::default())
    }
}

impl From<&RetryConfig> for RetryPolicy {
    fn from(config: &RetryConfig) -> Self {
        Self {
            retries: config.retries,
            min_delay: Duration::from_millis(config.min_delay_ms),
            max_delay: Duration::from_millis(config.max_delay_ms),
            retryable: canonical_retryable_codes(),
        }
    }
}

impl RetryPolicy {
    pub fn is_retryable(&self, code: ErrorCode) -> bool {
        self.retryable.contains(&code)
    }

    /// Delay before retry number `retry` (0-based)
    pub fn delay_for(&self, retry: u32) -> Duration {
        let factor = 2u32.saturating_pow(retry.min(31));
        self.min_delay
            .checked_mul(factor)
            .unwrap_or(self.max_delay)
            .min(self.max_delay)
    }
}

/// Successful outcome plus the number of retries it took
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Retried<T> {
    pub value: T,
    pub retries: u32,
}

/// Run `op` until it succeeds, fails permanently, exhausts `policy`, or
/// `cancel` fires.
///
/// # Arguments
/// * `operation` - Description for logs and errors (e.g. "delete /tmp/x.mp4")
/// * `policy` - Retry budget and retryable codes
/// * `cancel` - Checked before each attempt and during each backoff wait
/// * `op` - Closure producing one attempt
pub async fn with_retry<F, Fut, T>(
    operation: &str,
    policy: &RetryPolicy,
    cancel: &CancellationToken,
    mut op: F,
) -> Result<Retried<T>, FsError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = io::Result<T>>,
{
    let start_time = Instant::now();
    let mut retries = 0u32;

    loop {
        if cancel.is_cancelled() {
            return Err(FsError::Cancelled {
                operation: operation.to_string(),
            });
        }

        if retries > 0 {
            tracing::debug!(operation, retry = retries, "Retrying filesystem operation");
        }

        match op().await {
            Ok(value) => {
                if retries > 0 {
                    tracing::debug!(
                        operation,
                        retries,
                        elapsed_ms = start_time.elapsed().as_millis(),
                        "Filesystem operation succeeded after retry"
                    );
                }
                return Ok(Retried { value, retries });
            }
            Err(err) => {
                let code = ErrorCode::from_io(&err);

                if !policy.is_retryable(code) {
                    return Err(FsError::Permanent {
                        operation: operation.to_string(),
                        code,
                        source: err,
                    });
                }

                if retries >= policy.retries {
                    tracing::error!(
                        operation,
                        attempts = retries + 1,
                        elapsed_ms = start_time.elapsed().as_millis(),
                        %code,
                        "Filesystem operation failed: retries exhausted"
                    );
                    return Err(FsError::OperationFailed {
                        operation: operation.to_string(),
                        attempts: retries + 1,
                        code,
                        source: err,
                    });
                }

                let backoff = policy.delay_for(retries);
                tracing::warn!(
                    operation,
                    attempt = retries + 1,
                    %code,
                    backoff_ms = backoff.as_millis(),
                    "Transient filesystem error, will retry after backoff"
                );

                tokio::select! {
                    _ = cancel.cancelled() => {
                        return Err(FsError::Cancelled {
                            operation: operation.to_string(),
                        });
                    }
                    _ = tokio::time::sleep(backoff) => {}
                }

                retries += 1;
            }
        }
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::io;

    /// An error the host classifies as `ErrorCode::Busy`
    pub fn busy_error() -> io::Error {
        #[cfg(windows)]
        return io::Error::from_raw_os_error(32);
        #[cfg(not(windows))]
        return io::Error::from_raw_os_error(16);
    }

    /// An error the host classifies as not retryable (ENOENT / ERROR_FILE_NOT_FOUND)
    pub fn not_found_error() -> io::Error {
        io::Error::from_raw_os_error(2)
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::test_support::{busy_error, not_found_error};
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn fast_policy(retries: u32) -> RetryPolicy {
        RetryPolicy {
            retries,
            min_delay: Duration::from_millis(1),
            max_delay: Duration::from_millis(4),
            retryable: canonical_retryable_codes(),
        }
    }

    #[test]
    fn test_error_code_classification() {
        assert_eq!(ErrorCode::from_io(&busy_error()), ErrorCode::Busy);
        assert_eq!(ErrorCode::from_raw(24), ErrorCode::TooManyOpenFiles);
        assert_eq!(ErrorCode::from_raw(23), ErrorCode::TooManyOpenFilesSystem);
        assert_eq!(ErrorCode::from_raw(1), ErrorCode::NotPermitted);
        assert_eq!(ErrorCode::from_io(&not_found_error()), ErrorCode::Other(2));
        assert_eq!(
            ErrorCode::from_io(&io::Error::new(io::ErrorKind::Other, "x")),
            ErrorCode::Unknown
        );
    }

    #[test]
    fn test_backoff_is_exponential_and_capped() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.delay_for(0), Duration::from_millis(100));
        assert_eq!(policy.delay_for(1), Duration::from_millis(200));
        assert_eq!(policy.delay_for(3), Duration::from_millis(800));
        assert_eq!(policy.delay_for(5), Duration::from_millis(2000));
        assert_eq!(policy.delay_for(40), Duration::from_millis(2000));
    }

    #[tokio::test]
    async fn test_succeeds_first_attempt() {
        let result = with_retry("test_op", &fast_policy(3), &CancellationToken::new(), || async {
            Ok::<i32, io::Error>(42)
        })
        .await
        .unwrap();

        assert_eq!(result, Retried { value: 42, retries: 0 });
    }

    #[tokio::test]
    async fn test_three_transient_failures_then_success() {
        let attempts = AtomicU32::new(0);

        let result = with_retry("test_op", &fast_policy(10), &CancellationToken::new(), || {
            let n = attempts.fetch_add(1, Ordering::SeqCst);
            async move {
                if n < 3 {
                    Err(busy_error())
                } else {
                    Ok(())
                }
            }
        })
        .await
        .unwrap();

        assert_eq!(result.retries, 3);
        assert_eq!(attempts.load(Ordering::SeqCst), 4);
    }

    #[tokio::test]
    async fn test_non_retryable_fails_immediately() {
        let attempts = AtomicU32::new(0);

        let result = with_retry("test_op", &fast_policy(10), &CancellationToken::new(), || {
            attempts.fetch_add(1, Ordering::SeqCst);
            async { Err::<(), io::Error>(not_found_error()) }
        })
        .await;

        assert!(matches!(result, Err(FsError::Permanent { code: ErrorCode::Other(2), .. })));
        assert_eq!(attempts.load(Ordering::SeqCst), 1); // Should not retry
    }

    #[tokio::test]
    async fn test_budget_exhausted() {
        let attempts = AtomicU32::new(0);

        let result = with_retry("test_op", &fast_policy(2), &CancellationToken::new(), || {
            attempts.fetch_add(1, Ordering::SeqCst);
            async { Err::<(), io::Error>(busy_error()) }
        })
        .await;

        match result {
            Err(FsError::OperationFailed { attempts: reported, code, .. }) => {
                assert_eq!(reported, 3);
                assert_eq!(code, ErrorCode::Busy);
            }
            other => panic!("Expected OperationFailed, got {:?}", other),
        }
        assert_eq!(attempts.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_cancelled_before_first_attempt() {
        let cancel = CancellationToken::new();
        cancel.cancel();
        let attempts = AtomicU32::new(0);

        let result = with_retry("test_op", &fast_policy(2), &cancel, || {
            attempts.fetch_add(1, Ordering::SeqCst);
            async { Ok::<(), io::Error>(()) }
        })
        .await;

        assert!(matches!(result, Err(FsError::Cancelled { .. })));
        assert_eq!(attempts.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_cancel_interrupts_backoff_wait() {
        let cancel = CancellationToken::new();
        let policy = RetryPolicy {
            retries: 5,
            min_delay: Duration::from_secs(60),
            max_delay: Duration::from_secs(60),
            retryable: canonical_retryable_codes(),
        };

        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            trigger.cancel();
        });

        let start = Instant::now();
        let result = with_retry("test_op", &policy, &cancel, || async {
            Err::<(), io::Error>(busy_error())
        })
        .await;

        assert!(matches!(result, Err(FsError::Cancelled { .. })));
        assert!(start.elapsed() < Duration::from_secs(30));
    }

    #[tokio::test]
    async fn test_custom_retryable_set() {
        let mut policy = fast_policy(3);
        policy.retryable.clear();

        let result = with_retry("test_op", &policy, &CancellationToken::new(), || async {
            Err::<(), io::Error>(busy_error())
        })
        .await;

        assert!(matches!(result, Err(FsError::Permanent { code: ErrorCode::Busy, .. })));
    }
}
