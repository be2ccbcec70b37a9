//! Filesystem helpers around export writes

pub mod batch;
pub mod collect;
pub mod delete;
pub mod retry;
pub mod timestamps;
pub mod video_ts;

pub use batch::{check_file_sizes, total_file_size, SizeMismatch};
pub use collect::collect_files_recursive;
pub use delete::{delete_files, unlink_with_retry, DeleteReport, TrashCan};
pub use retry::{with_retry, ErrorCode, Retried, RetryPolicy};
pub use timestamps::{transfer_timestamps, utimes_with_retry, TimestampTransfer};
pub use video_ts::read_video_ts;
