//! Integration tests for the filesystem helpers
//!
//! All tests work inside scratch directories from `tempfile`.

use cutkit_export::fsops::timestamps::{secs_to_system_time, system_time_to_secs};
use cutkit_export::fsops::{
    check_file_sizes, collect_files_recursive, delete_files, read_video_ts, total_file_size,
    transfer_timestamps, unlink_with_retry, RetryPolicy, TimestampTransfer,
};
use cutkit_export::FsError;
use std::fs::{self, FileTimes};
use std::path::Path;
use std::time::Duration;
use tempfile::TempDir;
use tokio_util::sync::CancellationToken;

fn fast_policy() -> RetryPolicy {
    RetryPolicy {
        retries: 3,
        min_delay: Duration::from_millis(1),
        max_delay: Duration::from_millis(5),
        ..RetryPolicy::default()
    }
}

fn write_file(path: &Path, len: usize) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, vec![0u8; len]).unwrap();
}

fn set_times(path: &Path, secs: f64) {
    let time = secs_to_system_time(secs);
    let file = fs::OpenOptions::new().write(true).open(path).unwrap();
    file.set_times(FileTimes::new().set_accessed(time).set_modified(time))
        .unwrap();
}

fn modified_secs(path: &Path) -> f64 {
    system_time_to_secs(fs::metadata(path).unwrap().modified().unwrap())
}

#[tokio::test]
async fn test_unlink_removes_file() {
    let temp = TempDir::new().unwrap();
    let file = temp.path().join("cut.mp4");
    write_file(&file, 4);

    let outcome = unlink_with_retry(&file, &fast_policy(), &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(outcome.retries, 0);
    assert!(!file.exists());
}

#[tokio::test]
async fn test_delete_files_reports_each_path() {
    let temp = TempDir::new().unwrap();
    let present = temp.path().join("a.mp4");
    let missing = temp.path().join("gone.mp4");
    write_file(&present, 1);

    let report = delete_files(
        &[present.clone(), missing.clone()],
        None,
        true,
        &fast_policy(),
        &CancellationToken::new(),
    )
    .await
    .unwrap();

    assert_eq!(report.deleted, vec![present]);
    assert_eq!(report.failed.len(), 1);
    assert_eq!(report.failed[0].0, missing);
}

#[tokio::test]
async fn test_transfer_timestamps_start_to_start() {
    let temp = TempDir::new().unwrap();
    let input = temp.path().join("in.mp4");
    let output = temp.path().join("out.mp4");
    write_file(&input, 1);
    write_file(&output, 1);
    set_times(&input, 1_600_000_000.0);

    let transfer = TimestampTransfer {
        in_path: input,
        out_path: output.clone(),
        cut_from: 5.0,
        cut_to: 20.0,
        duration: 50.0,
        treat_input_as_start: true,
        treat_output_as_start: Some(true),
    };
    transfer_timestamps(&transfer, &fast_policy(), &CancellationToken::new()).await;

    assert!((modified_secs(&output) - 1_600_000_005.0).abs() < 0.01);
}

#[tokio::test]
async fn test_transfer_timestamps_end_to_end() {
    let temp = TempDir::new().unwrap();
    let input = temp.path().join("in.mp4");
    let output = temp.path().join("out.mp4");
    write_file(&input, 1);
    write_file(&output, 1);
    set_times(&input, 1_600_000_000.0);

    let transfer = TimestampTransfer {
        in_path: input,
        out_path: output.clone(),
        cut_from: 5.0,
        cut_to: 20.0,
        duration: 50.0,
        treat_input_as_start: false,
        treat_output_as_start: Some(false),
    };
    transfer_timestamps(&transfer, &fast_policy(), &CancellationToken::new()).await;

    assert!((modified_secs(&output) - 1_599_999_970.0).abs() < 0.01);
}

#[tokio::test]
async fn test_transfer_disabled_leaves_output_alone() {
    let temp = TempDir::new().unwrap();
    let input = temp.path().join("in.mp4");
    let output = temp.path().join("out.mp4");
    write_file(&input, 1);
    write_file(&output, 1);
    set_times(&input, 1_000_000_000.0);
    set_times(&output, 1_500_000_000.0);

    let transfer = TimestampTransfer {
        in_path: input,
        out_path: output.clone(),
        cut_from: 0.0,
        cut_to: 1.0,
        duration: 1.0,
        treat_input_as_start: true,
        treat_output_as_start: None,
    };
    transfer_timestamps(&transfer, &fast_policy(), &CancellationToken::new()).await;

    assert!((modified_secs(&output) - 1_500_000_000.0).abs() < 0.01);
}

#[tokio::test]
async fn test_transfer_missing_input_is_not_fatal() {
    let temp = TempDir::new().unwrap();
    let transfer = TimestampTransfer {
        in_path: temp.path().join("missing.mp4"),
        out_path: temp.path().join("also-missing.mp4"),
        cut_from: 0.0,
        cut_to: 1.0,
        duration: 1.0,
        treat_input_as_start: true,
        treat_output_as_start: Some(true),
    };

    // Logs and returns
    transfer_timestamps(&transfer, &fast_policy(), &CancellationToken::new()).await;
}

#[tokio::test]
async fn test_merge_size_check() {
    let temp = TempDir::new().unwrap();
    let parts: Vec<_> = (1..=3).map(|i| temp.path().join(format!("part{}.mp4", i))).collect();
    for part in &parts {
        write_file(part, 1000);
    }
    let merged = temp.path().join("merged.mp4");
    write_file(&merged, 2990);

    let input_total = total_file_size(&parts).await.unwrap();
    let output_total = total_file_size(&[merged]).await.unwrap();

    assert_eq!(input_total, 3000);
    assert!(check_file_sizes(input_total, output_total).is_none());
    assert!(check_file_sizes(input_total, 1000).is_some());
}

#[test]
fn test_collect_then_empty_directory() {
    let temp = TempDir::new().unwrap();
    write_file(&temp.path().join("day1/a.mov"), 1);
    write_file(&temp.path().join("day2/b.mov"), 1);
    write_file(&temp.path().join("day2/.DS_Store"), 1);

    let files = collect_files_recursive(temp.path()).unwrap();
    assert_eq!(files.len(), 2);
    assert!(files[0].ends_with("day1/a.mov"));

    let empty = TempDir::new().unwrap();
    assert!(matches!(
        collect_files_recursive(empty.path()),
        Err(FsError::EmptyResult(_))
    ));
}

#[tokio::test]
async fn test_video_ts_order() {
    let temp = TempDir::new().unwrap();
    let video_ts = temp.path().join("VIDEO_TS");
    for name in ["VIDEO_TS.VOB", "VTS_01_0.VOB", "VTS_01_3.VOB", "VTS_01_1.VOB", "VTS_01_2.VOB"] {
        write_file(&video_ts.join(name), 1);
    }

    let parts = read_video_ts(&video_ts).await.unwrap();
    assert_eq!(
        parts,
        vec![
            video_ts.join("VTS_01_1.VOB"),
            video_ts.join("VTS_01_2.VOB"),
            video_ts.join("VTS_01_3.VOB"),
        ]
    );
}
