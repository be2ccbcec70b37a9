//! Output file extension resolution

use super::paths;
use cutkit_common::OsFamily;

/// File extension (without dot) conventionally used for a container format
pub fn extension_for_format(format: &str) -> &str {
    match format {
        "matroska" => "mkv",
        "mov" => "mov",
        "mp4" => "mp4",
        "ipod" => "m4a",
        "webm" => "webm",
        "mpegts" => "ts",
        "ogg" => "ogg",
        "flac" => "flac",
        "mp3" => "mp3",
        "adts" => "aac",
        "wav" => "wav",
        "avi" => "avi",
        "mpeg" => "mpg",
        "dv" => "dv",
        "ac3" => "ac3",
        "srt" => "srt",
        "ass" => "ass",
        other => other,
    }
}

/// Extension (with dot) for output files.
///
/// Without a custom format the input's own extension is kept, so a cut of
/// `clip.MOV` stays `.MOV`.
pub fn output_extension(input_path: &str, custom_format: Option<&str>, os: OsFamily) -> String {
    match custom_format {
        Some(format) if !format.trim().is_empty() => {
            format!(".{}", extension_for_format(format.trim()))
        }
        _ => paths::extension(input_path, os).to_string(),
    }
}
