//! Per-segment output name generation
//!
//! One candidate name per segment, in segment order. Generation is pure: it
//! reads the segment list and options and never touches the filesystem.
//!
//! Template variables:
//!
//! | Variable      | Value                                                   |
//! |---------------|---------------------------------------------------------|
//! | `FILENAME`    | input file name without extension                      |
//! | `EXT`         | output extension including the dot                     |
//! | `SEG_SUFFIX`  | `-<label>`, `-seg<NN>` (several segments) or empty     |
//! | `SEG_NUM`     | zero-padded 1-based index                              |
//! | `SEG_NUM_INT` | 1-based index as a number                              |
//! | `SEG_LABEL`   | sanitized label                                        |
//! | `EPOCH_MS`    | capture time in milliseconds                           |
//! | `CUT_FROM`    | cut-in timecode (`HH.MM.SS.mmm`)                       |
//! | `CUT_TO`      | cut-out timecode                                       |
//! | `SEG_TAGS`    | tag map, with upper-cased copies of every key          |

use super::paths;
use super::sanitize::{sanitize, sanitize_field, truncate_chars, MAX_FILE_NAME_LENGTH};
use super::segment::Segment;
use super::template::{evaluate, NamingContext};
use crate::error::TemplateError;
use cutkit_common::timecode::file_name_timecode;
use cutkit_common::OsFamily;
use std::collections::BTreeMap;

/// Inputs shared by every segment of one generation pass
#[derive(Debug, Clone)]
pub struct GenerateOptions {
    /// Path of the file being cut
    pub input_path: String,
    /// Output extension including the dot
    pub ext: String,
    /// Sanitize fields and the final path component
    pub safe_output_file_name: bool,
    /// Minimum width of `SEG_NUM`
    pub min_zero_padding: usize,
    pub os: OsFamily,
    /// Value for `EPOCH_MS`, captured once per export
    pub epoch_ms: i64,
}

impl GenerateOptions {
    /// Options for `input_path` on the host OS, keeping its extension
    pub fn new(input_path: &str) -> Self {
        let os = OsFamily::current();
        Self {
            input_path: input_path.to_string(),
            ext: paths::extension(input_path, os).to_string(),
            safe_output_file_name: true,
            min_zero_padding: 1,
            os,
            epoch_ms: chrono::Utc::now().timestamp_millis(),
        }
    }
}

fn digit_count(mut n: usize) -> usize {
    let mut digits = 1;
    while n >= 10 {
        n /= 10;
        digits += 1;
    }
    digits
}

/// Width of zero-padded segment numbers for `count` segments
pub fn padding_width(count: usize, min_zero_padding: usize) -> usize {
    min_zero_padding.max(digit_count(count))
}

/// Suffix distinguishing one segment's output from its siblings
pub fn segment_suffix(label: &str, padded_index: &str, segment_count: usize) -> String {
    if !label.is_empty() {
        format!("-{}", label)
    } else if segment_count > 1 {
        format!("-seg{}", padded_index)
    } else {
        String::new()
    }
}

/// Tag map with an upper-cased copy of every key; upper-cased keys win
fn merged_tags(
    tags: &BTreeMap<String, String>,
    safe: bool,
    os: OsFamily,
) -> BTreeMap<String, String> {
    let mut merged = BTreeMap::new();
    for (key, value) in tags {
        merged.insert(key.clone(), sanitize_field(value, safe, os));
    }
    for (key, value) in tags {
        merged.insert(key.to_uppercase(), sanitize_field(value, safe, os));
    }
    merged
}

/// Build the naming context for segment `index` (0-based)
pub fn segment_context(
    segment: &Segment,
    index: usize,
    segment_count: usize,
    opts: &GenerateOptions,
) -> NamingContext {
    let safe = opts.safe_output_file_name;
    let number = index + 1;
    let width = padding_width(segment_count, opts.min_zero_padding);
    let padded = format!("{:0width$}", number, width = width);
    let label = sanitize_field(&segment.name, safe, opts.os);
    let suffix = segment_suffix(&label, &padded, segment_count);

    let mut ctx = NamingContext::new();
    ctx.set("FILENAME", paths::file_stem(&opts.input_path, opts.os))
        .set("SEG_SUFFIX", suffix)
        .set("EXT", opts.ext.as_str())
        .set("SEG_NUM", padded)
        .set("SEG_NUM_INT", number as i64)
        .set("SEG_LABEL", label)
        .set("EPOCH_MS", opts.epoch_ms)
        .set("CUT_FROM", file_name_timecode(segment.start))
        .set("CUT_TO", file_name_timecode(segment.end))
        .set("SEG_TAGS", merged_tags(&segment.tags, safe, opts.os));
    ctx
}

/// Split `evaluated` after its last separator into (directories, file name)
fn split_final_component(evaluated: &str, os: OsFamily) -> (&str, &str) {
    let split_at = evaluated
        .char_indices()
        .filter(|(_, c)| os.is_separator(*c))
        .map(|(i, c)| i + c.len_utf8())
        .last()
        .unwrap_or(0);
    evaluated.split_at(split_at)
}

/// Cut `file` to `max_length` characters, shortening the part before the
/// extension so the extension survives
fn truncate_keeping_extension(file: &str, max_length: usize) -> String {
    if file.chars().count() <= max_length {
        return file.to_string();
    }
    let ext = match file.rfind('.') {
        Some(i) if i > 0 && file[i..].chars().count() < max_length => &file[i..],
        _ => "",
    };
    let stem = &file[..file.len() - ext.len()];
    let keep = max_length - ext.chars().count();
    format!("{}{}", truncate_chars(stem, keep), ext)
}

/// Sanitize (when safe) and length-limit only the last path component.
///
/// Directory components produced by the template itself are left alone.
pub fn finalize_name(evaluated: &str, safe: bool, os: OsFamily) -> String {
    let (dirs, file) = split_final_component(evaluated, os);

    let file = if safe {
        sanitize(file, usize::MAX)
    } else {
        file.to_string()
    };
    format!("{}{}", dirs, truncate_keeping_extension(&file, MAX_FILE_NAME_LENGTH))
}

/// Evaluate `template`, shortening `FILENAME` in `ctx` until the final path
/// component fits [`MAX_FILE_NAME_LENGTH`].
///
/// The input stem is the only field without its own cap, so it gives way
/// first and the per-segment parts after it (cut range, suffix, extension)
/// stay intact.
pub(crate) fn evaluate_fitted(
    template: &str,
    ctx: &mut NamingContext,
    stem: &str,
    os: OsFamily,
) -> Result<String, TemplateError> {
    let mut evaluated = evaluate(template, ctx)?;
    let mut keep = stem.chars().count();

    loop {
        let (_, file) = split_final_component(&evaluated, os);
        let overflow = file.chars().count().saturating_sub(MAX_FILE_NAME_LENGTH);
        if overflow == 0 || keep == 0 {
            return Ok(evaluated);
        }
        keep = keep.saturating_sub(overflow);
        ctx.set("FILENAME", truncate_chars(stem, keep));
        evaluated = evaluate(template, ctx)?;
    }
}

/// Generate one candidate name per segment from `template`
pub fn generate_out_seg_file_names(
    segments: &[Segment],
    template: &str,
    opts: &GenerateOptions,
) -> Result<Vec<String>, TemplateError> {
    let count = segments.len();
    let stem = paths::file_stem(&opts.input_path, opts.os);
    segments
        .iter()
        .enumerate()
        .map(|(index, segment)| {
            let mut ctx = segment_context(segment, index, count, opts);
            let evaluated = evaluate_fitted(template, &mut ctx, stem, opts.os)?;
            Ok(finalize_name(&evaluated, opts.safe_output_file_name, opts.os))
        })
        .collect()
}
