//! Timecode formatting for cut points
//!
//! Cut boundaries appear inside generated file names, so fields are
//! delimited with `.` instead of `:` (reserved on Windows and macOS).

/// Format seconds as a zero-padded `HH.MM.SS.mmm` timecode.
///
/// Negative and non-finite inputs are clamped to zero.
///
/// # Examples
///
/// ```
/// use cutkit_common::timecode::file_name_timecode;
///
/// assert_eq!(file_name_timecode(5.0), "00.00.05.000");
/// assert_eq!(file_name_timecode(3725.5), "01.02.05.500");
/// ```
pub fn file_name_timecode(seconds: f64) -> String {
    let seconds = if seconds.is_finite() && seconds > 0.0 {
        seconds
    } else {
        0.0
    };

    let total_ms = (seconds * 1000.0).round() as u64;
    let hours = total_ms / 3_600_000;
    let mins = (total_ms % 3_600_000) / 60_000;
    let secs = (total_ms % 60_000) / 1000;
    let millis = total_ms % 1000;

    format!("{:02}.{:02}.{:02}.{:03}", hours, mins, secs, millis)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero() {
        assert_eq!(file_name_timecode(0.0), "00.00.00.000");
    }

    #[test]
    fn test_sub_second_rounding() {
        assert_eq!(file_name_timecode(1.2346), "00.00.01.235");
        assert_eq!(file_name_timecode(0.9996), "00.00.01.000");
    }

    #[test]
    fn test_hours_roll_over() {
        assert_eq!(file_name_timecode(36_000.0), "10.00.00.000");
        assert_eq!(file_name_timecode(360_000.25), "100.00.00.250");
    }

    #[test]
    fn test_negative_and_nan_clamped() {
        assert_eq!(file_name_timecode(-3.0), "00.00.00.000");
        assert_eq!(file_name_timecode(f64::NAN), "00.00.00.000");
    }

    #[test]
    fn test_file_name_form_has_no_colon() {
        assert!(!file_name_timecode(4000.123).contains(':'));
    }
}
