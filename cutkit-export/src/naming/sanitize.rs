//! Filename sanitizing
//!
//! Applied per field (labels, tag values) before interpolation and to the
//! final path component after it, never to directory components a template
//! inserted on purpose.

use cutkit_common::OsFamily;

/// Replacement for every character outside the safe set
pub const REPLACEMENT: char = '_';

/// Length limit for individual fields (labels, tag values)
pub const MAX_FIELD_LENGTH: usize = 100;

/// Hard limit for the final path component of a generated name
pub const MAX_FILE_NAME_LENGTH: usize = 200;

fn is_safe_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-')
}

/// Replace every char outside `[A-Za-z0-9_.-]` with `_`, then keep at most
/// `max_length` characters.
pub fn sanitize(name: &str, max_length: usize) -> String {
    name.chars()
        .map(|c| if is_safe_char(c) { c } else { REPLACEMENT })
        .take(max_length)
        .collect()
}

/// Keep at most `max_length` characters
pub fn truncate_chars(name: &str, max_length: usize) -> String {
    name.chars().take(max_length).collect()
}

/// Prepare a user-supplied field for interpolation.
///
/// With safe names on this is [`sanitize`]. With safe names off the value is
/// kept as typed except for path separators, so a label can never create a
/// directory on its own.
pub fn sanitize_field(value: &str, safe: bool, os: OsFamily) -> String {
    if safe {
        sanitize(value, MAX_FIELD_LENGTH)
    } else {
        value
            .chars()
            .map(|c| if os.is_separator(c) { REPLACEMENT } else { c })
            .take(MAX_FIELD_LENGTH)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_safe_chars_untouched() {
        assert_eq!(sanitize("clip_01.part-a", 100), "clip_01.part-a");
    }

    #[test]
    fn test_unsafe_chars_replaced() {
        assert_eq!(sanitize("a b/c:d*é", 100), "a_b_c_d__");
    }

    #[test]
    fn test_truncates_after_substitution() {
        assert_eq!(sanitize("ab cd", 3), "ab_");
        assert_eq!(sanitize("héllo", 2), "h_");
    }

    #[test]
    fn test_field_unsafe_mode_keeps_spaces_but_not_separators() {
        assert_eq!(sanitize_field("Intro / Part 1", false, OsFamily::Unix), "Intro _ Part 1");
        assert_eq!(sanitize_field("a\\b", false, OsFamily::Windows), "a_b");
        assert_eq!(sanitize_field("a\\b", false, OsFamily::Unix), "a\\b");
    }

    #[test]
    fn test_field_safe_mode_matches_sanitize() {
        assert_eq!(sanitize_field("Intro / Part 1", true, OsFamily::Unix), "Intro___Part_1");
    }

    #[test]
    fn test_field_length_limit() {
        let long = "x".repeat(500);
        assert_eq!(sanitize_field(&long, false, OsFamily::Mac).len(), MAX_FIELD_LENGTH);
    }

    proptest! {
        #[test]
        fn prop_sanitize_is_idempotent(input in ".*", max in 0usize..300) {
            let once = sanitize(&input, max);
            prop_assert_eq!(sanitize(&once, max), once);
        }

        #[test]
        fn prop_sanitized_output_only_safe_chars(input in ".*") {
            let out = sanitize(&input, 1000);
            prop_assert!(out.chars().all(is_safe_char));
            prop_assert!(!out.contains('/'));
        }
    }
}
