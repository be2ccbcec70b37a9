//! Candidate output name validation
//!
//! Checks run name by name and stop at the first problem. The per-name order
//! is: empty, invalid character, same path as the input, trailing
//! whitespace/dot, path length. Duplicate detection across the whole set only
//! runs when every name passed the per-name checks. The same-base-name warning
//! is independent of all of the above and always covers every name.

use super::paths;
use crate::error::ValidationError;
use cutkit_common::OsFamily;
use std::collections::HashSet;

/// Windows MAX_PATH (260) minus the terminating NUL
pub const WINDOWS_MAX_PATH_LENGTH: usize = 259;

const WINDOWS_RESERVED: [char; 7] = ['<', '>', ':', '"', '|', '?', '*'];

/// Which rule set to validate against
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValidationTarget {
    pub os: OsFamily,
    /// Also apply the Windows-only checks (trailing dot, path length) elsewhere
    pub dev_mode: bool,
}

impl ValidationTarget {
    pub fn new(os: OsFamily) -> Self {
        Self { os, dev_mode: false }
    }

    fn windows_checks(&self) -> bool {
        self.os == OsFamily::Windows || self.dev_mode
    }
}

/// Result of validating a candidate set
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ValidationVerdict {
    /// First problem found, if any
    pub error: Option<ValidationError>,
    /// Some output would share the input's file name (in another directory)
    pub same_as_input_warning: bool,
}

impl ValidationVerdict {
    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }
}

/// Characters rejected in output names for this target
pub fn invalid_chars(os: OsFamily, enforce_safe: bool) -> Vec<char> {
    let mut chars = Vec::new();
    match os {
        OsFamily::Windows => {
            chars.extend_from_slice(&WINDOWS_RESERVED);
            if enforce_safe {
                chars.extend_from_slice(&['/', '\\']);
            }
        }
        OsFamily::Mac => {
            chars.push(':');
            if enforce_safe {
                chars.push('/');
            }
        }
        OsFamily::Unix => {
            if enforce_safe {
                chars.push('/');
            }
        }
    }
    chars
}

fn check_name(
    name: &str,
    input_normalized: &str,
    output_dir: &str,
    invalid: &[char],
    target: &ValidationTarget,
) -> Result<(), ValidationError> {
    if name.is_empty() {
        return Err(ValidationError::EmptyName);
    }

    if name.chars().any(|c| invalid.contains(&c)) {
        return Err(ValidationError::InvalidCharacters {
            name: name.to_string(),
        });
    }

    let out_normalized = paths::join(output_dir, name, target.os);
    if out_normalized == input_normalized {
        return Err(ValidationError::SameAsInput {
            name: name.to_string(),
        });
    }

    if target.windows_checks() && (name.ends_with(char::is_whitespace) || name.ends_with('.')) {
        return Err(ValidationError::TrailingDotOrWhitespace {
            name: name.to_string(),
        });
    }

    let length = out_normalized.chars().count();
    if target.windows_checks() && length >= WINDOWS_MAX_PATH_LENGTH {
        return Err(ValidationError::PathTooLong {
            name: name.to_string(),
            length,
        });
    }

    Ok(())
}

fn first_duplicate(names: &[String]) -> Option<&String> {
    let mut seen = HashSet::with_capacity(names.len());
    names.iter().find(|name| !seen.insert(name.as_str()))
}

/// Validate a full candidate set against the input file and output directory
pub fn validate_out_names(
    names: &[String],
    input_path: &str,
    output_dir: &str,
    enforce_safe: bool,
    target: &ValidationTarget,
) -> ValidationVerdict {
    if input_path.is_empty() {
        return ValidationVerdict {
            error: Some(ValidationError::NoInputPath),
            same_as_input_warning: false,
        };
    }

    let invalid = invalid_chars(target.os, enforce_safe);
    let input_normalized = paths::normalize(input_path, target.os);
    let input_base = paths::base_name(&input_normalized, target.os);

    let error = names
        .iter()
        .find_map(|name| {
            check_name(name, &input_normalized, output_dir, &invalid, target).err()
        })
        .or_else(|| {
            first_duplicate(names).map(|name| ValidationError::DuplicateNames {
                name: name.clone(),
            })
        });

    let same_as_input_warning = names.iter().any(|name| {
        let out = paths::join(output_dir, name, target.os);
        !name.is_empty() && paths::base_name(&out, target.os) == input_base
    });

    ValidationVerdict {
        error,
        same_as_input_warning,
    }
}
