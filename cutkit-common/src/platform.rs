//! Target operating system family
//!
//! Resolved once at startup and passed explicitly into the sanitizer and
//! validator, so tests can exercise every family from any host.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Filesystem rule set to apply when naming output files
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OsFamily {
    /// Windows-like: reserved characters, `\` and `/` separators, MAX_PATH
    Windows,
    /// Apple-like Unix: `:` is reserved by the Finder
    Mac,
    /// Any other Unix-like system
    Unix,
}

impl OsFamily {
    /// Family of the host this binary was compiled for
    pub fn current() -> Self {
        if cfg!(target_os = "windows") {
            OsFamily::Windows
        } else if cfg!(target_os = "macos") {
            OsFamily::Mac
        } else {
            OsFamily::Unix
        }
    }

    /// Preferred path separator
    pub fn separator(self) -> char {
        match self {
            OsFamily::Windows => '\\',
            OsFamily::Mac | OsFamily::Unix => '/',
        }
    }

    /// True if `c` separates path components on this family
    pub fn is_separator(self, c: char) -> bool {
        match self {
            OsFamily::Windows => c == '\\' || c == '/',
            OsFamily::Mac | OsFamily::Unix => c == '/',
        }
    }
}

impl fmt::Display for OsFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            OsFamily::Windows => "windows",
            OsFamily::Mac => "mac",
            OsFamily::Unix => "unix",
        };
        f.write_str(name)
    }
}
