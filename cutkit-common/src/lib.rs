//! # cutkit Common Library
//!
//! Shared code for the cutkit export crates:
//! - Error type and result alias
//! - TOML/environment configuration loading
//! - Target OS family detection
//! - File-name-friendly timecode formatting
//! - Human-readable byte sizes

pub mod byte_size;
pub mod config;
pub mod error;
pub mod platform;
pub mod timecode;

pub use error::{Error, Result};
pub use platform::OsFamily;
