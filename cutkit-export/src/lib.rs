//! cutkit-export library interface
//!
//! Output naming for exported segments and merges, plus the retrying
//! filesystem helpers used around the actual writes:
//! - [`naming`]: template evaluation, sanitization, generation, validation, fallback
//! - [`fsops`]: retrying delete/timestamp operations and batch file utilities

pub mod error;
pub mod fsops;
pub mod naming;

pub use crate::error::{FsError, TemplateError, ValidationError};
