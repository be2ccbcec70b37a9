//! Output file naming
//!
//! Pipeline: build a [`template::NamingContext`] per segment, evaluate the
//! user's template, sanitize, validate the whole set, and fall back to the
//! built-in template when anything is rejected.

pub mod extension;
pub mod fallback;
pub mod generator;
pub mod merged;
pub mod paths;
pub mod sanitize;
pub mod segment;
pub mod template;
pub mod validator;

pub use fallback::{plan_out_seg_file_names, OutputPlan, PlanTarget, FALLBACK_OUT_SEG_TEMPLATE};
pub use generator::{generate_out_seg_file_names, GenerateOptions};
pub use merged::{generate_merged_file_name, plan_merged_file_name};
pub use segment::Segment;
pub use validator::{validate_out_names, ValidationTarget, ValidationVerdict};
