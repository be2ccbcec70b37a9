//! Fallback to the built-in naming scheme
//!
//! A user template that fails to evaluate, or whose output fails validation,
//! is discarded and every name is regenerated from a fixed template with
//! sanitizing forced on. The fixed template includes each segment's cut range
//! and suffix, so its output is used as-is without a second validation pass.
//! There is exactly one fallback attempt per request.

use super::generator::{generate_out_seg_file_names, GenerateOptions};
use super::segment::Segment;
use super::validator::{validate_out_names, ValidationTarget};
use crate::error::TemplateError;
use cutkit_common::config::DEFAULT_OUT_SEG_TEMPLATE;
use serde::Serialize;
use tracing::{debug, warn};

/// Fixed per-segment template used when the user's template is rejected
pub const FALLBACK_OUT_SEG_TEMPLATE: &str = DEFAULT_OUT_SEG_TEMPLATE;

/// Names chosen for one export, ready to hand to the writer
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OutputPlan {
    pub names: Vec<String>,
    pub used_fallback: bool,
    /// Why the user template was rejected
    pub fallback_reason: Option<String>,
    pub same_as_input_warning: bool,
}

/// Where the names will be written and which rules apply
#[derive(Debug, Clone)]
pub struct PlanTarget {
    pub output_dir: String,
    pub dev_mode: bool,
}

/// Evaluate `user_template`, validate, and fall back to `fallback_template`
/// on any template or validation error.
pub(crate) fn plan_with_fallback<F>(
    generate: F,
    user_template: &str,
    fallback_template: &str,
    opts: &GenerateOptions,
    target: &PlanTarget,
) -> Result<OutputPlan, TemplateError>
where
    F: Fn(&str, &GenerateOptions) -> Result<Vec<String>, TemplateError>,
{
    let validation_target = ValidationTarget {
        os: opts.os,
        dev_mode: target.dev_mode,
    };

    let rejection = match generate(user_template, opts) {
        Ok(names) => {
            let verdict = validate_out_names(
                &names,
                &opts.input_path,
                &target.output_dir,
                opts.safe_output_file_name,
                &validation_target,
            );
            match verdict.error {
                None => {
                    debug!(count = names.len(), "Output names accepted");
                    return Ok(OutputPlan {
                        names,
                        used_fallback: false,
                        fallback_reason: None,
                        same_as_input_warning: verdict.same_as_input_warning,
                    });
                }
                Some(err) => err.to_string(),
            }
        }
        Err(err) => err.to_string(),
    };

    warn!(
        template = user_template,
        reason = %rejection,
        "Output name template rejected, using fallback names"
    );

    let mut forced = opts.clone();
    forced.safe_output_file_name = true;
    let names = generate(fallback_template, &forced)?;

    Ok(OutputPlan {
        names,
        used_fallback: true,
        fallback_reason: Some(rejection),
        same_as_input_warning: false,
    })
}

/// Choose output names for `segments`, falling back when `template` is rejected
pub fn plan_out_seg_file_names(
    segments: &[Segment],
    template: &str,
    opts: &GenerateOptions,
    target: &PlanTarget,
) -> Result<OutputPlan, TemplateError> {
    plan_with_fallback(
        |tpl, o| generate_out_seg_file_names(segments, tpl, o),
        template,
        FALLBACK_OUT_SEG_TEMPLATE,
        opts,
        target,
    )
}
