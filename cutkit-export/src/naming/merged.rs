//! Merged output naming
//!
//! A merge produces a single file named after the first input. The template
//! sees `FILENAME`, `EXT` and `EPOCH_MS`; rejected templates fall back to the
//! default merged template with sanitizing forced on.

use super::fallback::{plan_with_fallback, OutputPlan, PlanTarget};
use super::generator::{evaluate_fitted, finalize_name, GenerateOptions};
use super::paths;
use super::template::NamingContext;
use crate::error::TemplateError;
use cutkit_common::config::DEFAULT_MERGED_FILE_TEMPLATE;

/// Generate the merged output name for `opts.input_path` (the first input)
pub fn generate_merged_file_name(
    template: &str,
    opts: &GenerateOptions,
) -> Result<String, TemplateError> {
    let stem = paths::file_stem(&opts.input_path, opts.os);
    let mut ctx = NamingContext::new();
    ctx.set("FILENAME", stem)
        .set("EXT", opts.ext.as_str())
        .set("EPOCH_MS", opts.epoch_ms);

    let evaluated = evaluate_fitted(template, &mut ctx, stem, opts.os)?;
    Ok(finalize_name(&evaluated, opts.safe_output_file_name, opts.os))
}

/// Choose the merged output name, falling back when `template` is rejected
pub fn plan_merged_file_name(
    template: &str,
    opts: &GenerateOptions,
    target: &PlanTarget,
) -> Result<OutputPlan, TemplateError> {
    plan_with_fallback(
        |tpl, o| generate_merged_file_name(tpl, o).map(|name| vec![name]),
        template,
        DEFAULT_MERGED_FILE_TEMPLATE,
        opts,
        target,
    )
}
