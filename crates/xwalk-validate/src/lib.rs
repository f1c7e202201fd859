//! Crosswalk validation.
//!
//! A method is checked in two passes. The structural pass collects every
//! fatal defect (unknown actions, fields or columns, arity, duplicate and
//! foreign-key targets). The semantic pass only runs when the structure is
//! sound and reports type, category and mapping-coverage problems as
//! warnings, which a strict policy may upgrade to errors.

mod constraints;
mod context;
mod method;
mod semantic;
mod structural;

pub use constraints::enforce_constraints;
pub use context::ValidationContext;
pub use method::{ResolvedStep, ValidatedMethod};

use tracing::{debug, info_span};
use xwalk_model::{CrosswalkMethod, ValidationReport};

fn run_passes(
    method: &CrosswalkMethod,
    ctx: &ValidationContext<'_>,
) -> (Vec<ResolvedStep>, ValidationReport) {
    let span = info_span!("validate", method = %method.name, steps = method.steps.len());
    let _guard = span.enter();

    let mut report = ValidationReport::new();
    let steps = structural::check_structure(method, ctx, &mut report);
    if report.has_errors() {
        debug!(errors = report.error_count(), "structural validation failed");
        return (steps, report);
    }
    semantic::check_semantics(&steps, ctx, &mut report);
    report.apply_strict(&ctx.strict);
    debug!(
        errors = report.error_count(),
        warnings = report.warning_count(),
        "validation finished"
    );
    (steps, report)
}

/// Validate a method and return the full report.
pub fn validate_method(method: &CrosswalkMethod, ctx: &ValidationContext<'_>) -> ValidationReport {
    run_passes(method, ctx).1
}

/// Validate a method and freeze it for evaluation, or return the report of
/// what is wrong with it.
pub fn prepare_method(
    method: &CrosswalkMethod,
    ctx: &ValidationContext<'_>,
) -> Result<ValidatedMethod, ValidationReport> {
    let (steps, report) = run_passes(method, ctx);
    if !report.ok() {
        return Err(report);
    }
    Ok(ValidatedMethod {
        draft: method.clone(),
        schema: ctx.schema.clone(),
        field_types: ctx.field_types.clone(),
        steps,
        report,
        strict: ctx.strict.clone(),
    })
}
