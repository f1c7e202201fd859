//! Parallel evaluation of a validated crosswalk.

use std::collections::HashMap;

use polars::prelude::DataFrame;
use rayon::ThreadPoolBuilder;
use rayon::prelude::*;
use tracing::{Span, debug, info, info_span};
use xwalk_ingest::TabularProvider;
use xwalk_model::{
    DestinationColumn, DestinationTable, ErrorKind, TypedError, ValidationReport,
};
use xwalk_validate::{ResolvedStep, ValidatedMethod, enforce_constraints};

use crate::cancel::CancellationHandle;
use crate::error::EvaluateError;
use crate::executors::{StepDiagnostics, StepExecutor};
use crate::frame_builder::build_frame;
use crate::options::EvaluationOptions;

/// Result of a completed evaluation.
#[derive(Debug, Clone)]
pub struct Evaluation {
    /// Evaluated values in schema order. Absent cells are `None`.
    pub table: DestinationTable,
    /// The table with missing defaults applied.
    pub frame: DataFrame,
    /// Validation warnings, evaluation diagnostics and constraint findings.
    pub report: ValidationReport,
}

struct StepOutcome {
    column: DestinationColumn,
    diagnostics: StepDiagnostics,
}

/// Apply a validated method to a source.
///
/// Steps run concurrently on a pool of `options.workers` threads; each step
/// processes rows in batches of `options.batch_size` and stops at the next
/// batch boundary once `cancel` is set. A cancelled run discards the
/// provider's spill artifacts and returns [`EvaluateError::Cancelled`].
pub fn evaluate(
    method: &ValidatedMethod,
    provider: &dyn TabularProvider,
    options: &EvaluationOptions,
    cancel: &CancellationHandle,
) -> Result<Evaluation, EvaluateError> {
    let span = info_span!(
        "evaluate",
        method = %method.name(),
        steps = method.steps().len(),
        rows = provider.row_count(),
        workers = options.workers
    );
    let _guard = span.enter();

    let result = run(method, provider, options, cancel, &span);
    match &result {
        Err(EvaluateError::Cancelled) => {
            provider.discard_spill();
            info!("evaluation cancelled");
        }
        Err(err) => debug!(error = %err, "evaluation failed"),
        Ok(evaluation) => info!(
            errors = evaluation.report.error_count(),
            warnings = evaluation.report.warning_count(),
            "evaluation finished"
        ),
    }
    result
}

fn run(
    method: &ValidatedMethod,
    provider: &dyn TabularProvider,
    options: &EvaluationOptions,
    cancel: &CancellationHandle,
    span: &Span,
) -> Result<Evaluation, EvaluateError> {
    check_columns(method, provider)?;
    let rows = provider.row_count();

    let pool = ThreadPoolBuilder::new()
        .num_threads(options.workers)
        .thread_name(|idx| format!("xwalk-eval-{idx}"))
        .build()?;
    let outcomes: Vec<Result<StepOutcome, EvaluateError>> = pool.install(|| {
        method
            .steps()
            .par_iter()
            .map(|step| evaluate_step(step, method, provider, options, cancel, span))
            .collect()
    });
    if cancel.is_cancelled() {
        return Err(EvaluateError::Cancelled);
    }

    let mut report = method.report().clone();
    let mut columns = HashMap::with_capacity(outcomes.len());
    for (step, outcome) in method.steps().iter().zip(outcomes) {
        let outcome = outcome?;
        report_diagnostics(step, &outcome.diagnostics, &mut report);
        columns.insert(step.target.name.clone(), outcome.column);
    }

    let schema = method.schema();
    let mut table = DestinationTable::new(rows);
    for field in schema.fields() {
        let column = columns
            .remove(&field.name)
            .unwrap_or_else(|| DestinationColumn::absent(&field.name, rows));
        table.push(column);
    }

    report.merge(enforce_constraints(schema, &table));
    report.apply_strict(method.strict());
    report.apply_strict(&options.strict);
    if report.has_errors() {
        return Err(EvaluateError::Strict(report));
    }

    let frame = build_frame(schema, &table)?;
    Ok(Evaluation {
        table,
        frame,
        report,
    })
}

/// Columns may have disappeared since the method was validated.
fn check_columns(
    method: &ValidatedMethod,
    provider: &dyn TabularProvider,
) -> Result<(), EvaluateError> {
    let mut report = ValidationReport::new();
    for step in method.steps() {
        for column in step.columns() {
            if !provider.has_column(column) {
                report.push(
                    TypedError::error(
                        ErrorKind::UnknownColumn,
                        format!("source column `{column}` does not exist"),
                    )
                    .at_step(step.index)
                    .on_column(column),
                );
            }
        }
    }
    if report.has_errors() {
        return Err(EvaluateError::Invalid(report));
    }
    Ok(())
}

fn evaluate_step(
    step: &ResolvedStep,
    method: &ValidatedMethod,
    provider: &dyn TabularProvider,
    options: &EvaluationOptions,
    cancel: &CancellationHandle,
    parent: &Span,
) -> Result<StepOutcome, EvaluateError> {
    let span = info_span!(
        parent: parent,
        "step",
        index = step.index,
        action = %step.kind(),
        target = %step.target.name
    );
    let _guard = span.enter();
    if cancel.is_cancelled() {
        return Err(EvaluateError::Cancelled);
    }

    let rows = provider.row_count();
    let columns = step
        .columns()
        .map(|column| provider.read_column(column))
        .collect::<Result<Vec<_>, _>>()?;
    let mut diagnostics = StepDiagnostics::default();
    let executor = StepExecutor::new(
        step,
        method.field_types(),
        &method.schema().missing_values,
        columns,
        rows,
        &mut diagnostics,
    );

    let mut values = Vec::with_capacity(rows);
    let mut start = 0;
    while start < rows {
        if cancel.is_cancelled() {
            debug!(row = start, "cancellation observed");
            return Err(EvaluateError::Cancelled);
        }
        let end = start.saturating_add(options.batch_size).min(rows);
        values.extend(executor.evaluate(start..end, &mut diagnostics));
        start = end;
    }

    let column = DestinationColumn::new(step.target.name.clone(), values);
    debug!(
        absent = column.absent_count(),
        clean = diagnostics.is_clean(),
        "step evaluated"
    );
    Ok(StepOutcome {
        column,
        diagnostics,
    })
}

fn report_diagnostics(
    step: &ResolvedStep,
    diagnostics: &StepDiagnostics,
    report: &mut ValidationReport,
) {
    let target = &step.target;
    let type_name = target.type_name().as_str();
    for (column, count) in &diagnostics.coercion_failures {
        report.push(
            TypedError::warning(
                ErrorKind::CoercionFailure,
                format!("{count} values of `{column}` could not be coerced to {type_name}"),
            )
            .at_step(step.index)
            .on_field(&target.name)
            .on_column(column)
            .with_count(*count),
        );
    }
    if diagnostics.constant_failures > 0 {
        report.push(
            TypedError::warning(
                ErrorKind::CoercionFailure,
                format!("constant could not be coerced to {type_name}"),
            )
            .at_step(step.index)
            .on_field(&target.name)
            .with_count(diagnostics.constant_failures),
        );
    }
    if diagnostics.overflows > 0 {
        report.push(
            TypedError::warning(
                ErrorKind::CoercionFailure,
                format!("integer sum overflowed in {} rows", diagnostics.overflows),
            )
            .at_step(step.index)
            .on_field(&target.name)
            .with_count(diagnostics.overflows),
        );
    }
    for (value, count) in &diagnostics.unmapped_terms {
        let message = format!("no term for `{value}`");
        let mut issue = TypedError::warning(ErrorKind::UnmappedTerm, message)
            .at_step(step.index)
            .on_field(&target.name)
            .with_count(*count);
        if let [source] = step.sources.as_slice() {
            issue = issue.on_column(&source.column);
        }
        report.push(issue);
    }
}
