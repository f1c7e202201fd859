//! Load inputs, validate and evaluate. Shared by the `validate` and `run`
//! subcommands.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::{info, info_span};
use xwalk_ingest::{FrameProvider, SpillingProvider, TabularProvider, read_csv_frame};
use xwalk_model::{
    CrosswalkMethod, EngineConfig, OutputFormat, Schema, StrictPolicy, ValidationReport,
};
use xwalk_standards::{Registries, load_default_registries};
use xwalk_transform::{
    CancellationHandle, EvaluateError, EvaluationOptions, evaluate, fingerprint, render_output,
    write_output,
};
use xwalk_validate::{ValidationContext, prepare_method, validate_method};

/// Paths of the three inputs of a crosswalk run.
#[derive(Debug, Clone)]
pub struct InputPaths {
    pub schema: PathBuf,
    pub crosswalk: PathBuf,
    pub source: PathBuf,
}

/// Parsed inputs, ready to validate.
pub struct LoadedInputs {
    pub registries: Registries,
    pub schema: Schema,
    pub method: CrosswalkMethod,
    pub source: FrameProvider,
}

/// Where and how to write the destination table.
#[derive(Debug, Clone)]
pub struct OutputRequest {
    pub path: PathBuf,
    pub format: OutputFormat,
}

#[derive(Debug, Clone)]
pub struct WrittenOutput {
    pub path: PathBuf,
    pub format: OutputFormat,
    pub bytes: usize,
    pub fingerprint: String,
}

/// Outcome of `run`. `written` is `None` when validation or strict policy
/// stopped the run; the report says why.
#[derive(Debug, Clone)]
pub struct RunOutcome {
    pub method: String,
    pub rows: usize,
    pub report: ValidationReport,
    pub written: Option<WrittenOutput>,
}

/// Load catalogues, schema, crosswalk and source. Relative paths resolve
/// against the configured working directory.
pub fn load_inputs(paths: &InputPaths, config: &EngineConfig) -> Result<LoadedInputs> {
    let registries = load_default_registries().context("load catalogues")?;

    let schema_path = config.resolve_path(&paths.schema);
    let schema_text = read_text(&schema_path)?;
    let schema = Schema::from_json(&schema_text, &registries.field_types)
        .with_context(|| format!("parse schema {}", schema_path.display()))?;

    let crosswalk_path = config.resolve_path(&paths.crosswalk);
    let crosswalk_text = read_text(&crosswalk_path)?;
    let method = CrosswalkMethod::from_json(&crosswalk_text)
        .with_context(|| format!("parse crosswalk {}", crosswalk_path.display()))?;

    let source_path = config.resolve_path(&paths.source);
    let frame = read_csv_frame(&source_path)
        .with_context(|| format!("load source {}", source_path.display()))?;

    Ok(LoadedInputs {
        registries,
        schema,
        method,
        source: FrameProvider::new(frame),
    })
}

fn read_text(path: &Path) -> Result<String> {
    fs::read_to_string(path).with_context(|| format!("read {}", path.display()))
}

fn context<'a>(
    loaded: &'a LoadedInputs,
    provider: &'a dyn TabularProvider,
    strict: &StrictPolicy,
) -> ValidationContext<'a> {
    ValidationContext::for_provider(
        &loaded.registries.field_types,
        &loaded.registries.actions,
        &loaded.schema,
        provider,
    )
    .with_strict(strict.clone())
}

/// Validate without evaluating.
pub fn validate(loaded: &LoadedInputs, strict: &StrictPolicy) -> ValidationReport {
    validate_method(&loaded.method, &context(loaded, &loaded.source, strict))
}

/// Validate, evaluate and write the destination table.
///
/// A set `cancel` makes the run fail with [`EvaluateError::Cancelled`] and
/// write nothing. The `xwalk` binary passes a handle that is never set, since
/// it installs no signal handler; embedders may cancel from another thread.
pub fn run(
    loaded: LoadedInputs,
    config: &EngineConfig,
    strict: &StrictPolicy,
    output: &OutputRequest,
    cancel: &CancellationHandle,
) -> Result<RunOutcome> {
    let span = info_span!("run", method = %loaded.method.name);
    let _guard = span.enter();

    let rows = loaded.source.row_count();
    let method_name = loaded.method.name.clone();
    let stopped = |report: ValidationReport| RunOutcome {
        method: method_name.clone(),
        rows,
        report,
        written: None,
    };

    let prepared = prepare_method(&loaded.method, &context(&loaded, &loaded.source, strict));
    let validated = match prepared {
        Ok(validated) => validated,
        Err(report) => return Ok(stopped(report)),
    };

    let options = EvaluationOptions::from(config);
    let result = match config.memory_budget_bytes {
        Some(budget) => {
            let mut provider = SpillingProvider::new(loaded.source, budget);
            if let Some(dir) = &config.spill_dir {
                provider = provider.with_spill_parent(config.resolve_path(dir));
            }
            let result = evaluate(&validated, &provider, &options, cancel);
            provider.discard_spill();
            result
        }
        None => evaluate(&validated, &loaded.source, &options, cancel),
    };
    let evaluation = match result {
        Ok(evaluation) => evaluation,
        Err(EvaluateError::Invalid(report) | EvaluateError::Strict(report)) => {
            return Ok(stopped(report));
        }
        Err(err) => return Err(err).context("evaluate crosswalk"),
    };

    let bytes = render_output(&evaluation, validated.schema(), output.format)
        .context("render destination table")?;
    let path = config.resolve_path(&output.path);
    write_output(&path, &bytes).context("write destination table")?;
    let written = WrittenOutput {
        path,
        format: output.format,
        bytes: bytes.len(),
        fingerprint: fingerprint(&bytes),
    };
    info!(
        path = %written.path.display(),
        fingerprint = %written.fingerprint,
        "wrote destination table"
    );

    Ok(RunOutcome {
        method: method_name,
        rows,
        report: evaluation.report,
        written: Some(written),
    })
}
