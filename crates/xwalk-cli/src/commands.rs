use anyhow::{Context, Result};
use comfy_table::Table;
use xwalk_cli::config::load_config;
use xwalk_cli::pipeline::{InputPaths, OutputRequest, RunOutcome, load_inputs, run, validate};
use xwalk_model::{EngineConfig, OutputFormat, StrictPolicy, ValidationReport};
use xwalk_standards::load_default_registries;
use xwalk_transform::CancellationHandle;

use crate::cli::{InputArgs, OutputFormatArg, RunArgs, ValidateArgs};
use crate::summary::apply_table_style;

pub fn run_types() -> Result<()> {
    let registries = load_default_registries().context("load catalogues")?;
    let mut table = Table::new();
    table.set_header(vec!["Type", "Constraints", "Missing default", "Description"]);
    apply_table_style(&mut table);
    for field_type in registries.field_types.iter() {
        let constraints = field_type
            .allowed_constraints
            .iter()
            .map(|kind| kind.as_str())
            .collect::<Vec<_>>()
            .join(", ");
        table.add_row(vec![
            field_type.name.as_str().to_string(),
            constraints,
            field_type.missing_default.as_str().to_string(),
            field_type.description.clone(),
        ]);
    }
    println!("{table}");
    println!("Catalogue digest: {}", registries.digest);
    Ok(())
}

pub fn run_actions() -> Result<()> {
    let registries = load_default_registries().context("load catalogues")?;
    let mut table = Table::new();
    table.set_header(vec!["Action", "Arity", "Min sources", "Modifiers", "Description"]);
    apply_table_style(&mut table);
    for action in registries.actions.iter() {
        let modifiers = action
            .modifiers
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(", ");
        table.add_row(vec![
            action.name().to_string(),
            action.arity.to_string(),
            action.min_sources.to_string(),
            modifiers,
            action.description.clone(),
        ]);
    }
    println!("{table}");
    println!("Catalogue digest: {}", registries.digest);
    Ok(())
}

pub fn run_validate(args: &ValidateArgs) -> Result<ValidationReport> {
    let config = load_config(args.inputs.config.as_deref())?;
    let loaded = load_inputs(&input_paths(&args.inputs), &config)?;
    Ok(validate(&loaded, &strict_policy(&args.inputs)))
}

pub fn run_crosswalk(args: &RunArgs) -> Result<RunOutcome> {
    let mut config = load_config(args.inputs.config.as_deref())?;
    apply_run_overrides(&mut config, args);
    let loaded = load_inputs(&input_paths(&args.inputs), &config)?;
    let output = OutputRequest {
        path: args.output.clone(),
        format: args.format.map_or(config.output_format, output_format),
    };
    run(
        loaded,
        &config,
        &strict_policy(&args.inputs),
        &output,
        // Never set: the binary installs no signal handler.
        &CancellationHandle::new(),
    )
}

fn input_paths(args: &InputArgs) -> InputPaths {
    InputPaths {
        schema: args.schema.clone(),
        crosswalk: args.crosswalk.clone(),
        source: args.source.clone(),
    }
}

fn strict_policy(args: &InputArgs) -> StrictPolicy {
    if args.strict {
        StrictPolicy::strict()
    } else {
        StrictPolicy::lenient()
    }
}

/// Command-line flags win over file and environment settings.
fn apply_run_overrides(config: &mut EngineConfig, args: &RunArgs) {
    if let Some(workers) = args.workers {
        config.workers = workers.max(1);
    }
    if let Some(batch_size) = args.batch_size {
        config.batch_size = batch_size.max(1);
    }
    if let Some(budget) = args.memory_budget {
        config.memory_budget_bytes = Some(budget);
    }
}

fn output_format(arg: OutputFormatArg) -> OutputFormat {
    match arg {
        OutputFormatArg::Csv => OutputFormat::Csv,
        OutputFormatArg::Json => OutputFormat::Json,
    }
}
