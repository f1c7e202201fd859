//! CLI argument definitions.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use clap_verbosity_flag::{Verbosity, WarnLevel};
use colorchoice_clap::Color;

#[derive(Parser)]
#[command(
    name = "xwalk",
    version,
    about = "Crosswalk tabular source data into a typed destination schema",
    long_about = "Validate crosswalk methods against a destination schema and source data,\n\
                  then evaluate them into a destination table (CSV or JSON)."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Adjust log verbosity (-v for info, -vv for debug, -q for errors only).
    #[command(flatten)]
    pub verbosity: Verbosity<WarnLevel>,

    /// Control ANSI color output (auto, always, never).
    #[command(flatten)]
    pub color: Color,

    /// Explicit log level (overrides -v/-q flags).
    #[arg(long = "log-level", value_enum, global = true)]
    pub log_level: Option<LogLevelArg>,

    /// Log output format (pretty for human, json for machine parsing).
    #[arg(
        long = "log-format",
        value_enum,
        default_value = "pretty",
        global = true
    )]
    pub log_format: LogFormatArg,

    /// Write logs to a file instead of stderr.
    #[arg(long = "log-file", value_name = "PATH", global = true)]
    pub log_file: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Command {
    /// List the field types of the loaded catalogue.
    Types,

    /// List the crosswalk actions of the loaded catalogue.
    Actions,

    /// Validate a crosswalk method without evaluating it.
    Validate(ValidateArgs),

    /// Validate and evaluate a crosswalk method, writing the destination table.
    Run(RunArgs),
}

#[derive(Args)]
pub struct InputArgs {
    /// Destination schema (JSON).
    #[arg(long = "schema", value_name = "PATH")]
    pub schema: PathBuf,

    /// Crosswalk method (JSON).
    #[arg(long = "crosswalk", value_name = "PATH")]
    pub crosswalk: PathBuf,

    /// Source data (CSV with a header row).
    #[arg(long = "source", value_name = "PATH")]
    pub source: PathBuf,

    /// Engine configuration file (default: ./xwalk.toml when present).
    #[arg(long = "config", value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Treat every warning as an error.
    #[arg(long = "strict")]
    pub strict: bool,
}

#[derive(Args)]
pub struct ValidateArgs {
    #[command(flatten)]
    pub inputs: InputArgs,
}

#[derive(Args)]
pub struct RunArgs {
    #[command(flatten)]
    pub inputs: InputArgs,

    /// Output file for the destination table.
    #[arg(long = "output", value_name = "PATH")]
    pub output: PathBuf,

    /// Output format (default: from configuration).
    #[arg(long = "format", value_enum)]
    pub format: Option<OutputFormatArg>,

    /// Worker threads (overrides configuration).
    #[arg(long = "workers", value_name = "N")]
    pub workers: Option<usize>,

    /// Rows per batch (overrides configuration).
    #[arg(long = "batch-size", value_name = "ROWS")]
    pub batch_size: Option<usize>,

    /// Memory budget in bytes for source columns; enables spilling.
    #[arg(long = "memory-budget", value_name = "BYTES")]
    pub memory_budget: Option<usize>,
}

#[derive(Clone, Copy, ValueEnum)]
pub enum OutputFormatArg {
    Csv,
    Json,
}

/// CLI log level choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogLevelArg {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// CLI log format choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogFormatArg {
    Pretty,
    Compact,
    Json,
}
