//! Configuration options for validation and evaluation.

use std::collections::BTreeSet;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::report::ErrorKind;

/// Which warning kinds are upgraded to errors.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StrictPolicy {
    /// Semantic and constraint findings stay warnings.
    #[default]
    Lenient,
    /// Every warning becomes an error.
    Strict,
    /// Only the listed kinds become errors.
    Only(BTreeSet<ErrorKind>),
}

impl StrictPolicy {
    pub fn lenient() -> Self {
        StrictPolicy::Lenient
    }

    pub fn strict() -> Self {
        StrictPolicy::Strict
    }

    pub fn only<I>(kinds: I) -> Self
    where
        I: IntoIterator<Item = ErrorKind>,
    {
        StrictPolicy::Only(kinds.into_iter().collect())
    }

    pub fn upgrades(&self, kind: ErrorKind) -> bool {
        match self {
            StrictPolicy::Lenient => false,
            StrictPolicy::Strict => true,
            StrictPolicy::Only(kinds) => kinds.contains(&kind),
        }
    }

    pub fn is_strict(&self) -> bool {
        match self {
            StrictPolicy::Lenient => false,
            StrictPolicy::Strict => true,
            StrictPolicy::Only(kinds) => !kinds.is_empty(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Csv,
    Json,
}

impl OutputFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Csv => "csv",
            OutputFormat::Json => "json",
        }
    }
}

/// Engine settings, usually read from `xwalk.toml`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Size of the evaluation thread pool.
    pub workers: usize,
    /// Rows per batch between cancellation checks.
    pub batch_size: usize,
    /// Bytes of source columns kept in memory before spilling.
    /// `None` disables spilling.
    pub memory_budget_bytes: Option<usize>,
    /// Parent directory for spill files; the system temp dir when unset.
    pub spill_dir: Option<PathBuf>,
    /// Base for relative input and output paths.
    pub working_dir: Option<PathBuf>,
    pub output_format: OutputFormat,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            workers: std::thread::available_parallelism().map_or(1, usize::from),
            batch_size: 10_000,
            memory_budget_bytes: None,
            spill_dir: None,
            working_dir: None,
            output_format: OutputFormat::Csv,
        }
    }
}

impl EngineConfig {
    /// Resolve a path against `working_dir` when it is relative.
    pub fn resolve_path(&self, path: impl Into<PathBuf>) -> PathBuf {
        let path = path.into();
        match &self.working_dir {
            Some(base) if path.is_relative() => base.join(path),
            _ => path,
        }
    }
}
