//! Engine configuration: `xwalk.toml` plus `XWALK_*` environment overrides.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use xwalk_model::{EngineConfig, OutputFormat};

/// Configuration file picked up from the working directory.
pub const CONFIG_FILE: &str = "xwalk.toml";

pub const ENV_WORKERS: &str = "XWALK_WORKERS";
pub const ENV_BATCH_SIZE: &str = "XWALK_BATCH_SIZE";
pub const ENV_MEMORY_BUDGET: &str = "XWALK_MEMORY_BUDGET";
pub const ENV_SPILL_DIR: &str = "XWALK_SPILL_DIR";
pub const ENV_WORKING_DIR: &str = "XWALK_WORKING_DIR";
pub const ENV_OUTPUT_FORMAT: &str = "XWALK_OUTPUT_FORMAT";

/// Parse an `xwalk.toml` document. Missing keys take their defaults.
pub fn parse_config(text: &str) -> Result<EngineConfig> {
    toml::from_str(text).context("parse engine configuration")
}

/// Load configuration from `path`, or from `./xwalk.toml` when it exists,
/// then apply environment overrides.
pub fn load_config(path: Option<&Path>) -> Result<EngineConfig> {
    let mut config = match path {
        Some(path) => read_config(path)?,
        None => {
            let default = Path::new(CONFIG_FILE);
            if default.is_file() {
                read_config(default)?
            } else {
                EngineConfig::default()
            }
        }
    };
    apply_overrides(&mut config, |key| std::env::var(key).ok())?;
    Ok(config)
}

fn read_config(path: &Path) -> Result<EngineConfig> {
    let text = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    parse_config(&text).with_context(|| format!("load {}", path.display()))
}

/// Apply `XWALK_*` overrides read through `lookup`. Empty values are ignored.
pub fn apply_overrides<F>(config: &mut EngineConfig, lookup: F) -> Result<()>
where
    F: Fn(&str) -> Option<String>,
{
    let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());
    if let Some(value) = get(ENV_WORKERS) {
        config.workers = parse_count(ENV_WORKERS, &value)?;
    }
    if let Some(value) = get(ENV_BATCH_SIZE) {
        config.batch_size = parse_count(ENV_BATCH_SIZE, &value)?;
    }
    if let Some(value) = get(ENV_MEMORY_BUDGET) {
        config.memory_budget_bytes = Some(parse_count(ENV_MEMORY_BUDGET, &value)?);
    }
    if let Some(value) = get(ENV_SPILL_DIR) {
        config.spill_dir = Some(PathBuf::from(value));
    }
    if let Some(value) = get(ENV_WORKING_DIR) {
        config.working_dir = Some(PathBuf::from(value));
    }
    if let Some(value) = get(ENV_OUTPUT_FORMAT) {
        config.output_format = match value.trim().to_ascii_lowercase().as_str() {
            "csv" => OutputFormat::Csv,
            "json" => OutputFormat::Json,
            other => bail!("{ENV_OUTPUT_FORMAT}: unknown output format `{other}`"),
        };
    }
    Ok(())
}

fn parse_count(key: &str, value: &str) -> Result<usize> {
    let count: usize = value
        .trim()
        .parse()
        .with_context(|| format!("{key}: `{value}` is not a whole number"))?;
    if count == 0 {
        bail!("{key}: must be greater than zero");
    }
    Ok(count)
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn file_values_override_defaults() {
        let config = parse_config(
            r#"
            workers = 3
            memory_budget_bytes = 4096
            output_format = "json"
            "#,
        )
        .unwrap();
        assert_eq!(config.workers, 3);
        assert_eq!(config.batch_size, EngineConfig::default().batch_size);
        assert_eq!(config.memory_budget_bytes, Some(4096));
        assert_eq!(config.output_format, OutputFormat::Json);
    }

    #[test]
    fn environment_overrides_file() {
        let mut config = parse_config("workers = 3\n").unwrap();
        apply_overrides(
            &mut config,
            env(&[
                (ENV_WORKERS, "8"),
                (ENV_SPILL_DIR, "/tmp/spill"),
                (ENV_OUTPUT_FORMAT, "JSON"),
                (ENV_BATCH_SIZE, " "),
            ]),
        )
        .unwrap();
        assert_eq!(config.workers, 8);
        assert_eq!(config.batch_size, 10_000);
        assert_eq!(config.spill_dir, Some(PathBuf::from("/tmp/spill")));
        assert_eq!(config.output_format, OutputFormat::Json);
    }

    #[test]
    fn bad_overrides_are_rejected() {
        let mut config = EngineConfig::default();
        let err = apply_overrides(&mut config, env(&[(ENV_WORKERS, "0")])).unwrap_err();
        assert!(err.to_string().contains(ENV_WORKERS));
        let err = apply_overrides(&mut config, env(&[(ENV_OUTPUT_FORMAT, "xml")])).unwrap_err();
        assert!(err.to_string().contains("xml"));
    }

    #[test]
    fn mistyped_values_are_errors() {
        assert!(parse_config("workers = \"many\"\n").is_err());
    }
}
