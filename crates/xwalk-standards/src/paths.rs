//! Catalogue directory resolution.

use std::path::PathBuf;

/// Environment variable pointing at a directory holding `field_types.toml`
/// and `actions.toml`. When unset the embedded catalogues are used.
pub const CATALOGUE_ENV_VAR: &str = "XWALK_CATALOGUE_DIR";

pub const FIELD_TYPES_FILE: &str = "field_types.toml";
pub const ACTIONS_FILE: &str = "actions.toml";

pub fn catalogue_dir_override() -> Option<PathBuf> {
    std::env::var_os(CATALOGUE_ENV_VAR)
        .filter(|value| !value.is_empty())
        .map(PathBuf::from)
}
