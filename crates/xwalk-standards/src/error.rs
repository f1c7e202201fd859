use std::path::PathBuf;

use xwalk_model::{ActionKind, ArityKind, Modifier};

#[derive(Debug, thiserror::Error)]
pub enum CatalogueError {
    #[error("failed to read file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse TOML catalogue {origin}: {source}")]
    Toml {
        origin: String,
        #[source]
        source: toml::de::Error,
    },

    #[error("unknown field type in catalogue: {name}")]
    UnknownType { name: String },

    #[error("unknown action in catalogue: {name}")]
    UnknownAction { name: String },

    #[error("action {action} declares arity {declared}, expected {expected}")]
    ArityMismatch {
        action: ActionKind,
        declared: ArityKind,
        expected: ArityKind,
    },

    #[error("action {action}: {message}")]
    Modifier { action: ActionKind, message: String },

    #[error("field type {name}: {message}")]
    MissingDefault { name: String, message: String },
}

impl CatalogueError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn modifier(action: ActionKind, modifiers: &[Modifier], message: &str) -> Self {
        let listed = modifiers
            .iter()
            .map(Modifier::as_str)
            .collect::<Vec<_>>()
            .join(", ");
        Self::Modifier {
            action,
            message: format!("{message} [{listed}]"),
        }
    }
}
