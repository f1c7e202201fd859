use thiserror::Error;

use crate::action::ActionKind;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    #[error("unknown field type: {0}")]
    UnknownType(String),
    #[error("unknown action: {0}")]
    UnknownAction(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaError {
    #[error("duplicate field name: {0}")]
    DuplicateName(String),
    #[error("field not found: {0}")]
    NotFound(String),
    #[error("invalid constraint on {field}: {message}")]
    Constraint { field: String, message: String },
    #[error(transparent)]
    Registry(#[from] RegistryError),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{action}: {message}")]
pub struct ArityError {
    pub action: ActionKind,
    pub message: String,
}

#[derive(Debug, Error)]
pub enum DefinitionError {
    #[error("invalid json: {0}")]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Schema(#[from] SchemaError),
}
