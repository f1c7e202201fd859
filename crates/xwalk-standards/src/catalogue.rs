//! On-disk shape of the TOML catalogues.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use xwalk_model::{ArityKind, ConstraintKind, MissingDefault, Modifier};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogueHeader {
    pub name: String,
    pub version: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldTypesDocument {
    #[serde(default)]
    pub catalogue: Option<CatalogueHeader>,
    pub types: BTreeMap<String, FieldTypeEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldTypeEntry {
    pub description: String,
    #[serde(default)]
    pub constraints: Vec<ConstraintKind>,
    /// Required; an entry without one is rejected by the loader.
    #[serde(default)]
    pub missing_default: Option<MissingDefault>,
    #[serde(default)]
    pub formats: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionsDocument {
    #[serde(default)]
    pub catalogue: Option<CatalogueHeader>,
    pub actions: BTreeMap<String, ActionEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionEntry {
    pub description: String,
    pub arity: ArityKind,
    #[serde(default)]
    pub min_sources: Option<usize>,
    #[serde(default)]
    pub modifiers: Vec<Modifier>,
}
