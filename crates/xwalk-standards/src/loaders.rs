use std::path::Path;

use xwalk_model::{
    Action, ActionKind, ActionRegistry, ArityKind, FieldType, FieldTypeRegistry, TypeName,
};

use crate::catalogue::{ActionsDocument, FieldTypesDocument};
use crate::embedded;
use crate::error::CatalogueError;
use crate::hash::sha256_hex;
use crate::paths::{ACTIONS_FILE, FIELD_TYPES_FILE, catalogue_dir_override};

/// Both registries plus a digest identifying the catalogue text they came from.
#[derive(Debug, Clone)]
pub struct Registries {
    pub field_types: FieldTypeRegistry,
    pub actions: ActionRegistry,
    pub digest: String,
}

pub fn load_field_types_str(text: &str, origin: &str) -> Result<FieldTypeRegistry, CatalogueError> {
    let document: FieldTypesDocument = toml::from_str(text).map_err(|source| CatalogueError::Toml {
        origin: origin.to_string(),
        source,
    })?;
    let mut types = Vec::with_capacity(document.types.len());
    for (name, entry) in document.types {
        let type_name: TypeName = name
            .parse()
            .map_err(|_| CatalogueError::UnknownType { name: name.clone() })?;
        let missing_default = entry
            .missing_default
            .ok_or_else(|| CatalogueError::MissingDefault {
                name: name.clone(),
                message: "no missing_default declared".to_string(),
            })?;
        if !missing_default.applies_to(type_name) {
            return Err(CatalogueError::MissingDefault {
                name,
                message: format!("missing_default {missing_default:?} does not apply"),
            });
        }
        types.push(
            FieldType::new(type_name, entry.description)
                .allowing(entry.constraints)
                .with_missing_default(missing_default)
                .with_formats(entry.formats),
        );
    }
    Ok(FieldTypeRegistry::new(types))
}

pub fn load_actions_str(text: &str, origin: &str) -> Result<ActionRegistry, CatalogueError> {
    let document: ActionsDocument = toml::from_str(text).map_err(|source| CatalogueError::Toml {
        origin: origin.to_string(),
        source,
    })?;
    let mut actions = Vec::with_capacity(document.actions.len());
    for (name, entry) in document.actions {
        let kind: ActionKind = name
            .parse()
            .map_err(|_| CatalogueError::UnknownAction { name: name.clone() })?;
        let expected = kind.expected_arity();
        if entry.arity != expected {
            return Err(CatalogueError::ArityMismatch {
                action: kind,
                declared: entry.arity,
                expected,
            });
        }
        let grammar = kind.modifier_grammar();
        if entry.modifiers.iter().any(|m| !grammar.contains(m)) {
            return Err(CatalogueError::modifier(
                kind,
                &entry.modifiers,
                "modifiers outside the action's grammar",
            ));
        }
        let needs_modifiers = matches!(
            entry.arity,
            ArityKind::SignedList | ArityKind::ClassifiedList
        );
        if needs_modifiers && entry.modifiers.is_empty() {
            return Err(CatalogueError::modifier(
                kind,
                grammar,
                "action requires modifiers, expected",
            ));
        }
        let mut action = Action::new(kind, entry.description);
        if let Some(min_sources) = entry.min_sources {
            action.min_sources = min_sources;
        }
        action.modifiers = entry.modifiers;
        actions.push(action);
    }
    Ok(ActionRegistry::new(actions))
}

fn read_catalogue(path: &Path) -> Result<String, CatalogueError> {
    std::fs::read_to_string(path).map_err(|source| CatalogueError::io(path, source))
}

pub fn load_field_types(path: &Path) -> Result<FieldTypeRegistry, CatalogueError> {
    let text = read_catalogue(path)?;
    load_field_types_str(&text, &path.display().to_string())
}

pub fn load_actions(path: &Path) -> Result<ActionRegistry, CatalogueError> {
    let text = read_catalogue(path)?;
    load_actions_str(&text, &path.display().to_string())
}

pub fn load_default_field_types() -> Result<FieldTypeRegistry, CatalogueError> {
    load_field_types_str(embedded::FIELD_TYPES, "embedded field_types.toml")
}

pub fn load_default_actions() -> Result<ActionRegistry, CatalogueError> {
    load_actions_str(embedded::ACTIONS, "embedded actions.toml")
}

/// Load both catalogues from a directory.
pub fn load_registries_from(dir: &Path) -> Result<Registries, CatalogueError> {
    let field_types_path = dir.join(FIELD_TYPES_FILE);
    let actions_path = dir.join(ACTIONS_FILE);
    let field_types_text = read_catalogue(&field_types_path)?;
    let actions_text = read_catalogue(&actions_path)?;
    Ok(Registries {
        field_types: load_field_types_str(
            &field_types_text,
            &field_types_path.display().to_string(),
        )?,
        actions: load_actions_str(&actions_text, &actions_path.display().to_string())?,
        digest: catalogue_digest(&field_types_text, &actions_text),
    })
}

/// Registries from `XWALK_CATALOGUE_DIR` when set, the embedded catalogues
/// otherwise.
pub fn load_default_registries() -> Result<Registries, CatalogueError> {
    if let Some(dir) = catalogue_dir_override() {
        return load_registries_from(&dir);
    }
    Ok(Registries {
        field_types: load_default_field_types()?,
        actions: load_default_actions()?,
        digest: catalogue_digest(embedded::FIELD_TYPES, embedded::ACTIONS),
    })
}

fn catalogue_digest(field_types: &str, actions: &str) -> String {
    let mut bytes = Vec::with_capacity(field_types.len() + actions.len() + 1);
    bytes.extend_from_slice(field_types.as_bytes());
    bytes.push(0);
    bytes.extend_from_slice(actions.as_bytes());
    sha256_hex(&bytes)
}
