use std::collections::BTreeMap;

use xwalk_model::{
    Action, ActionKind, CrosswalkMethod, FieldTypeRegistry, Modifier, RawValue, Schema,
    SchemaField, SourceRef, StrictPolicy, ValidationReport,
};

/// A crosswalk step with its action and target resolved.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedStep {
    /// Position in the method.
    pub index: usize,
    pub action: Action,
    pub target: SchemaField,
    pub sources: Vec<SourceRef>,
    pub constant: Option<RawValue>,
    pub term_map: BTreeMap<String, String>,
}

impl ResolvedStep {
    pub fn kind(&self) -> ActionKind {
        self.action.kind
    }

    /// Shared modifier of a CATEGORISE step.
    pub fn classification(&self) -> Option<Modifier> {
        match self.action.kind {
            ActionKind::Categorise => self.sources.first().and_then(|s| s.modifier),
            _ => None,
        }
    }

    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.sources.iter().map(|s| s.column.as_str())
    }

    /// Destination term for a source value, matched after trimming.
    pub fn map_term(&self, value: &str) -> Option<&str> {
        let value = value.trim();
        self.term_map
            .get(value)
            .or_else(|| {
                self.term_map
                    .iter()
                    .find(|(key, _)| key.trim() == value)
                    .map(|(_, term)| term)
            })
            .map(String::as_str)
    }

    /// Term a BOOL source asserts: its explicit term or the column name.
    pub fn asserted_term<'s>(source: &'s SourceRef) -> &'s str {
        source.term.as_deref().unwrap_or(&source.column)
    }
}

/// A crosswalk that passed validation. It has no mutators; edits go through
/// [`ValidatedMethod::into_draft`] and a new validation.
#[derive(Debug, Clone)]
pub struct ValidatedMethod {
    pub(crate) draft: CrosswalkMethod,
    pub(crate) schema: Schema,
    pub(crate) field_types: FieldTypeRegistry,
    pub(crate) steps: Vec<ResolvedStep>,
    pub(crate) report: ValidationReport,
    pub(crate) strict: StrictPolicy,
}

impl ValidatedMethod {
    pub fn name(&self) -> &str {
        &self.draft.name
    }

    pub fn steps(&self) -> &[ResolvedStep] {
        &self.steps
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn field_types(&self) -> &FieldTypeRegistry {
        &self.field_types
    }

    /// Warnings collected while validating.
    pub fn report(&self) -> &ValidationReport {
        &self.report
    }

    pub fn strict(&self) -> &StrictPolicy {
        &self.strict
    }

    pub fn step_for(&self, field: &str) -> Option<&ResolvedStep> {
        self.steps.iter().find(|s| s.target.name == field)
    }

    pub fn into_draft(self) -> CrosswalkMethod {
        self.draft
    }
}
