//! Destination schema model.

use serde::{Deserialize, Serialize};

use crate::constraint::{Bound, CategoryTerm, Constraint};
use crate::error::{DefinitionError, SchemaError};
use crate::field_type::{FieldType, FieldTypeRegistry, TypeName};
use crate::value::{RawValue, Value};

/// A single destination field.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SchemaField {
    pub name: String,
    pub title: Option<String>,
    pub description: Option<String>,
    #[serde(rename = "type", serialize_with = "serialize_type_name")]
    pub field_type: FieldType,
    pub constraints: Vec<Constraint>,
    /// Immutable identity column, populated by exactly one step.
    pub foreign_key: bool,
}

fn serialize_type_name<S>(field_type: &FieldType, serializer: S) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    field_type.name.serialize(serializer)
}

impl SchemaField {
    pub fn new(name: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            name: name.into(),
            title: None,
            description: None,
            field_type,
            constraints: Vec::new(),
            foreign_key: false,
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_constraint(mut self, constraint: Constraint) -> Self {
        self.constraints.push(constraint);
        self
    }

    pub fn foreign_key(mut self) -> Self {
        self.foreign_key = true;
        self
    }

    pub fn type_name(&self) -> TypeName {
        self.field_type.name
    }

    pub fn is_required(&self) -> bool {
        self.constraints
            .iter()
            .any(|c| matches!(c, Constraint::Required(true)))
    }

    pub fn is_unique(&self) -> bool {
        self.constraints
            .iter()
            .any(|c| matches!(c, Constraint::Unique(true)))
    }

    /// Declared category terms, if the field carries a `category` constraint.
    pub fn category_terms(&self) -> Option<&[CategoryTerm]> {
        self.constraints.iter().find_map(|c| match c {
            Constraint::Category { terms, .. } => Some(terms.as_slice()),
            _ => None,
        })
    }

    pub fn allows_term(&self, term: &str) -> bool {
        self.category_terms()
            .is_none_or(|terms| terms.iter().any(|t| t.name == term))
    }

    pub fn minimum(&self) -> Option<&Bound> {
        self.constraints.iter().find_map(|c| match c {
            Constraint::Minimum(bound) => Some(bound),
            _ => None,
        })
    }

    pub fn maximum(&self) -> Option<&Bound> {
        self.constraints.iter().find_map(|c| match c {
            Constraint::Maximum(bound) => Some(bound),
            _ => None,
        })
    }

    pub fn value_type(&self) -> Option<TypeName> {
        self.constraints.iter().find_map(|c| match c {
            Constraint::ValueType(name) => Some(*name),
            _ => None,
        })
    }

    pub fn filter(&self) -> Option<&str> {
        self.constraints.iter().find_map(|c| match c {
            Constraint::Filter(reference) => Some(reference.as_str()),
            _ => None,
        })
    }

    pub fn missing_value(&self) -> Value {
        self.field_type.missing_value()
    }
}

/// Named, versioned, ordered set of uniquely named fields.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Schema {
    pub name: String,
    pub title: Option<String>,
    pub description: Option<String>,
    pub version: Option<String>,
    /// Source tokens treated as absent.
    pub missing_values: Vec<String>,
    fields: Vec<SchemaField>,
}

impl Schema {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            title: None,
            description: None,
            version: None,
            missing_values: default_missing_values(),
            fields: Vec::new(),
        }
    }

    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    pub fn with_missing_values<I, S>(mut self, tokens: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.missing_values = tokens.into_iter().map(Into::into).collect();
        self
    }

    pub fn fields(&self) -> &[SchemaField] {
        &self.fields
    }

    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|f| f.name.as_str())
    }

    pub fn add_field(&mut self, field: SchemaField) -> Result<(), SchemaError> {
        if self.fields.iter().any(|f| f.name == field.name) {
            return Err(SchemaError::DuplicateName(field.name));
        }
        self.fields.push(field);
        Ok(())
    }

    pub fn lookup(&self, name: &str) -> Result<&SchemaField, SchemaError> {
        self.fields
            .iter()
            .find(|f| f.name == name)
            .ok_or_else(|| SchemaError::NotFound(name.to_string()))
    }

    pub fn position(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|f| f.name == name)
    }

    /// Check a field's constraints against its type and this schema.
    ///
    /// `filter` references are resolved against fields already in the schema.
    pub fn validate_constraints(&self, field: &SchemaField) -> Result<(), SchemaError> {
        let violation = |message: String| SchemaError::Constraint {
            field: field.name.clone(),
            message,
        };
        for constraint in &field.constraints {
            let kind = constraint.kind();
            if !field.field_type.allows(kind) {
                return Err(violation(format!(
                    "constraint `{kind}` is not allowed on type `{}`",
                    field.type_name()
                )));
            }
            match constraint {
                Constraint::Category { terms, min_items } => {
                    if terms.len() < *min_items {
                        return Err(violation(format!(
                            "category declares {} terms but minItems is {min_items}",
                            terms.len()
                        )));
                    }
                }
                Constraint::Minimum(bound) | Constraint::Maximum(bound) => {
                    check_bound(field, bound).map_err(violation)?;
                }
                Constraint::Filter(reference) => {
                    let target = self.lookup(reference).map_err(|_| {
                        violation(format!("filter references unknown field `{reference}`"))
                    })?;
                    if !target.type_name().is_temporal() {
                        return Err(violation(format!(
                            "filter field `{reference}` is not temporal"
                        )));
                    }
                }
                Constraint::Required(_) | Constraint::Unique(_) | Constraint::ValueType(_) => {}
            }
        }
        if let (Some(Bound::Number(min)), Some(Bound::Number(max))) =
            (field.minimum(), field.maximum())
            && min > max
        {
            return Err(violation(format!("minimum {min} exceeds maximum {max}")));
        }
        Ok(())
    }

    /// Build a schema from its JSON definition, resolving type names and
    /// validating every constraint.
    pub fn from_definition(
        definition: SchemaDefinition,
        registry: &FieldTypeRegistry,
    ) -> Result<Self, SchemaError> {
        let mut schema = Schema {
            name: definition.name,
            title: definition.title,
            description: definition.description,
            version: definition.version,
            missing_values: definition.missing_values,
            fields: Vec::with_capacity(definition.fields.len()),
        };
        for def in definition.fields {
            let field_type = registry.resolve(&def.field_type)?.clone();
            schema.add_field(SchemaField {
                name: def.name,
                title: def.title,
                description: def.description,
                field_type,
                constraints: def.constraints,
                foreign_key: def.foreign_key,
            })?;
        }
        for field in &schema.fields {
            schema.validate_constraints(field)?;
            if let Some(item_type) = field.value_type() {
                registry
                    .get(item_type)
                    .ok_or_else(|| SchemaError::Constraint {
                        field: field.name.clone(),
                        message: format!("unknown valueType `{item_type}`"),
                    })?;
            }
        }
        Ok(schema)
    }

    pub fn from_json(json: &str, registry: &FieldTypeRegistry) -> Result<Self, DefinitionError> {
        let definition: SchemaDefinition = serde_json::from_str(json)?;
        Ok(Self::from_definition(definition, registry)?)
    }
}

fn check_bound(field: &SchemaField, bound: &Bound) -> Result<(), String> {
    let type_name = field.type_name();
    match (type_name, bound) {
        (TypeName::Date | TypeName::Datetime, Bound::Text(text)) => {
            let parsed = field.field_type.coerce(&RawValue::from(text.as_str()), &[]);
            match parsed.into_option() {
                Some(_) => Ok(()),
                None => Err(format!("bound `{text}` is not a valid {type_name}")),
            }
        }
        (TypeName::Date | TypeName::Datetime, Bound::Number(_)) => {
            Err(format!("{type_name} bounds must be ISO-8601 text"))
        }
        (_, Bound::Number(_)) => Ok(()),
        (_, Bound::Text(text)) => Err(format!("bound `{text}` must be numeric for {type_name}")),
    }
}

fn default_missing_values() -> Vec<String> {
    vec![String::new()]
}

/// Serialized form of a schema.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SchemaDefinition {
    pub name: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default = "default_missing_values")]
    pub missing_values: Vec<String>,
    pub fields: Vec<FieldDefinition>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldDefinition {
    pub name: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(rename = "type")]
    pub field_type: String,
    #[serde(default)]
    pub constraints: Vec<Constraint>,
    #[serde(default)]
    pub foreign_key: bool,
}
