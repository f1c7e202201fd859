//! Field constraints.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::field_type::TypeName;

/// Constraint vocabulary a field type may allow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ConstraintKind {
    Required,
    Unique,
    Category,
    Minimum,
    Maximum,
    ValueType,
    Filter,
}

impl ConstraintKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConstraintKind::Required => "required",
            ConstraintKind::Unique => "unique",
            ConstraintKind::Category => "category",
            ConstraintKind::Minimum => "minimum",
            ConstraintKind::Maximum => "maximum",
            ConstraintKind::ValueType => "valueType",
            ConstraintKind::Filter => "filter",
        }
    }
}

impl fmt::Display for ConstraintKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A controlled-vocabulary term of a `category` constraint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryTerm {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl CategoryTerm {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
        }
    }
}

/// Bound of a `minimum`/`maximum` constraint.
///
/// Numbers bound numeric values and the length of strings and arrays; text
/// bounds are ISO-8601 dates or datetimes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Bound {
    Number(f64),
    Text(String),
}

impl fmt::Display for Bound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Bound::Number(v) => write!(f, "{}", crate::value::format_numeric(*v)),
            Bound::Text(s) => f.write_str(s),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Constraint {
    Required(bool),
    Unique(bool),
    Category {
        terms: Vec<CategoryTerm>,
        #[serde(default, rename = "minItems")]
        min_items: usize,
    },
    Minimum(Bound),
    Maximum(Bound),
    /// Item type of array contents.
    ValueType(TypeName),
    /// Name of a temporal field bounding a date-bound foreign key.
    Filter(String),
}

impl Constraint {
    pub fn kind(&self) -> ConstraintKind {
        match self {
            Constraint::Required(_) => ConstraintKind::Required,
            Constraint::Unique(_) => ConstraintKind::Unique,
            Constraint::Category { .. } => ConstraintKind::Category,
            Constraint::Minimum(_) => ConstraintKind::Minimum,
            Constraint::Maximum(_) => ConstraintKind::Maximum,
            Constraint::ValueType(_) => ConstraintKind::ValueType,
            Constraint::Filter(_) => ConstraintKind::Filter,
        }
    }

    /// Category constraint built from bare term names.
    pub fn category<I, S>(terms: I, min_items: usize) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Constraint::Category {
            terms: terms.into_iter().map(CategoryTerm::new).collect(),
            min_items,
        }
    }
}
