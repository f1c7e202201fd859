//! Destination columns as produced by evaluation.

use serde::Serialize;

use crate::value::Value;

/// Values of one destination field. `None` marks an absent value that has
/// not yet been replaced by the field's missing default.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DestinationColumn {
    pub name: String,
    pub values: Vec<Option<Value>>,
}

impl DestinationColumn {
    pub fn new(name: impl Into<String>, values: Vec<Option<Value>>) -> Self {
        Self {
            name: name.into(),
            values,
        }
    }

    /// Column in which every row is absent.
    pub fn absent(name: impl Into<String>, rows: usize) -> Self {
        Self::new(name, vec![None; rows])
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn absent_count(&self) -> usize {
        self.values.iter().filter(|v| v.is_none()).count()
    }
}

/// Destination columns in schema order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DestinationTable {
    pub columns: Vec<DestinationColumn>,
    pub row_count: usize,
}

impl DestinationTable {
    pub fn new(row_count: usize) -> Self {
        Self {
            columns: Vec::new(),
            row_count,
        }
    }

    pub fn push(&mut self, column: DestinationColumn) {
        self.columns.push(column);
    }

    pub fn column(&self, name: &str) -> Option<&DestinationColumn> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|c| c.name.as_str())
    }
}
