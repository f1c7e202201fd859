//! The tabular data contract consumed by validation and evaluation.

use polars::prelude::*;
use xwalk_model::RawValue;

use crate::error::ProviderError;
use crate::polars_utils::any_to_raw;

/// Column-oriented access to source data.
///
/// Implementations must be shareable across the evaluation thread pool.
pub trait TabularProvider: Send + Sync {
    fn column_names(&self) -> Vec<String>;

    fn row_count(&self) -> usize;

    /// All values of one column, in row order.
    fn read_column(&self, name: &str) -> Result<Vec<RawValue>, ProviderError>;

    /// Release any on-disk artifacts. Providers without spill storage do nothing.
    fn discard_spill(&self) {}

    fn has_column(&self, name: &str) -> bool {
        self.column_names().iter().any(|c| c == name)
    }
}

/// Provider over an in-memory polars DataFrame.
#[derive(Debug, Clone)]
pub struct FrameProvider {
    frame: DataFrame,
}

impl FrameProvider {
    pub fn new(frame: DataFrame) -> Self {
        Self { frame }
    }

    pub fn frame(&self) -> &DataFrame {
        &self.frame
    }
}

impl From<DataFrame> for FrameProvider {
    fn from(frame: DataFrame) -> Self {
        Self::new(frame)
    }
}

impl TabularProvider for FrameProvider {
    fn column_names(&self) -> Vec<String> {
        self.frame
            .get_column_names()
            .into_iter()
            .map(|name| name.to_string())
            .collect()
    }

    fn row_count(&self) -> usize {
        self.frame.height()
    }

    fn read_column(&self, name: &str) -> Result<Vec<RawValue>, ProviderError> {
        let column = self
            .frame
            .column(name)
            .map_err(|_| ProviderError::UnknownColumn {
                column: name.to_string(),
            })?;
        let mut values = Vec::with_capacity(column.len());
        for idx in 0..column.len() {
            values.push(any_to_raw(column.get(idx)?));
        }
        Ok(values)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_columns_in_row_order() {
        let df = DataFrame::new(vec![
            Column::new("id".into(), [1i64, 2, 3]),
            Column::new("name".into(), [Some("a"), None, Some("c")]),
        ])
        .unwrap();
        let provider = FrameProvider::new(df);
        assert_eq!(provider.column_names(), vec!["id", "name"]);
        assert_eq!(provider.row_count(), 3);
        assert_eq!(
            provider.read_column("name").unwrap(),
            vec![RawValue::from("a"), RawValue::Null, RawValue::from("c")]
        );
        assert!(matches!(
            provider.read_column("missing"),
            Err(ProviderError::UnknownColumn { .. })
        ));
    }
}
