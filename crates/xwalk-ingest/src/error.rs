//! Error types for tabular data providers and ingestion.

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while a provider serves column data.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("column '{column}' not found")]
    UnknownColumn { column: String },

    /// Spilled data could not be reloaded within the retry budget.
    #[error("storage unavailable for column '{column}' after {attempts} attempts: {message}")]
    StorageUnavailable {
        column: String,
        attempts: usize,
        message: String,
    },

    #[error("DataFrame operation failed: {message}")]
    DataFrame { message: String },
}

impl From<polars::prelude::PolarsError> for ProviderError {
    fn from(err: polars::prelude::PolarsError) -> Self {
        Self::DataFrame {
            message: err.to_string(),
        }
    }
}

/// Errors that can occur while loading source files.
#[derive(Debug, Error)]
pub enum IngestError {
    /// CSV file not found.
    #[error("CSV file not found: {path}")]
    FileNotFound { path: PathBuf },

    /// Failed to parse CSV with Polars.
    #[error("failed to parse CSV {path}: {message}")]
    CsvParse { path: PathBuf, message: String },

    /// A header cell is blank.
    #[error("empty column name at position {index} in {path}")]
    EmptyColumnName { path: PathBuf, index: usize },

    #[error("duplicate column name '{column}' in {path}")]
    DuplicateColumn { path: PathBuf, column: String },
}

pub type Result<T> = std::result::Result<T, IngestError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = IngestError::FileNotFound {
            path: PathBuf::from("/path/to/file.csv"),
        };
        assert_eq!(err.to_string(), "CSV file not found: /path/to/file.csv");
    }

    #[test]
    fn test_error_from_polars() {
        let polars_err = polars::prelude::PolarsError::ColumnNotFound("test".into());
        let provider_err: ProviderError = polars_err.into();
        assert!(matches!(provider_err, ProviderError::DataFrame { .. }));
    }
}
