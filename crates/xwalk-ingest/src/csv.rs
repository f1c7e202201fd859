//! CSV loading through polars.

use std::collections::BTreeSet;
use std::path::Path;

use polars::prelude::*;
use tracing::debug;

use crate::error::{IngestError, Result};

/// Reads a CSV file into a DataFrame with every column kept as text.
///
/// Type coercion is the destination schema's job, so no schema inference is
/// done here; leading zeros and mixed columns survive untouched.
pub fn read_csv_frame(path: &Path) -> Result<DataFrame> {
    if !path.is_file() {
        return Err(IngestError::FileNotFound {
            path: path.to_path_buf(),
        });
    }
    let df = CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(Some(0))
        .try_into_reader_with_file_path(Some(path.to_path_buf()))
        .map_err(|e| IngestError::CsvParse {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?
        .finish()
        .map_err(|e| IngestError::CsvParse {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;

    let mut seen = BTreeSet::new();
    for (index, name) in df.get_column_names().into_iter().enumerate() {
        let name = name.as_str();
        if name.trim().is_empty() {
            return Err(IngestError::EmptyColumnName {
                path: path.to_path_buf(),
                index,
            });
        }
        if !seen.insert(name.to_string()) {
            return Err(IngestError::DuplicateColumn {
                path: path.to_path_buf(),
                column: name.to_string(),
            });
        }
    }
    debug!(path = %path.display(), rows = df.height(), columns = df.width(), "loaded csv");
    Ok(df)
}
