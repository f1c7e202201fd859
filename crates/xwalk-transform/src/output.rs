//! Rendering and writing evaluation output.

use std::fs;
use std::path::Path;

use polars::prelude::{CsvWriter, SerWriter};
use serde::ser::{Serialize, SerializeMap, SerializeSeq, Serializer};
use sha2::{Digest, Sha256};
use xwalk_model::{DestinationTable, OutputFormat, Schema};

use crate::engine::Evaluation;
use crate::error::OutputError;

/// Render an evaluation as CSV or JSON records.
///
/// Rendering is deterministic: the same evaluation always produces the same
/// bytes.
pub fn render_output(
    evaluation: &Evaluation,
    schema: &Schema,
    format: OutputFormat,
) -> Result<Vec<u8>, OutputError> {
    match format {
        OutputFormat::Csv => {
            let mut frame = evaluation.frame.clone();
            let mut buf = Vec::new();
            CsvWriter::new(&mut buf)
                .include_header(true)
                .finish(&mut frame)?;
            Ok(buf)
        }
        OutputFormat::Json => {
            let records = Records {
                schema,
                table: &evaluation.table,
            };
            let mut buf = serde_json::to_vec_pretty(&records)?;
            buf.push(b'\n');
            Ok(buf)
        }
    }
}

/// SHA-256 of rendered output, hex encoded.
pub fn fingerprint(bytes: &[u8]) -> String {
    hex::encode(Sha256::digest(bytes))
}

/// Write rendered output, creating parent directories as needed.
pub fn write_output(path: &Path, bytes: &[u8]) -> Result<(), OutputError> {
    let io_err = |source: std::io::Error| OutputError::Io {
        path: path.to_path_buf(),
        source,
    };
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent).map_err(io_err)?;
    }
    fs::write(path, bytes).map_err(io_err)
}

/// Rows as JSON objects with keys in schema order.
struct Records<'a> {
    schema: &'a Schema,
    table: &'a DestinationTable,
}

struct Record<'a> {
    schema: &'a Schema,
    table: &'a DestinationTable,
    row: usize,
}

impl Serialize for Records<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut seq = serializer.serialize_seq(Some(self.table.row_count))?;
        for row in 0..self.table.row_count {
            seq.serialize_element(&Record {
                schema: self.schema,
                table: self.table,
                row,
            })?;
        }
        seq.end()
    }
}

impl Serialize for Record<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let fields = self.schema.fields();
        let mut map = serializer.serialize_map(Some(fields.len()))?;
        for field in fields {
            let value = self
                .table
                .column(&field.name)
                .and_then(|column| column.values.get(self.row))
                .and_then(Option::as_ref)
                .map_or_else(|| field.missing_value().to_json(), |value| value.to_json());
            map.serialize_entry(&field.name, &value)?;
        }
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fingerprint_is_hex_sha256() {
        assert_eq!(
            fingerprint(b"abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn write_output_creates_parent_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("out.csv");
        write_output(&path, b"a\n1\n").unwrap();
        assert_eq!(std::fs::read(&path).unwrap(), b"a\n1\n");
    }
}
