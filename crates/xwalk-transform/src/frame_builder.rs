//! Materialise a destination table as a polars `DataFrame`.

use polars::prelude::{Column, DataFrame, NamedFrom, PolarsResult, Series};
use xwalk_model::{DestinationTable, Schema, SchemaField, TypeName, Value};

/// Build a frame with one column per schema field, in schema order.
///
/// Absent cells take the field's missing default. Numbers become `f64`
/// columns, integers and years `i64`, booleans `bool`; everything else is
/// rendered as text (ISO-8601 for temporal values, JSON for arrays and
/// objects).
pub fn build_frame(schema: &Schema, table: &DestinationTable) -> PolarsResult<DataFrame> {
    let columns: Vec<Column> = schema
        .fields()
        .iter()
        .map(|field| build_column(field, table))
        .collect();
    DataFrame::new(columns)
}

fn build_column(field: &SchemaField, table: &DestinationTable) -> Column {
    let rows = table.row_count;
    let values = table
        .column(&field.name)
        .map(|column| column.values.as_slice())
        .unwrap_or(&[]);
    let default = field.missing_value();
    let cells = (0..rows).map(|idx| match values.get(idx) {
        Some(Some(value)) => value,
        _ => &default,
    });
    let name = field.name.as_str().into();
    match field.type_name() {
        TypeName::Number => {
            let data: Vec<Option<f64>> = cells.map(Value::as_f64).collect();
            Series::new(name, data).into()
        }
        TypeName::Integer | TypeName::Year => {
            let data: Vec<Option<i64>> = cells
                .map(|value| match value {
                    Value::Integer(v) => Some(*v),
                    Value::Year(y) => Some(i64::from(*y)),
                    _ => None,
                })
                .collect();
            Series::new(name, data).into()
        }
        TypeName::Boolean => {
            let data: Vec<Option<bool>> = cells
                .map(|value| match value {
                    Value::Boolean(b) => Some(*b),
                    _ => None,
                })
                .collect();
            Series::new(name, data).into()
        }
        _ => {
            let data: Vec<Option<String>> = cells.map(Value::render).collect();
            Series::new(name, data).into()
        }
    }
}
