//! Destination constraint enforcement, run after evaluation.

use std::cmp::Ordering;
use std::collections::HashMap;

use tracing::warn;
use xwalk_model::{
    Bound, DestinationColumn, DestinationTable, ErrorKind, RawValue, Schema, SchemaField,
    TypedError, ValidationReport, Value,
};

/// Check `required`, `unique`, `minimum`/`maximum` and `category` on every
/// destination column. Findings are warnings; callers apply strict policy.
pub fn enforce_constraints(schema: &Schema, table: &DestinationTable) -> ValidationReport {
    let mut report = ValidationReport::new();
    for field in schema.fields() {
        let Some(column) = table.column(&field.name) else {
            continue;
        };
        check_required(field, column, &mut report);
        check_unique(field, column, &mut report);
        check_range(field, column, &mut report);
        check_category(field, column, &mut report);
    }
    for issue in report.errors() {
        warn!(
            field = issue.field.as_deref().unwrap_or(""),
            kind = %issue.kind,
            "{}",
            issue.message
        );
    }
    report
}

fn violation(kind: ErrorKind, field: &SchemaField, count: usize, message: String) -> TypedError {
    TypedError::warning(kind, message)
        .on_field(&field.name)
        .with_count(count as u64)
}

fn check_required(field: &SchemaField, column: &DestinationColumn, report: &mut ValidationReport) {
    if !field.is_required() {
        return;
    }
    let missing = column
        .values
        .iter()
        .filter(|v| v.as_ref().is_none_or(Value::is_null))
        .count();
    if missing > 0 {
        report.push(violation(
            ErrorKind::RequiredViolation,
            field,
            missing,
            format!("required field `{}` is missing in {missing} rows", field.name),
        ));
    }
}

fn check_unique(field: &SchemaField, column: &DestinationColumn, report: &mut ValidationReport) {
    if !field.is_unique() {
        return;
    }
    let mut seen: HashMap<String, usize> = HashMap::new();
    for value in column.values.iter().flatten() {
        if let Some(key) = value.render() {
            *seen.entry(key).or_default() += 1;
        }
    }
    let mut duplicated: Vec<(&String, &usize)> = seen.iter().filter(|(_, n)| **n > 1).collect();
    if duplicated.is_empty() {
        return;
    }
    duplicated.sort();
    let rows: usize = duplicated.iter().map(|(_, n)| **n).sum();
    let listed = duplicated
        .iter()
        .take(5)
        .map(|(key, _)| format!("`{key}`"))
        .collect::<Vec<_>>()
        .join(", ");
    report.push(violation(
        ErrorKind::UniqueViolation,
        field,
        rows,
        format!("duplicate values in unique field `{}`: {listed}", field.name),
    ));
}

fn check_range(field: &SchemaField, column: &DestinationColumn, report: &mut ValidationReport) {
    let bounds = [
        (field.minimum(), Ordering::Less, "below minimum"),
        (field.maximum(), Ordering::Greater, "above maximum"),
    ];
    for (bound, outside, label) in bounds {
        let Some(bound) = bound else {
            continue;
        };
        let Some(bound_value) = resolve_bound(field, bound) else {
            continue;
        };
        let count = column
            .values
            .iter()
            .flatten()
            .filter(|value| compare(value, &bound_value) == Some(outside))
            .count();
        if count > 0 {
            report.push(violation(
                ErrorKind::RangeViolation,
                field,
                count,
                format!("{count} values of `{}` are {label} {bound}", field.name),
            ));
        }
    }
}

/// Bound as a comparable value: a number, or a parsed date/datetime.
fn resolve_bound(field: &SchemaField, bound: &Bound) -> Option<Value> {
    match bound {
        Bound::Number(v) => Some(Value::Number(*v)),
        Bound::Text(text) => field
            .field_type
            .coerce(&RawValue::from(text.as_str()), &[])
            .into_option(),
    }
}

/// Numbers compare by value, text and arrays by length, temporal values
/// chronologically.
fn compare(value: &Value, bound: &Value) -> Option<Ordering> {
    match (value, bound) {
        (Value::Text(s), Value::Number(b)) => (s.chars().count() as f64).partial_cmp(b),
        (Value::Array(items), Value::Number(b)) => (items.len() as f64).partial_cmp(b),
        (Value::Date(a), Value::Date(b)) => Some(a.cmp(b)),
        (Value::DateTime(a), Value::DateTime(b)) => Some(a.cmp(b)),
        (v, Value::Number(b)) => v.as_f64()?.partial_cmp(b),
        _ => None,
    }
}

fn check_category(field: &SchemaField, column: &DestinationColumn, report: &mut ValidationReport) {
    if field.category_terms().is_none() {
        return;
    }
    let mut offending = Vec::new();
    let mut rows = 0usize;
    for value in column.values.iter().flatten() {
        let items: Vec<String> = match value {
            Value::Array(items) => items.iter().filter_map(Value::render).collect(),
            other => other.render().into_iter().collect(),
        };
        let bad: Vec<String> = items
            .into_iter()
            .filter(|item| !item.is_empty() && !field.allows_term(item))
            .collect();
        if !bad.is_empty() {
            rows += 1;
            for item in bad {
                if !offending.contains(&item) {
                    offending.push(item);
                }
            }
        }
    }
    if rows > 0 {
        let listed = offending
            .iter()
            .take(5)
            .map(|v| format!("`{v}`"))
            .collect::<Vec<_>>()
            .join(", ");
        report.push(violation(
            ErrorKind::CategoryViolation,
            field,
            rows,
            format!("values outside the categories of `{}`: {listed}", field.name),
        ));
    }
}
