//! Polars AnyValue conversions.

use polars::prelude::*;
use xwalk_model::RawValue;

/// Converts a Polars AnyValue into an untyped source scalar.
///
/// Temporal and nested values are carried as their text rendering.
pub fn any_to_raw(value: AnyValue<'_>) -> RawValue {
    match value {
        AnyValue::Null => RawValue::Null,
        AnyValue::Boolean(b) => RawValue::Boolean(b),
        AnyValue::Int8(v) => RawValue::Integer(i64::from(v)),
        AnyValue::Int16(v) => RawValue::Integer(i64::from(v)),
        AnyValue::Int32(v) => RawValue::Integer(i64::from(v)),
        AnyValue::Int64(v) => RawValue::Integer(v),
        AnyValue::UInt8(v) => RawValue::Integer(i64::from(v)),
        AnyValue::UInt16(v) => RawValue::Integer(i64::from(v)),
        AnyValue::UInt32(v) => RawValue::Integer(i64::from(v)),
        AnyValue::UInt64(v) => match i64::try_from(v) {
            Ok(v) => RawValue::Integer(v),
            Err(_) => RawValue::Text(v.to_string()),
        },
        AnyValue::Float32(v) => RawValue::Float(f64::from(v)),
        AnyValue::Float64(v) => RawValue::Float(v),
        AnyValue::String(s) => RawValue::Text(s.to_string()),
        AnyValue::StringOwned(s) => RawValue::Text(s.to_string()),
        other => RawValue::Text(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn converts_scalars() {
        assert_eq!(any_to_raw(AnyValue::Null), RawValue::Null);
        assert_eq!(any_to_raw(AnyValue::Int32(7)), RawValue::Integer(7));
        assert_eq!(any_to_raw(AnyValue::Float64(1.5)), RawValue::Float(1.5));
        assert_eq!(any_to_raw(AnyValue::String("x")), RawValue::from("x"));
        assert_eq!(any_to_raw(AnyValue::Boolean(true)), RawValue::Boolean(true));
    }
}
