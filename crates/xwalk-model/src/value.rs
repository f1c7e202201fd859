//! Raw and typed cell values.
//!
//! [`RawValue`] is what a tabular provider hands over: an untyped scalar with
//! no knowledge of the destination schema. [`Value`] is the typed
//! representation a destination field holds after coercion.

use std::fmt;

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// Untyped scalar as read from a source column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "lowercase")]
pub enum RawValue {
    Null,
    Text(String),
    Integer(i64),
    Float(f64),
    Boolean(bool),
}

impl RawValue {
    /// Returns true if the value counts as absent.
    ///
    /// Nulls, NaN, blank strings and any token listed in `missing_values`
    /// (compared after trimming) are absent.
    pub fn is_absent(&self, missing_values: &[String]) -> bool {
        match self {
            RawValue::Null => true,
            RawValue::Float(v) => v.is_nan(),
            RawValue::Text(s) => {
                let trimmed = s.trim();
                trimmed.is_empty() || missing_values.iter().any(|token| token.trim() == trimmed)
            }
            RawValue::Integer(_) | RawValue::Boolean(_) => false,
        }
    }

    /// Text representation, `None` for nulls.
    pub fn to_text(&self) -> Option<String> {
        match self {
            RawValue::Null => None,
            RawValue::Text(s) => Some(s.trim().to_string()),
            RawValue::Integer(v) => Some(v.to_string()),
            RawValue::Float(v) if v.is_nan() => None,
            RawValue::Float(v) => Some(format_numeric(*v)),
            RawValue::Boolean(b) => Some(b.to_string()),
        }
    }
}

impl From<&serde_json::Value> for RawValue {
    fn from(value: &serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => RawValue::Null,
            serde_json::Value::Bool(b) => RawValue::Boolean(*b),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(v) => RawValue::Integer(v),
                None => n.as_f64().map_or(RawValue::Null, RawValue::Float),
            },
            serde_json::Value::String(s) => RawValue::Text(s.clone()),
            other => RawValue::Text(other.to_string()),
        }
    }
}

impl From<&str> for RawValue {
    fn from(value: &str) -> Self {
        RawValue::Text(value.to_string())
    }
}

impl From<String> for RawValue {
    fn from(value: String) -> Self {
        RawValue::Text(value)
    }
}

impl From<i64> for RawValue {
    fn from(value: i64) -> Self {
        RawValue::Integer(value)
    }
}

impl From<f64> for RawValue {
    fn from(value: f64) -> Self {
        RawValue::Float(value)
    }
}

impl From<bool> for RawValue {
    fn from(value: bool) -> Self {
        RawValue::Boolean(value)
    }
}

impl<T: Into<RawValue>> From<Option<T>> for RawValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(RawValue::Null, Into::into)
    }
}

/// Typed value held by a destination field.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Value {
    Null,
    Boolean(bool),
    Integer(i64),
    Number(f64),
    Text(String),
    Date(NaiveDate),
    DateTime(NaiveDateTime),
    Year(i32),
    Array(Vec<Value>),
    Object(serde_json::Map<String, serde_json::Value>),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Canonical text form used for output, joins and uniqueness checks.
    ///
    /// Lossless: distinct values of one type never render alike.
    pub fn render(&self) -> Option<String> {
        match self {
            Value::Null => None,
            Value::Boolean(b) => Some(b.to_string()),
            Value::Integer(v) => Some(v.to_string()),
            Value::Number(v) => Some(format_numeric(*v)),
            Value::Text(s) => Some(s.clone()),
            Value::Date(d) => Some(d.format("%Y-%m-%d").to_string()),
            Value::DateTime(dt) => Some(dt.format("%Y-%m-%dT%H:%M:%S%.f").to_string()),
            Value::Year(y) => Some(format!("{y:04}")),
            Value::Array(_) | Value::Object(_) => Some(self.to_json().to_string()),
        }
    }

    /// Numeric view of integer, number and year values.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Integer(v) => Some(*v as f64),
            Value::Number(v) => Some(*v),
            Value::Year(y) => Some(f64::from(*y)),
            _ => None,
        }
    }

    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Value::Null => serde_json::Value::Null,
            Value::Boolean(b) => serde_json::Value::Bool(*b),
            Value::Integer(v) => serde_json::Value::from(*v),
            Value::Number(v) => serde_json::Number::from_f64(*v)
                .map_or(serde_json::Value::Null, serde_json::Value::Number),
            Value::Year(y) => serde_json::Value::from(*y),
            Value::Text(_) | Value::Date(_) | Value::DateTime(_) => self
                .render()
                .map_or(serde_json::Value::Null, serde_json::Value::String),
            Value::Array(items) => {
                serde_json::Value::Array(items.iter().map(Value::to_json).collect())
            }
            Value::Object(map) => serde_json::Value::Object(map.clone()),
        }
    }

    pub fn from_json(json: serde_json::Value) -> Self {
        match json {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Boolean(b),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(v) => Value::Integer(v),
                None => n.as_f64().map_or(Value::Null, Value::Number),
            },
            serde_json::Value::String(s) => Value::Text(s),
            serde_json::Value::Array(items) => {
                Value::Array(items.into_iter().map(Value::from_json).collect())
            }
            serde_json::Value::Object(map) => Value::Object(map),
        }
    }

    /// Convert back to an untyped scalar, e.g. to re-coerce array items.
    pub fn to_raw(&self) -> RawValue {
        match self {
            Value::Null => RawValue::Null,
            Value::Boolean(b) => RawValue::Boolean(*b),
            Value::Integer(v) => RawValue::Integer(*v),
            Value::Number(v) => RawValue::Float(*v),
            Value::Year(y) => RawValue::Integer(i64::from(*y)),
            other => other.render().map_or(RawValue::Null, RawValue::Text),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.render().as_deref().unwrap_or(""))
    }
}

/// Formats a floating-point number without a redundant fractional part.
pub fn format_numeric(v: f64) -> String {
    let s = format!("{v}");
    if s.contains('.') && !s.contains('e') {
        s.trim_end_matches('0').trim_end_matches('.').to_string()
    } else {
        s
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_and_listed_tokens_are_absent() {
        let missing = vec!["NA".to_string(), "-".to_string()];
        assert!(RawValue::Null.is_absent(&missing));
        assert!(RawValue::from("   ").is_absent(&missing));
        assert!(RawValue::from(" NA ").is_absent(&missing));
        assert!(RawValue::from(f64::NAN).is_absent(&missing));
        assert!(!RawValue::from("N/A").is_absent(&missing));
        assert!(!RawValue::from(0_i64).is_absent(&missing));
    }

    #[test]
    fn format_numeric_keeps_integral_digits() {
        assert_eq!(format_numeric(10.0), "10");
        assert_eq!(format_numeric(2.50), "2.5");
        assert_eq!(format_numeric(-0.125), "-0.125");
    }

    #[test]
    fn render_uses_iso_for_temporal_values() {
        let date = NaiveDate::from_ymd_opt(2021, 3, 4).unwrap();
        assert_eq!(Value::Date(date).render().as_deref(), Some("2021-03-04"));
        let dt = date.and_hms_opt(5, 6, 7).unwrap();
        assert_eq!(
            Value::DateTime(dt).render().as_deref(),
            Some("2021-03-04T05:06:07")
        );
        let precise = date.and_hms_milli_opt(5, 6, 7, 250).unwrap();
        assert_eq!(
            Value::DateTime(precise).render().as_deref(),
            Some("2021-03-04T05:06:07.250")
        );
        assert_eq!(Value::Year(987).render().as_deref(), Some("0987"));
    }
}
