//! Field Type Registry.
//!
//! A [`FieldType`] describes how raw source scalars are coerced into a
//! destination field, which constraints the field may carry, and what a field
//! holds when the source value is absent. Registries are immutable values
//! built once from the catalogue and passed explicitly to whoever needs them.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};

use crate::constraint::{Constraint, ConstraintKind};
use crate::error::RegistryError;
use crate::schema::SchemaField;
use crate::value::{RawValue, Value};

const TRUE_VALUES: &[&str] = &["true", "t", "yes", "y", "1"];
const FALSE_VALUES: &[&str] = &["false", "f", "no", "n", "0"];

/// ISO-8601 calendar date layouts used when a catalogue declares none.
const DEFAULT_DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y%m%d"];

/// ISO-8601 datetime layouts used when a catalogue declares none.
const DEFAULT_DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TypeName {
    String,
    Number,
    Integer,
    Boolean,
    Object,
    Array,
    Date,
    Datetime,
    Year,
}

impl TypeName {
    pub const ALL: [TypeName; 9] = [
        TypeName::String,
        TypeName::Number,
        TypeName::Integer,
        TypeName::Boolean,
        TypeName::Object,
        TypeName::Array,
        TypeName::Date,
        TypeName::Datetime,
        TypeName::Year,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TypeName::String => "string",
            TypeName::Number => "number",
            TypeName::Integer => "integer",
            TypeName::Boolean => "boolean",
            TypeName::Object => "object",
            TypeName::Array => "array",
            TypeName::Date => "date",
            TypeName::Datetime => "datetime",
            TypeName::Year => "year",
        }
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, TypeName::Number | TypeName::Integer)
    }

    pub fn is_temporal(&self) -> bool {
        matches!(self, TypeName::Date | TypeName::Datetime | TypeName::Year)
    }
}

impl fmt::Display for TypeName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TypeName {
    type Err = RegistryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase();
        TypeName::ALL
            .into_iter()
            .find(|name| name.as_str() == normalized)
            .ok_or_else(|| RegistryError::UnknownType(s.trim().to_string()))
    }
}

/// Declared substitute for absent or unparseable source values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MissingDefault {
    /// Leave the cell null.
    Null,
    /// Empty string, array or object.
    Empty,
    /// Numeric zero.
    Zero,
    /// Boolean false.
    False,
}

impl MissingDefault {
    pub fn as_str(&self) -> &'static str {
        match self {
            MissingDefault::Null => "null",
            MissingDefault::Empty => "empty",
            MissingDefault::Zero => "zero",
            MissingDefault::False => "false",
        }
    }

    /// Returns true if the token has a meaning for the given type.
    pub fn applies_to(&self, type_name: TypeName) -> bool {
        match self {
            MissingDefault::Null => true,
            MissingDefault::Empty => matches!(
                type_name,
                TypeName::String | TypeName::Array | TypeName::Object
            ),
            MissingDefault::Zero => type_name.is_numeric(),
            MissingDefault::False => type_name == TypeName::Boolean,
        }
    }

    pub fn resolve(&self, type_name: TypeName) -> Value {
        match (self, type_name) {
            (MissingDefault::Empty, TypeName::String) => Value::Text(String::new()),
            (MissingDefault::Empty, TypeName::Array) => Value::Array(Vec::new()),
            (MissingDefault::Empty, TypeName::Object) => Value::Object(serde_json::Map::new()),
            (MissingDefault::Zero, TypeName::Integer) => Value::Integer(0),
            (MissingDefault::Zero, TypeName::Number) => Value::Number(0.0),
            (MissingDefault::False, TypeName::Boolean) => Value::Boolean(false),
            _ => Value::Null,
        }
    }
}

/// Outcome of coercing one raw scalar.
#[derive(Debug, Clone, PartialEq)]
pub enum Coercion {
    Value(Value),
    /// The source value was null, blank or a declared missing token.
    Absent,
    /// A non-empty value that does not parse as the field type.
    Failed,
}

impl Coercion {
    pub fn into_option(self) -> Option<Value> {
        match self {
            Coercion::Value(value) => Some(value),
            Coercion::Absent | Coercion::Failed => None,
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, Coercion::Failed)
    }

    /// The coerced value, or the type's missing default.
    pub fn value_or_default(self, field_type: &FieldType) -> Value {
        match self {
            Coercion::Value(value) => value,
            Coercion::Absent | Coercion::Failed => field_type.missing_value(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldType {
    pub name: TypeName,
    pub description: String,
    pub allowed_constraints: BTreeSet<ConstraintKind>,
    pub missing_default: MissingDefault,
    /// chrono parse layouts, tried in order (temporal types only).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub formats: Vec<String>,
}

impl FieldType {
    pub fn new(name: TypeName, description: impl Into<String>) -> Self {
        Self {
            name,
            description: description.into(),
            allowed_constraints: BTreeSet::new(),
            missing_default: MissingDefault::Null,
            formats: Vec::new(),
        }
    }

    pub fn allowing<I>(mut self, kinds: I) -> Self
    where
        I: IntoIterator<Item = ConstraintKind>,
    {
        self.allowed_constraints.extend(kinds);
        self
    }

    pub fn with_missing_default(mut self, missing_default: MissingDefault) -> Self {
        self.missing_default = missing_default;
        self
    }

    pub fn with_formats<I, S>(mut self, formats: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.formats = formats.into_iter().map(Into::into).collect();
        self
    }

    pub fn allows(&self, kind: ConstraintKind) -> bool {
        self.allowed_constraints.contains(&kind)
    }

    pub fn missing_value(&self) -> Value {
        self.missing_default.resolve(self.name)
    }

    /// Coerce a raw scalar into this type. Never fails: bad input is
    /// reported through [`Coercion::Failed`].
    pub fn coerce(&self, raw: &RawValue, missing_values: &[String]) -> Coercion {
        if raw.is_absent(missing_values) {
            return Coercion::Absent;
        }
        let parsed = match self.name {
            TypeName::String => raw.to_text().map(Value::Text),
            TypeName::Number => coerce_number(raw).map(Value::Number),
            TypeName::Integer => coerce_integer(raw).map(Value::Integer),
            TypeName::Boolean => coerce_boolean(raw).map(Value::Boolean),
            TypeName::Object => match coerce_json(raw) {
                Some(serde_json::Value::Object(map)) => Some(Value::Object(map)),
                _ => None,
            },
            TypeName::Array => match coerce_json(raw) {
                Some(serde_json::Value::Array(items)) => Some(Value::Array(
                    items.into_iter().map(Value::from_json).collect(),
                )),
                _ => None,
            },
            TypeName::Date => self.parse_date(raw).map(Value::Date),
            TypeName::Datetime => self.parse_datetime(raw).map(Value::DateTime),
            TypeName::Year => coerce_year(raw).map(Value::Year),
        };
        parsed.map_or(Coercion::Failed, Coercion::Value)
    }

    fn layouts<'a>(&'a self, defaults: &'a [&'a str]) -> Vec<&'a str> {
        if self.formats.is_empty() {
            defaults.to_vec()
        } else {
            self.formats.iter().map(String::as_str).collect()
        }
    }

    fn parse_date(&self, raw: &RawValue) -> Option<NaiveDate> {
        let RawValue::Text(text) = raw else {
            return None;
        };
        let text = text.trim();
        self.layouts(DEFAULT_DATE_FORMATS)
            .into_iter()
            .find_map(|layout| NaiveDate::parse_from_str(text, layout).ok())
    }

    fn parse_datetime(&self, raw: &RawValue) -> Option<NaiveDateTime> {
        let RawValue::Text(text) = raw else {
            return None;
        };
        let text = text.trim();
        self.layouts(DEFAULT_DATETIME_FORMATS)
            .into_iter()
            .find_map(|layout| NaiveDateTime::parse_from_str(text, layout).ok())
            .or_else(|| {
                DateTime::parse_from_rfc3339(text)
                    .ok()
                    .map(|dt| dt.naive_utc())
            })
            .or_else(|| {
                DEFAULT_DATE_FORMATS
                    .iter()
                    .find_map(|layout| NaiveDate::parse_from_str(text, layout).ok())
                    .map(|date| date.and_time(NaiveTime::MIN))
            })
    }
}

fn coerce_number(raw: &RawValue) -> Option<f64> {
    let value = match raw {
        RawValue::Float(v) => *v,
        RawValue::Integer(v) => *v as f64,
        RawValue::Text(s) => s.trim().parse::<f64>().ok()?,
        RawValue::Null | RawValue::Boolean(_) => return None,
    };
    value.is_finite().then_some(value)
}

fn coerce_integer(raw: &RawValue) -> Option<i64> {
    match raw {
        RawValue::Integer(v) => Some(*v),
        RawValue::Float(v) => integral(*v),
        RawValue::Text(s) => {
            let trimmed = s.trim();
            trimmed
                .parse::<i64>()
                .ok()
                .or_else(|| trimmed.parse::<f64>().ok().and_then(integral))
        }
        RawValue::Null | RawValue::Boolean(_) => None,
    }
}

fn integral(v: f64) -> Option<i64> {
    (v.is_finite() && v.fract() == 0.0 && v.abs() < 9.0e15).then_some(v as i64)
}

fn coerce_boolean(raw: &RawValue) -> Option<bool> {
    match raw {
        RawValue::Boolean(b) => Some(*b),
        RawValue::Integer(1) => Some(true),
        RawValue::Integer(0) => Some(false),
        RawValue::Float(v) if *v == 1.0 => Some(true),
        RawValue::Float(v) if *v == 0.0 => Some(false),
        RawValue::Text(s) => {
            let lowered = s.trim().to_ascii_lowercase();
            if TRUE_VALUES.contains(&lowered.as_str()) {
                Some(true)
            } else if FALSE_VALUES.contains(&lowered.as_str()) {
                Some(false)
            } else {
                None
            }
        }
        _ => None,
    }
}

fn coerce_json(raw: &RawValue) -> Option<serde_json::Value> {
    match raw {
        RawValue::Text(s) => serde_json::from_str(s.trim()).ok(),
        _ => None,
    }
}

fn coerce_year(raw: &RawValue) -> Option<i32> {
    let year = match raw {
        RawValue::Integer(v) => i32::try_from(*v).ok()?,
        RawValue::Float(v) => i32::try_from(integral(*v)?).ok()?,
        RawValue::Text(s) => {
            let trimmed = s.trim();
            if trimmed.len() != 4 || !trimmed.chars().all(|c| c.is_ascii_digit()) {
                return None;
            }
            trimmed.parse::<i32>().ok()?
        }
        RawValue::Null | RawValue::Boolean(_) => return None,
    };
    (0..=9999).contains(&year).then_some(year)
}

/// Immutable catalogue of field types.
#[derive(Debug, Clone, Default)]
pub struct FieldTypeRegistry {
    types: BTreeMap<TypeName, FieldType>,
}

impl FieldTypeRegistry {
    pub fn new<I>(types: I) -> Self
    where
        I: IntoIterator<Item = FieldType>,
    {
        Self {
            types: types.into_iter().map(|ft| (ft.name, ft)).collect(),
        }
    }

    /// Resolve a type by its catalogue name (case-insensitive).
    pub fn resolve(&self, type_name: &str) -> Result<&FieldType, RegistryError> {
        let name = TypeName::from_str(type_name)?;
        self.get(name)
            .ok_or_else(|| RegistryError::UnknownType(type_name.trim().to_string()))
    }

    pub fn get(&self, name: TypeName) -> Option<&FieldType> {
        self.types.get(&name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &FieldType> {
        self.types.values()
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    pub fn coerce(
        &self,
        raw: &RawValue,
        field_type: &FieldType,
        missing_values: &[String],
    ) -> Coercion {
        field_type.coerce(raw, missing_values)
    }

    /// Coerce for a concrete schema field, typing array items by the field's
    /// `valueType` constraint when one is declared.
    pub fn coerce_field(
        &self,
        raw: &RawValue,
        field: &SchemaField,
        missing_values: &[String],
    ) -> Coercion {
        let coerced = field.field_type.coerce(raw, missing_values);
        let item_type = field.constraints.iter().find_map(|constraint| match constraint {
            Constraint::ValueType(name) => self.get(*name),
            _ => None,
        });
        match (coerced, item_type) {
            (Coercion::Value(Value::Array(items)), Some(item_type)) => {
                let mut typed = Vec::with_capacity(items.len());
                for item in &items {
                    match item_type.coerce(&item.to_raw(), missing_values) {
                        Coercion::Value(value) => typed.push(value),
                        Coercion::Absent => typed.push(Value::Null),
                        Coercion::Failed => return Coercion::Failed,
                    }
                }
                Coercion::Value(Value::Array(typed))
            }
            (coerced, _) => coerced,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn no_missing() -> Vec<String> {
        Vec::new()
    }

    #[test]
    fn type_name_parses_case_insensitively() {
        assert_eq!("DateTime".parse::<TypeName>().unwrap(), TypeName::Datetime);
        assert_eq!(
            "decimal".parse::<TypeName>().unwrap_err(),
            RegistryError::UnknownType("decimal".to_string())
        );
    }

    #[test]
    fn number_coercion_separates_absent_from_failed() {
        let number = FieldType::new(TypeName::Number, "numbers");
        assert_eq!(
            number.coerce(&RawValue::from(" 2.5 "), &no_missing()),
            Coercion::Value(Value::Number(2.5))
        );
        assert_eq!(number.coerce(&RawValue::from(""), &no_missing()), Coercion::Absent);
        assert_eq!(number.coerce(&RawValue::from("abc"), &no_missing()), Coercion::Failed);
        assert_eq!(number.coerce(&RawValue::from("inf"), &no_missing()), Coercion::Failed);
    }

    #[test]
    fn integer_accepts_integral_floats_only() {
        let integer = FieldType::new(TypeName::Integer, "integers");
        assert_eq!(
            integer.coerce(&RawValue::from(4.0), &no_missing()),
            Coercion::Value(Value::Integer(4))
        );
        assert_eq!(
            integer.coerce(&RawValue::from("7.0"), &no_missing()),
            Coercion::Value(Value::Integer(7))
        );
        assert_eq!(integer.coerce(&RawValue::from(4.5), &no_missing()), Coercion::Failed);
    }

    #[test]
    fn date_requires_iso_layout() {
        let date = FieldType::new(TypeName::Date, "dates").with_formats(["%Y-%m-%d"]);
        assert_eq!(
            date.coerce(&RawValue::from("2020-01-31"), &no_missing()),
            Coercion::Value(Value::Date(NaiveDate::from_ymd_opt(2020, 1, 31).unwrap()))
        );
        assert_eq!(date.coerce(&RawValue::from("31/01/2020"), &no_missing()), Coercion::Failed);
    }

    #[test]
    fn datetime_accepts_offsets_and_plain_dates() {
        let datetime = FieldType::new(TypeName::Datetime, "datetimes");
        let expected = NaiveDate::from_ymd_opt(2020, 1, 1)
            .unwrap()
            .and_hms_opt(10, 0, 0)
            .unwrap();
        assert_eq!(
            datetime.coerce(&RawValue::from("2020-01-01T12:00:00+02:00"), &no_missing()),
            Coercion::Value(Value::DateTime(expected))
        );
        assert_eq!(
            datetime.coerce(&RawValue::from("2020-01-01"), &no_missing()),
            Coercion::Value(Value::DateTime(
                NaiveDate::from_ymd_opt(2020, 1, 1).unwrap().and_time(NaiveTime::MIN)
            ))
        );
    }

    #[test]
    fn boolean_vocabulary() {
        let boolean = FieldType::new(TypeName::Boolean, "flags");
        assert_eq!(
            boolean.coerce(&RawValue::from("Yes"), &no_missing()),
            Coercion::Value(Value::Boolean(true))
        );
        assert_eq!(
            boolean.coerce(&RawValue::from(0_i64), &no_missing()),
            Coercion::Value(Value::Boolean(false))
        );
        assert_eq!(boolean.coerce(&RawValue::from("maybe"), &no_missing()), Coercion::Failed);
    }

    #[test]
    fn missing_default_resolves_per_type() {
        assert_eq!(
            MissingDefault::Empty.resolve(TypeName::String),
            Value::Text(String::new())
        );
        assert_eq!(MissingDefault::Zero.resolve(TypeName::Integer), Value::Integer(0));
        assert!(!MissingDefault::False.applies_to(TypeName::Number));
        assert!(MissingDefault::Null.applies_to(TypeName::Year));
    }

    #[test]
    fn year_must_have_four_digits() {
        let year = FieldType::new(TypeName::Year, "years");
        assert_eq!(
            year.coerce(&RawValue::from("1999"), &no_missing()),
            Coercion::Value(Value::Year(1999))
        );
        assert_eq!(year.coerce(&RawValue::from("99"), &no_missing()), Coercion::Failed);
    }
}
