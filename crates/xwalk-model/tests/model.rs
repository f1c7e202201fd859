//! Tests for xwalk-model types.

use proptest::prelude::*;
use xwalk_model::{
    Constraint, ConstraintKind, CrosswalkMethod, CrosswalkStep, FieldType, FieldTypeRegistry,
    MissingDefault, Modifier, RawValue, Schema, SchemaError, SchemaField, SourceRef, TypeName,
    Value, format_numeric,
};

fn registry() -> FieldTypeRegistry {
    FieldTypeRegistry::new([
        FieldType::new(TypeName::String, "text")
            .allowing([
                ConstraintKind::Required,
                ConstraintKind::Unique,
                ConstraintKind::Category,
                ConstraintKind::Minimum,
                ConstraintKind::Maximum,
            ])
            .with_missing_default(MissingDefault::Empty),
        FieldType::new(TypeName::Integer, "whole numbers")
            .allowing([
                ConstraintKind::Required,
                ConstraintKind::Unique,
                ConstraintKind::Minimum,
                ConstraintKind::Maximum,
            ]),
        FieldType::new(TypeName::Date, "calendar dates")
            .allowing([
                ConstraintKind::Required,
                ConstraintKind::Minimum,
                ConstraintKind::Maximum,
            ])
            .with_formats(["%Y-%m-%d"]),
        FieldType::new(TypeName::Array, "lists")
            .allowing([ConstraintKind::Category, ConstraintKind::ValueType])
            .with_missing_default(MissingDefault::Empty),
        FieldType::new(TypeName::Boolean, "flags").allowing([ConstraintKind::Required]),
    ])
}

fn field(name: &str, type_name: &str) -> SchemaField {
    let registry = registry();
    SchemaField::new(name, registry.resolve(type_name).unwrap().clone())
}

#[test]
fn add_field_then_lookup_round_trips() {
    let mut schema = Schema::new("households");
    let id = field("household_id", "integer").foreign_key();
    schema.add_field(id.clone()).unwrap();
    assert_eq!(schema.lookup("household_id").unwrap(), &id);
    assert_eq!(
        schema.lookup("members").unwrap_err(),
        SchemaError::NotFound("members".to_string())
    );
}

#[test]
fn duplicate_field_names_are_rejected() {
    let mut schema = Schema::new("households");
    schema.add_field(field("name", "string")).unwrap();
    let err = schema.add_field(field("name", "integer")).unwrap_err();
    assert_eq!(err, SchemaError::DuplicateName("name".to_string()));
    assert_eq!(schema.fields().len(), 1);
}

#[test]
fn constraint_outside_allowed_set_is_rejected() {
    let schema = Schema::new("s");
    let flag = field("active", "boolean").with_constraint(Constraint::Unique(true));
    let err = schema.validate_constraints(&flag).unwrap_err();
    assert!(matches!(err, SchemaError::Constraint { ref field, .. } if field == "active"));
}

#[test]
fn category_needs_min_items_terms() {
    let schema = Schema::new("s");
    let tags = field("tags", "array").with_constraint(Constraint::category(["red"], 2));
    assert!(schema.validate_constraints(&tags).is_err());
    let tags = field("tags", "array").with_constraint(Constraint::category(["red", "blue"], 2));
    assert!(schema.validate_constraints(&tags).is_ok());
}

#[test]
fn date_bounds_must_be_iso_text() {
    let schema = Schema::new("s");
    let ok = field("visit", "date")
        .with_constraint(Constraint::Minimum(xwalk_model::Bound::Text("2000-01-01".into())));
    assert!(schema.validate_constraints(&ok).is_ok());
    let bad = field("visit", "date")
        .with_constraint(Constraint::Minimum(xwalk_model::Bound::Text("01/01/2000".into())));
    assert!(schema.validate_constraints(&bad).is_err());
}

#[test]
fn schema_definition_resolves_types_and_filters() {
    let json = r#"{
        "name": "visits",
        "version": "1.0",
        "missingValues": ["", "NA"],
        "fields": [
            {"name": "visit_id", "type": "integer", "foreignKey": true,
             "constraints": [{"required": true}, {"unique": true}]},
            {"name": "visit_date", "type": "date"},
            {"name": "status", "type": "string",
             "constraints": [{"category": {"terms": [{"name": "open"}, {"name": "closed"}], "minItems": 1}}]}
        ]
    }"#;
    let schema = Schema::from_json(json, &registry()).unwrap();
    assert_eq!(
        schema.field_names().collect::<Vec<_>>(),
        vec!["visit_id", "visit_date", "status"]
    );
    assert_eq!(schema.missing_values, vec!["".to_string(), "NA".to_string()]);
    let id = schema.lookup("visit_id").unwrap();
    assert!(id.foreign_key && id.is_required() && id.is_unique());
    assert!(schema.lookup("status").unwrap().allows_term("open"));
    assert!(!schema.lookup("status").unwrap().allows_term("pending"));
}

#[test]
fn schema_definition_rejects_unknown_type() {
    let json = r#"{"name": "s", "fields": [{"name": "x", "type": "decimal"}]}"#;
    let err = Schema::from_json(json, &registry()).unwrap_err();
    assert_eq!(err.to_string(), "unknown field type: decimal");
}

#[test]
fn array_items_follow_value_type() {
    let registry = registry();
    let scores = field("scores", "array").with_constraint(Constraint::ValueType(TypeName::Integer));
    let coerced = registry.coerce_field(&RawValue::from("[1, \"2\"]"), &scores, &[]);
    assert_eq!(
        coerced.into_option(),
        Some(Value::Array(vec![Value::Integer(1), Value::Integer(2)]))
    );
    let failed = registry.coerce_field(&RawValue::from("[1, \"x\"]"), &scores, &[]);
    assert!(failed.is_failed());
}

#[test]
fn crosswalk_json_accepts_bare_and_tagged_sources() {
    let json = r#"{
        "name": "households-v1",
        "steps": [
            {"action": "ORDER", "target": "name", "sources": ["name_a", "name_b"]},
            {"action": "CALCULATE", "target": "total",
             "sources": [{"column": "gross", "modifier": "ADD"}, {"column": "tax", "modifier": "-"}]},
            {"action": "NEW", "target": "origin", "constant": "survey"}
        ]
    }"#;
    let method = CrosswalkMethod::from_json(json).unwrap();
    assert_eq!(method.steps[0].sources[1], SourceRef::new("name_b"));
    assert_eq!(method.steps[1].sources[1].modifier, Some(Modifier::Sub));
    assert_eq!(
        method.referenced_columns().into_iter().collect::<Vec<_>>(),
        vec!["gross", "name_a", "name_b", "tax"]
    );
    let again = CrosswalkMethod::from_json(&method.to_json().unwrap()).unwrap();
    assert_eq!(again, method);
}

#[test]
fn steps_build_fluently() {
    let step = CrosswalkStep::new("CATEGORISE", "status")
        .with_source(SourceRef::term("raw_status"))
        .with_term("O", "open")
        .with_term("C", "closed");
    assert_eq!(step.term_map.len(), 2);
    assert_eq!(step.sources[0].modifier, Some(Modifier::Term));
}

proptest! {
    #[test]
    fn format_numeric_round_trips_integers(v in -1_000_000_i64..1_000_000) {
        prop_assert_eq!(format_numeric(v as f64), v.to_string());
    }

    #[test]
    fn string_coercion_trims(s in "[a-z]{1,8}") {
        let text = FieldType::new(TypeName::String, "text");
        let padded = format!("  {s} ");
        let coerced = text.coerce(&RawValue::from(padded.as_str()), &[]).into_option();
        prop_assert_eq!(coerced, Some(Value::Text(s)));
    }
}
