use xwalk_model::{
    ActionKind, ArityKind, ConstraintKind, MissingDefault, Modifier, RegistryError, TypeName,
    Value,
};
use xwalk_standards::{
    CatalogueError, load_actions_str, load_default_actions, load_default_field_types,
    load_field_types_str, load_registries_from,
};

#[test]
fn embedded_field_types_cover_every_type() {
    let registry = load_default_field_types().expect("load field types");
    assert_eq!(registry.len(), TypeName::ALL.len());
    for name in TypeName::ALL {
        assert!(registry.get(name).is_some(), "missing {name}");
    }
}

#[test]
fn every_field_type_declares_a_missing_default() {
    let registry = load_default_field_types().expect("load field types");
    let string = registry.resolve("string").unwrap();
    assert_eq!(string.missing_default, MissingDefault::Empty);
    assert_eq!(string.missing_value(), Value::Text(String::new()));
    let boolean = registry.resolve("BOOLEAN").unwrap();
    assert_eq!(boolean.missing_value(), Value::Boolean(false));
    assert!(registry.resolve("number").unwrap().missing_value().is_null());
}

#[test]
fn temporal_types_declare_iso_formats() {
    let registry = load_default_field_types().expect("load field types");
    let date = registry.resolve("date").unwrap();
    assert_eq!(date.formats.first().map(String::as_str), Some("%Y-%m-%d"));
    assert!(!registry.resolve("datetime").unwrap().formats.is_empty());
}

#[test]
fn constraint_vocabulary_is_per_type() {
    let registry = load_default_field_types().expect("load field types");
    assert!(registry.resolve("array").unwrap().allows(ConstraintKind::ValueType));
    assert!(!registry.resolve("string").unwrap().allows(ConstraintKind::ValueType));
    assert!(!registry.resolve("boolean").unwrap().allows(ConstraintKind::Unique));
}

#[test]
fn unknown_type_fails_to_resolve() {
    let registry = load_default_field_types().expect("load field types");
    assert_eq!(
        registry.resolve("money").unwrap_err(),
        RegistryError::UnknownType("money".to_string())
    );
}

#[test]
fn embedded_actions_carry_grammar() {
    let registry = load_default_actions().expect("load actions");
    assert_eq!(registry.len(), ActionKind::ALL.len());
    let calculate = registry.resolve("CALCULATE").unwrap();
    assert_eq!(calculate.arity, ArityKind::SignedList);
    assert_eq!(calculate.modifiers, vec![Modifier::Add, Modifier::Sub]);
    let join = registry.resolve("join").unwrap();
    assert_eq!(join.min_sources, 2);
    assert!(join.modifiers.is_empty());
    assert!(matches!(
        registry.resolve("PIVOT"),
        Err(RegistryError::UnknownAction(name)) if name == "PIVOT"
    ));
}

#[test]
fn field_type_without_missing_default_is_rejected() {
    let text = r#"
[types.string]
description = "text"
constraints = ["required"]
"#;
    let err = load_field_types_str(text, "inline").unwrap_err();
    assert!(matches!(err, CatalogueError::MissingDefault { ref name, .. } if name == "string"));
}

#[test]
fn inapplicable_missing_default_is_rejected() {
    let text = r#"
[types.date]
description = "dates"
missing_default = "zero"
"#;
    assert!(matches!(
        load_field_types_str(text, "inline"),
        Err(CatalogueError::MissingDefault { .. })
    ));
}

#[test]
fn action_with_wrong_arity_is_rejected() {
    let text = r#"
[actions.JOIN]
description = "concatenate"
arity = "single"
"#;
    let err = load_actions_str(text, "inline").unwrap_err();
    insta::assert_snapshot!(err.to_string(), @"action JOIN declares arity single, expected list");
}

#[test]
fn action_with_foreign_modifier_is_rejected() {
    let text = r#"
[actions.CALCULATE]
description = "sum"
arity = "signed-list"
modifiers = ["ADD", "BOOL"]
"#;
    assert!(matches!(
        load_actions_str(text, "inline"),
        Err(CatalogueError::Modifier { action: ActionKind::Calculate, .. })
    ));
}

#[test]
fn registries_load_from_directory() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(
        dir.path().join("field_types.toml"),
        xwalk_standards::embedded::FIELD_TYPES,
    )
    .unwrap();
    std::fs::write(
        dir.path().join("actions.toml"),
        "[actions.NEW]\ndescription = \"constant\"\narity = \"single\"\n",
    )
    .unwrap();
    let registries = load_registries_from(dir.path()).unwrap();
    assert_eq!(registries.actions.len(), 1);
    assert_eq!(registries.digest.len(), 64);
}

#[test]
fn missing_catalogue_file_reports_path() {
    let dir = tempfile::tempdir().unwrap();
    let err = load_registries_from(dir.path()).unwrap_err();
    assert!(matches!(
        err,
        CatalogueError::Io { ref path, .. } if path.ends_with("field_types.toml")
    ));
}
