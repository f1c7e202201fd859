//! Semantic checks, run only on structurally sound methods. Findings are
//! warnings until a strict policy upgrades them.

use xwalk_ingest::distinct_values;
use xwalk_model::{
    ActionKind, Coercion, ErrorKind, FieldType, Modifier, RawValue, SchemaField, TypeName,
    TypedError, ValidationReport,
};

use crate::context::ValidationContext;
use crate::method::ResolvedStep;

/// Distinct unmapped values listed in one message.
const MAX_LISTED_VALUES: usize = 5;

pub(crate) fn check_semantics(
    steps: &[ResolvedStep],
    ctx: &ValidationContext<'_>,
    report: &mut ValidationReport,
) {
    for step in steps {
        let target = &step.target;
        let warn = |kind: ErrorKind, message: String| {
            TypedError::warning(kind, message)
                .at_step(step.index)
                .on_field(&target.name)
        };
        match step.kind() {
            ActionKind::New => {
                if let Some(constant) = &step.constant
                    && ctx
                        .field_types
                        .coerce_field(constant, target, &ctx.schema.missing_values)
                        .is_failed()
                {
                    report.push(warn(
                        ErrorKind::TypeMismatch,
                        format!(
                            "constant {} does not coerce to {}",
                            constant.to_text().unwrap_or_default(),
                            target.type_name()
                        ),
                    ));
                }
            }
            ActionKind::Calculate => {
                if !target.type_name().is_numeric() {
                    report.push(warn(
                        ErrorKind::TypeMismatch,
                        format!(
                            "CALCULATE needs a numeric target, `{}` is {}",
                            target.name,
                            target.type_name()
                        ),
                    ));
                }
            }
            ActionKind::Join => {
                if matches!(target.type_name(), TypeName::Object | TypeName::Array) {
                    report.push(warn(
                        ErrorKind::TypeMismatch,
                        format!("JOIN produces text, `{}` is {}", target.name, target.type_name()),
                    ));
                }
            }
            ActionKind::Categorise => check_categorise(step, ctx, report),
            ActionKind::Order | ActionKind::OrderNew | ActionKind::OrderOld => {}
        }
    }
}

fn check_categorise(
    step: &ResolvedStep,
    ctx: &ValidationContext<'_>,
    report: &mut ValidationReport,
) {
    let target = &step.target;
    let warn = |kind: ErrorKind, message: String| {
        TypedError::warning(kind, message)
            .at_step(step.index)
            .on_field(&target.name)
    };

    let terms: Vec<&str> = match step.classification() {
        Some(Modifier::Bool) if target.type_name() == TypeName::Boolean => Vec::new(),
        Some(Modifier::Bool) => step.sources.iter().map(ResolvedStep::asserted_term).collect(),
        _ => step.term_map.values().map(String::as_str).collect(),
    };
    for term in terms {
        if !term_fits(ctx, target, term) {
            report.push(warn(
                ErrorKind::TypeMismatch,
                format!("term `{term}` does not coerce to {}", target.type_name()),
            ));
        } else if !target.allows_term(term) {
            report.push(warn(
                ErrorKind::CategoryViolation,
                format!("term `{term}` is not a declared category of `{}`", target.name),
            ));
        }
    }

    if step.classification() != Some(Modifier::Term) {
        return;
    }
    if step.term_map.is_empty() {
        report.push(warn(
            ErrorKind::IncompleteCategoryMapping,
            "TERM sources need a term mapping".to_string(),
        ));
        return;
    }
    let Some(sample) = ctx.sample else {
        return;
    };
    for column in step.columns() {
        let sampled = distinct_values(sample, column, &ctx.schema.missing_values, ctx.sample_rows);
        let values = match sampled {
            Ok(values) => values,
            Err(err) => {
                report.push(
                    warn(ErrorKind::StorageUnavailable, format!("sample unavailable: {err}"))
                        .on_column(column),
                );
                continue;
            }
        };
        let unmapped: Vec<&String> = values
            .iter()
            .filter(|value| step.map_term(value).is_none())
            .collect();
        if unmapped.is_empty() {
            continue;
        }
        let listed = unmapped
            .iter()
            .take(MAX_LISTED_VALUES)
            .map(|v| format!("`{v}`"))
            .collect::<Vec<_>>()
            .join(", ");
        let more = if unmapped.len() > MAX_LISTED_VALUES { ", ..." } else { "" };
        report.push(
            warn(
                ErrorKind::IncompleteCategoryMapping,
                format!("no term for {listed}{more}"),
            )
            .on_column(column)
            .with_count(unmapped.len() as u64),
        );
    }
}

/// Whether a destination term coerces to the target, or to its item type for
/// array targets.
fn term_fits(ctx: &ValidationContext<'_>, target: &SchemaField, term: &str) -> bool {
    let raw = RawValue::from(term);
    let coerced = if target.type_name() == TypeName::Array {
        let item_type = target
            .value_type()
            .and_then(|name| ctx.field_types.get(name))
            .cloned()
            .unwrap_or_else(|| FieldType::new(TypeName::String, "array item"));
        item_type.coerce(&raw, &[])
    } else {
        target.field_type.coerce(&raw, &[])
    };
    matches!(coerced, Coercion::Value(_))
}
