//! Structural checks. Every defect is fatal and all of them are collected.

use std::collections::BTreeMap;

use xwalk_model::{
    ActionKind, CrosswalkMethod, CrosswalkStep, ErrorKind, Modifier, RawValue, TypedError,
    ValidationReport,
};

use crate::context::ValidationContext;
use crate::method::ResolvedStep;

pub(crate) fn check_structure(
    method: &CrosswalkMethod,
    ctx: &ValidationContext<'_>,
    report: &mut ValidationReport,
) -> Vec<ResolvedStep> {
    let mut resolved = Vec::with_capacity(method.steps.len());
    let mut targets: BTreeMap<&str, usize> = BTreeMap::new();

    for (index, step) in method.steps.iter().enumerate() {
        let mut step_ok = true;
        let mut fail = |error: TypedError| {
            step_ok = false;
            report.push(error.at_step(index));
        };

        let action = match ctx.actions.resolve(&step.action) {
            Ok(action) => Some(action),
            Err(err) => {
                fail(TypedError::error(ErrorKind::UnknownAction, err.to_string()));
                None
            }
        };
        let target = match ctx.schema.lookup(&step.target) {
            Ok(field) => Some(field),
            Err(_) => {
                fail(
                    TypedError::error(
                        ErrorKind::UnknownField,
                        format!(
                            "target `{}` is not a field of schema `{}`",
                            step.target, ctx.schema.name
                        ),
                    )
                    .on_field(&step.target),
                );
                None
            }
        };
        for source in &step.sources {
            if !ctx.has_column(&source.column) {
                fail(
                    TypedError::error(
                        ErrorKind::UnknownColumn,
                        format!("source column `{}` does not exist", source.column),
                    )
                    .on_column(&source.column),
                );
            }
        }

        if let Some(action) = action {
            if let Err(err) = action.validate_arity(&step.sources) {
                fail(TypedError::error(ErrorKind::Arity, err.to_string()));
            }
            for message in parameter_misuse(action.kind, step) {
                fail(TypedError::error(ErrorKind::Arity, format!("{}: {message}", action.kind)));
            }
        }

        if let Some(&first) = targets.get(step.target.as_str()) {
            let foreign_key = target.is_some_and(|t| t.foreign_key);
            let (kind, what) = if foreign_key {
                (ErrorKind::ForeignKey, "foreign key field")
            } else {
                (ErrorKind::DuplicateTarget, "field")
            };
            fail(
                TypedError::error(
                    kind,
                    format!("{what} `{}` is already populated by step {first}", step.target),
                )
                .on_field(&step.target),
            );
        } else {
            targets.insert(step.target.as_str(), index);
        }

        if let (Some(action), Some(target)) = (action, target)
            && target.foreign_key
            && !matches!(action.kind, ActionKind::New | ActionKind::Order)
        {
            fail(
                TypedError::error(
                    ErrorKind::ForeignKey,
                    format!(
                        "foreign key field `{}` can only be populated by NEW or ORDER, not {}",
                        target.name, action.kind
                    ),
                )
                .on_field(&target.name),
            );
        }

        if step_ok && let (Some(action), Some(target)) = (action, target) {
            resolved.push(ResolvedStep {
                index,
                action: action.clone(),
                target: target.clone(),
                sources: step.sources.clone(),
                constant: step.constant.as_ref().map(RawValue::from),
                term_map: step.term_map.clone(),
            });
        }
    }
    resolved
}

/// Parameters that only make sense for one action or modifier.
fn parameter_misuse(kind: ActionKind, step: &CrosswalkStep) -> Vec<String> {
    let mut problems = Vec::new();
    if step.constant.is_some() && kind != ActionKind::New {
        problems.push("only NEW takes a constant".to_string());
    }
    let term_sources = step
        .sources
        .iter()
        .any(|s| s.modifier == Some(Modifier::Term));
    if !step.term_map.is_empty() && !term_sources {
        problems.push("a term mapping needs TERM sources".to_string());
    }
    for source in &step.sources {
        if source.term.is_some() && source.modifier != Some(Modifier::Bool) {
            problems.push(format!(
                "source `{}` names a term but is not a BOOL source",
                source.column
            ));
        }
    }
    problems
}
