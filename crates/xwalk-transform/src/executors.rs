//! Action executors.
//!
//! Every action is evaluated row by row over a batch of rows. Dispatch is a
//! single match on [`ActionKind`]; each arm reads the step's source columns,
//! coerces into the target field's type and records what could not be
//! coerced or mapped in [`StepDiagnostics`].

use std::collections::BTreeMap;
use std::ops::Range;

use chrono::NaiveDateTime;
use xwalk_model::{
    ActionKind, Coercion, FieldType, FieldTypeRegistry, Modifier, RawValue, SourceRef, TypeName,
    Value,
};
use xwalk_validate::ResolvedStep;

static NULL: RawValue = RawValue::Null;

/// What a step could not coerce or map, keyed by source column or value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StepDiagnostics {
    pub coercion_failures: BTreeMap<String, u64>,
    pub unmapped_terms: BTreeMap<String, u64>,
    /// Rows that received no value because the NEW constant did not coerce.
    pub constant_failures: u64,
    /// Rows whose integer sum overflowed.
    pub overflows: u64,
}

impl StepDiagnostics {
    fn failed(&mut self, column: &str) {
        *self.coercion_failures.entry(column.to_string()).or_default() += 1;
    }

    pub fn is_clean(&self) -> bool {
        self.coercion_failures.is_empty()
            && self.unmapped_terms.is_empty()
            && self.constant_failures == 0
            && self.overflows == 0
    }
}

/// A resolved step bound to its source data.
pub(crate) struct StepExecutor<'a> {
    step: &'a ResolvedStep,
    field_types: &'a FieldTypeRegistry,
    missing_values: &'a [String],
    /// Source columns in the step's source order.
    columns: Vec<Vec<RawValue>>,
    constant: Option<Value>,
    datetime: FieldType,
    number: FieldType,
    item_type: FieldType,
}

impl<'a> StepExecutor<'a> {
    pub(crate) fn new(
        step: &'a ResolvedStep,
        field_types: &'a FieldTypeRegistry,
        missing_values: &'a [String],
        columns: Vec<Vec<RawValue>>,
        rows: usize,
        diagnostics: &mut StepDiagnostics,
    ) -> Self {
        let builtin = |name: TypeName| {
            field_types
                .get(name)
                .cloned()
                .unwrap_or_else(|| FieldType::new(name, name.as_str()))
        };
        let item_type = builtin(step.target.value_type().unwrap_or(TypeName::String));
        let constant = match &step.constant {
            Some(raw) => match field_types.coerce_field(raw, &step.target, missing_values) {
                Coercion::Value(value) => Some(value),
                Coercion::Absent => None,
                Coercion::Failed => {
                    diagnostics.constant_failures = rows as u64;
                    None
                }
            },
            None => None,
        };
        Self {
            step,
            field_types,
            missing_values,
            columns,
            constant,
            datetime: builtin(TypeName::Datetime),
            number: builtin(TypeName::Number),
            item_type,
        }
    }

    /// Evaluate one batch of rows.
    pub(crate) fn evaluate(
        &self,
        rows: Range<usize>,
        diagnostics: &mut StepDiagnostics,
    ) -> Vec<Option<Value>> {
        match self.step.kind() {
            ActionKind::New => rows.map(|_| self.constant.clone()).collect(),
            ActionKind::Order => rows.map(|row| self.order(row, diagnostics)).collect(),
            ActionKind::OrderNew => rows
                .map(|row| self.order_by_date(row, true, diagnostics))
                .collect(),
            ActionKind::OrderOld => rows
                .map(|row| self.order_by_date(row, false, diagnostics))
                .collect(),
            ActionKind::Calculate => rows.map(|row| self.calculate(row, diagnostics)).collect(),
            ActionKind::Categorise => match self.step.classification() {
                Some(Modifier::Bool) => rows
                    .map(|row| {
                        let flags = self.classify_flags(row);
                        self.finish_flags(flags, diagnostics)
                    })
                    .collect(),
                _ => rows.map(|row| self.classify_terms(row, diagnostics)).collect(),
            },
            ActionKind::Join => rows.map(|row| self.join(row, diagnostics)).collect(),
        }
    }

    fn cell(&self, source: usize, row: usize) -> &RawValue {
        self.columns
            .get(source)
            .and_then(|column| column.get(row))
            .unwrap_or(&NULL)
    }

    fn sources(&self) -> impl Iterator<Item = (usize, &SourceRef)> {
        self.step.sources.iter().enumerate()
    }

    fn is_absent(&self, raw: &RawValue) -> bool {
        raw.is_absent(self.missing_values)
    }

    fn coerce(
        &self,
        raw: &RawValue,
        column: &str,
        diagnostics: &mut StepDiagnostics,
    ) -> Option<Value> {
        match self
            .field_types
            .coerce_field(raw, &self.step.target, self.missing_values)
        {
            Coercion::Value(value) => Some(value),
            Coercion::Absent => None,
            Coercion::Failed => {
                diagnostics.failed(column);
                None
            }
        }
    }

    fn coerce_with(
        &self,
        field_type: &FieldType,
        raw: &RawValue,
        column: &str,
        diagnostics: &mut StepDiagnostics,
    ) -> Option<Value> {
        match field_type.coerce(raw, self.missing_values) {
            Coercion::Value(value) => Some(value),
            Coercion::Absent => None,
            Coercion::Failed => {
                diagnostics.failed(column);
                None
            }
        }
    }

    /// Last non-missing source in listed order.
    fn order(&self, row: usize, diagnostics: &mut StepDiagnostics) -> Option<Value> {
        let mut winner = None;
        for (idx, source) in self.sources() {
            if let Some(value) = self.coerce(self.cell(idx, row), &source.column, diagnostics) {
                winner = Some(value);
            }
        }
        winner
    }

    /// Value of the value/date pair with the newest (or oldest) date. Ties go
    /// to the later pair.
    fn order_by_date(
        &self,
        row: usize,
        newest: bool,
        diagnostics: &mut StepDiagnostics,
    ) -> Option<Value> {
        let mut best: Option<(NaiveDateTime, Value)> = None;
        for pair in 0..self.step.sources.len() / 2 {
            let (value_idx, date_idx) = (pair * 2, pair * 2 + 1);
            let value_column = &self.step.sources[value_idx].column;
            let date_column = &self.step.sources[date_idx].column;
            let value = self.coerce(self.cell(value_idx, row), value_column, diagnostics);
            let date = self.coerce_with(
                &self.datetime,
                self.cell(date_idx, row),
                date_column,
                diagnostics,
            );
            let (Some(value), Some(Value::DateTime(date))) = (value, date) else {
                continue;
            };
            let replace = match &best {
                None => true,
                Some((current, _)) if newest => date >= *current,
                Some((current, _)) => date <= *current,
            };
            if replace {
                best = Some((date, value));
            }
        }
        best.map(|(_, value)| value)
    }

    /// Signed sum. Missing or unparseable operands count as zero.
    fn calculate(&self, row: usize, diagnostics: &mut StepDiagnostics) -> Option<Value> {
        let target = &self.step.target;
        if target.type_name() == TypeName::Integer {
            let mut total: i64 = 0;
            for (idx, source) in self.sources() {
                let operand = match self.coerce(self.cell(idx, row), &source.column, diagnostics) {
                    Some(Value::Integer(v)) => v,
                    _ => 0,
                };
                let next = match source.modifier {
                    Some(Modifier::Sub) => total.checked_sub(operand),
                    _ => total.checked_add(operand),
                };
                let Some(next) = next else {
                    diagnostics.overflows += 1;
                    return None;
                };
                total = next;
            }
            return Some(Value::Integer(total));
        }

        let mut total = 0.0;
        for (idx, source) in self.sources() {
            let operand = self
                .coerce_with(&self.number, self.cell(idx, row), &source.column, diagnostics)
                .and_then(|value| value.as_f64())
                .unwrap_or(0.0);
            match source.modifier {
                Some(Modifier::Sub) => total -= operand,
                _ => total += operand,
            }
        }
        match target.type_name() {
            TypeName::Number => Some(Value::Number(total)),
            _ => self.coerce(&RawValue::Float(total), &target.name, diagnostics),
        }
    }

    /// Sources asserting their term on this row.
    fn classify_flags(&self, row: usize) -> Vec<&SourceRef> {
        self.sources()
            .filter(|(idx, _)| !self.is_absent(self.cell(*idx, row)))
            .map(|(_, source)| source)
            .collect()
    }

    /// Shape BOOL results by target type: a flag for boolean targets, the set
    /// of asserted terms for arrays, the last asserted term otherwise.
    fn finish_flags(
        &self,
        present: Vec<&SourceRef>,
        diagnostics: &mut StepDiagnostics,
    ) -> Option<Value> {
        match self.step.target.type_name() {
            TypeName::Boolean => Some(Value::Boolean(!present.is_empty())),
            TypeName::Array => {
                let terms = present
                    .iter()
                    .map(|source| (ResolvedStep::asserted_term(source), source.column.as_str()));
                self.term_array(terms, diagnostics)
            }
            _ => present.last().and_then(|source| {
                let term = RawValue::from(ResolvedStep::asserted_term(source));
                self.coerce(&term, &source.column, diagnostics)
            }),
        }
    }

    /// Map source values through the step's term mapping.
    fn classify_terms(&self, row: usize, diagnostics: &mut StepDiagnostics) -> Option<Value> {
        let mut terms: Vec<(&str, &str)> = Vec::new();
        for (idx, source) in self.sources() {
            let raw = self.cell(idx, row);
            if self.is_absent(raw) {
                continue;
            }
            let Some(text) = raw.to_text() else {
                continue;
            };
            match self.step.map_term(&text) {
                Some(term) => terms.push((term, source.column.as_str())),
                None => *diagnostics.unmapped_terms.entry(text).or_default() += 1,
            }
        }
        if self.step.target.type_name() == TypeName::Array {
            return self.term_array(terms.into_iter(), diagnostics);
        }
        terms
            .last()
            .and_then(|(term, column)| self.coerce(&RawValue::from(*term), column, diagnostics))
    }

    fn term_array<'t>(
        &self,
        terms: impl Iterator<Item = (&'t str, &'t str)>,
        diagnostics: &mut StepDiagnostics,
    ) -> Option<Value> {
        let mut items = Vec::new();
        for (term, column) in terms {
            let raw = RawValue::from(term);
            if let Some(item) = self.coerce_with(&self.item_type, &raw, column, diagnostics)
                && !items.contains(&item)
            {
                items.push(item);
            }
        }
        (!items.is_empty()).then_some(Value::Array(items))
    }

    /// Present values joined by a single space.
    fn join(&self, row: usize, diagnostics: &mut StepDiagnostics) -> Option<Value> {
        let pieces: Vec<String> = self
            .sources()
            .filter_map(|(idx, _)| {
                let raw = self.cell(idx, row);
                if self.is_absent(raw) {
                    return None;
                }
                raw.to_text().filter(|text| !text.is_empty())
            })
            .collect();
        if pieces.is_empty() {
            return None;
        }
        let target = &self.step.target.name;
        self.coerce(&RawValue::Text(pieces.join(" ")), target, diagnostics)
    }
}
