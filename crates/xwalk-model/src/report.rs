//! Validation and evaluation diagnostics.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::options::StrictPolicy;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    UnknownType,
    UnknownAction,
    DuplicateName,
    Constraint,
    Arity,
    UnknownField,
    UnknownColumn,
    DuplicateTarget,
    ForeignKey,
    IncompleteCategoryMapping,
    TypeMismatch,
    UnmappedTerm,
    RequiredViolation,
    UniqueViolation,
    RangeViolation,
    CategoryViolation,
    CoercionFailure,
    Cancelled,
    StorageUnavailable,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::UnknownType => "UnknownTypeError",
            ErrorKind::UnknownAction => "UnknownActionError",
            ErrorKind::DuplicateName => "DuplicateNameError",
            ErrorKind::Constraint => "ConstraintError",
            ErrorKind::Arity => "ArityError",
            ErrorKind::UnknownField => "UnknownFieldError",
            ErrorKind::UnknownColumn => "UnknownColumnError",
            ErrorKind::DuplicateTarget => "DuplicateTargetError",
            ErrorKind::ForeignKey => "ForeignKeyError",
            ErrorKind::IncompleteCategoryMapping => "IncompleteCategoryMappingError",
            ErrorKind::TypeMismatch => "TypeMismatch",
            ErrorKind::UnmappedTerm => "UnmappedTermError",
            ErrorKind::RequiredViolation => "RequiredViolation",
            ErrorKind::UniqueViolation => "UniqueViolation",
            ErrorKind::RangeViolation => "RangeViolation",
            ErrorKind::CategoryViolation => "CategoryViolation",
            ErrorKind::CoercionFailure => "CoercionFailure",
            ErrorKind::Cancelled => "Cancelled",
            ErrorKind::StorageUnavailable => "StorageUnavailable",
        }
    }

    /// Structural defects always stop execution, whatever the strict policy.
    pub fn is_structural(&self) -> bool {
        matches!(
            self,
            ErrorKind::UnknownType
                | ErrorKind::UnknownAction
                | ErrorKind::DuplicateName
                | ErrorKind::Constraint
                | ErrorKind::Arity
                | ErrorKind::UnknownField
                | ErrorKind::UnknownColumn
                | ErrorKind::DuplicateTarget
                | ErrorKind::ForeignKey
        )
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
}

/// A single diagnostic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypedError {
    pub kind: ErrorKind,
    pub severity: Severity,
    pub message: String,
    /// Index of the crosswalk step, when the issue belongs to one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub step: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub column: Option<String>,
    /// Number of affected rows.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub count: Option<u64>,
}

impl TypedError {
    pub fn error(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            severity: Severity::Error,
            message: message.into(),
            step: None,
            field: None,
            column: None,
            count: None,
        }
    }

    pub fn warning(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            ..Self::error(kind, message)
        }
    }

    pub fn at_step(mut self, step: usize) -> Self {
        self.step = Some(step);
        self
    }

    pub fn on_field(mut self, field: impl Into<String>) -> Self {
        self.field = Some(field.into());
        self
    }

    pub fn on_column(mut self, column: impl Into<String>) -> Self {
        self.column = Some(column.into());
        self
    }

    pub fn with_count(mut self, count: u64) -> Self {
        self.count = Some(count);
        self
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

impl fmt::Display for TypedError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let severity = match self.severity {
            Severity::Error => "error",
            Severity::Warning => "warning",
        };
        write!(f, "{severity}[{}]", self.kind)?;
        if let Some(step) = self.step {
            write!(f, " step {step}")?;
        }
        if let Some(field) = &self.field {
            write!(f, " field {field}")?;
        }
        if let Some(column) = &self.column {
            write!(f, " column {column}")?;
        }
        write!(f, ": {}", self.message)?;
        if let Some(count) = self.count {
            write!(f, " ({count} rows)")?;
        }
        Ok(())
    }
}

/// Accumulated diagnostics. `ok` is false as soon as one error is present.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationReport {
    ok: bool,
    errors: Vec<TypedError>,
}

impl Default for ValidationReport {
    fn default() -> Self {
        Self::new()
    }
}

impl ValidationReport {
    pub fn new() -> Self {
        Self {
            ok: true,
            errors: Vec::new(),
        }
    }

    pub fn ok(&self) -> bool {
        self.ok
    }

    pub fn errors(&self) -> &[TypedError] {
        &self.errors
    }

    pub fn push(&mut self, error: TypedError) {
        if error.is_error() {
            self.ok = false;
        }
        self.errors.push(error);
    }

    pub fn extend<I>(&mut self, errors: I)
    where
        I: IntoIterator<Item = TypedError>,
    {
        for error in errors {
            self.push(error);
        }
    }

    pub fn merge(&mut self, other: ValidationReport) {
        self.extend(other.errors);
    }

    pub fn error_count(&self) -> usize {
        self.errors.iter().filter(|e| e.is_error()).count()
    }

    pub fn warning_count(&self) -> usize {
        self.errors.len() - self.error_count()
    }

    pub fn has_errors(&self) -> bool {
        self.error_count() > 0
    }

    pub fn has_structural_errors(&self) -> bool {
        self.errors
            .iter()
            .any(|e| e.is_error() && e.kind.is_structural())
    }

    pub fn count_of(&self, kind: ErrorKind) -> usize {
        self.errors.iter().filter(|e| e.kind == kind).count()
    }

    pub fn contains(&self, kind: ErrorKind) -> bool {
        self.count_of(kind) > 0
    }

    /// Upgrade warnings of the kinds the policy names to errors.
    pub fn apply_strict(&mut self, policy: &StrictPolicy) {
        for error in &mut self.errors {
            if error.severity == Severity::Warning && policy.upgrades(error.kind) {
                error.severity = Severity::Error;
                self.ok = false;
            }
        }
    }
}

impl fmt::Display for ValidationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{} ({} errors, {} warnings)",
            if self.ok { "ok" } else { "failed" },
            self.error_count(),
            self.warning_count()
        )?;
        for error in &self.errors {
            writeln!(f, "  {error}")?;
        }
        Ok(())
    }
}
