pub mod action;
pub mod constraint;
pub mod crosswalk;
pub mod error;
pub mod field_type;
pub mod options;
pub mod report;
pub mod schema;
pub mod table;
pub mod value;

pub use action::{Action, ActionKind, ActionRegistry, ArityKind, Modifier};
pub use constraint::{Bound, CategoryTerm, Constraint, ConstraintKind};
pub use crosswalk::{CrosswalkMethod, CrosswalkStep, SourceRef};
pub use error::{ArityError, DefinitionError, RegistryError, SchemaError};
pub use field_type::{Coercion, FieldType, FieldTypeRegistry, MissingDefault, TypeName};
pub use options::{EngineConfig, OutputFormat, StrictPolicy};
pub use report::{ErrorKind, Severity, TypedError, ValidationReport};
pub use schema::{FieldDefinition, Schema, SchemaDefinition, SchemaField};
pub use table::{DestinationColumn, DestinationTable};
pub use value::{RawValue, Value, format_numeric};
