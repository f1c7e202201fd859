//! Action Registry.
//!
//! Actions form a closed vocabulary. The catalogue supplies descriptions and
//! the arity/modifier grammar as data; [`ActionKind`] is the tag the
//! evaluation engine dispatches on.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::crosswalk::SourceRef;
use crate::error::{ArityError, RegistryError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ActionKind {
    /// Constant value on every row.
    New,
    /// Last non-missing source wins.
    Order,
    /// Value of the most recent value/date pair.
    OrderNew,
    /// Value of the oldest value/date pair.
    OrderOld,
    /// Signed sum of sources.
    Calculate,
    /// Boolean or term classification.
    #[serde(alias = "CATEGORIZE")]
    Categorise,
    /// Space-joined concatenation.
    Join,
}

impl ActionKind {
    pub const ALL: [ActionKind; 7] = [
        ActionKind::New,
        ActionKind::Order,
        ActionKind::OrderNew,
        ActionKind::OrderOld,
        ActionKind::Calculate,
        ActionKind::Categorise,
        ActionKind::Join,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ActionKind::New => "NEW",
            ActionKind::Order => "ORDER",
            ActionKind::OrderNew => "ORDER_NEW",
            ActionKind::OrderOld => "ORDER_OLD",
            ActionKind::Calculate => "CALCULATE",
            ActionKind::Categorise => "CATEGORISE",
            ActionKind::Join => "JOIN",
        }
    }

    /// Arity the engine was written against; catalogue entries must agree.
    pub fn expected_arity(&self) -> ArityKind {
        match self {
            ActionKind::New => ArityKind::Single,
            ActionKind::Order | ActionKind::Join => ArityKind::List,
            ActionKind::OrderNew | ActionKind::OrderOld => ArityKind::PairedList,
            ActionKind::Calculate => ArityKind::SignedList,
            ActionKind::Categorise => ArityKind::ClassifiedList,
        }
    }

    /// Modifier grammar; empty when the action takes no modifiers.
    pub fn modifier_grammar(&self) -> &'static [Modifier] {
        match self {
            ActionKind::Calculate => &[Modifier::Add, Modifier::Sub],
            ActionKind::Categorise => &[Modifier::Bool, Modifier::Term],
            _ => &[],
        }
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ActionKind {
    type Err = RegistryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_uppercase().replace(['-', ' '], "_");
        if normalized == "CATEGORIZE" {
            return Ok(ActionKind::Categorise);
        }
        ActionKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == normalized)
            .ok_or_else(|| RegistryError::UnknownAction(s.trim().to_string()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ArityKind {
    /// No source columns.
    Single,
    /// One or more columns.
    List,
    /// Value/date column pairs.
    PairedList,
    /// Columns each carrying ADD or SUB.
    SignedList,
    /// Columns each carrying BOOL or TERM.
    ClassifiedList,
}

impl ArityKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ArityKind::Single => "single",
            ArityKind::List => "list",
            ArityKind::PairedList => "paired-list",
            ArityKind::SignedList => "signed-list",
            ArityKind::ClassifiedList => "classified-list",
        }
    }
}

impl fmt::Display for ArityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Modifier {
    #[serde(alias = "+")]
    Add,
    #[serde(alias = "-")]
    Sub,
    Bool,
    Term,
}

impl Modifier {
    pub fn as_str(&self) -> &'static str {
        match self {
            Modifier::Add => "ADD",
            Modifier::Sub => "SUB",
            Modifier::Bool => "BOOL",
            Modifier::Term => "TERM",
        }
    }
}

impl fmt::Display for Modifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Modifier {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "ADD" | "+" => Ok(Modifier::Add),
            "SUB" | "-" => Ok(Modifier::Sub),
            "BOOL" => Ok(Modifier::Bool),
            "TERM" => Ok(Modifier::Term),
            other => Err(format!("unknown modifier: {other}")),
        }
    }
}

/// Catalogue entry for an action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Action {
    pub kind: ActionKind,
    pub description: String,
    pub arity: ArityKind,
    pub min_sources: usize,
    pub modifiers: Vec<Modifier>,
}

impl Action {
    pub fn new(kind: ActionKind, description: impl Into<String>) -> Self {
        let min_sources = match kind {
            ActionKind::New => 0,
            ActionKind::Join | ActionKind::OrderNew | ActionKind::OrderOld => 2,
            _ => 1,
        };
        Self {
            kind,
            description: description.into(),
            arity: kind.expected_arity(),
            min_sources,
            modifiers: kind.modifier_grammar().to_vec(),
        }
    }

    pub fn name(&self) -> &'static str {
        self.kind.as_str()
    }

    fn fail(&self, message: impl Into<String>) -> ArityError {
        ArityError {
            action: self.kind,
            message: message.into(),
        }
    }

    /// Check source count and modifier presence against the arity grammar.
    pub fn validate_arity(&self, sources: &[SourceRef]) -> Result<(), ArityError> {
        let count = sources.len();
        match self.arity {
            ArityKind::Single => {
                if count != 0 {
                    return Err(self.fail(format!("takes no source columns, got {count}")));
                }
            }
            ArityKind::List => {
                if count < self.min_sources.max(1) {
                    return Err(self.fail(format!(
                        "needs at least {} source columns, got {count}",
                        self.min_sources.max(1)
                    )));
                }
            }
            ArityKind::PairedList => {
                if count == 0 || count % 2 != 0 {
                    return Err(self.fail(format!(
                        "needs value/date column pairs, got {count} columns"
                    )));
                }
            }
            ArityKind::SignedList | ArityKind::ClassifiedList => {
                if count < self.min_sources.max(1) {
                    return Err(self.fail(format!(
                        "needs at least {} source columns, got {count}",
                        self.min_sources.max(1)
                    )));
                }
                for source in sources {
                    match source.modifier {
                        None => {
                            return Err(self.fail(format!(
                                "source `{}` has no modifier",
                                source.column
                            )));
                        }
                        Some(modifier) if !self.modifiers.contains(&modifier) => {
                            return Err(self.fail(format!(
                                "modifier {modifier} on `{}` is not one of {}",
                                source.column,
                                join_modifiers(&self.modifiers)
                            )));
                        }
                        Some(_) => {}
                    }
                }
                if self.arity == ArityKind::ClassifiedList
                    && sources.windows(2).any(|w| w[0].modifier != w[1].modifier)
                {
                    return Err(self.fail("modifiers in one step must agree"));
                }
            }
        }
        if self.modifiers.is_empty()
            && let Some(source) = sources.iter().find(|s| s.modifier.is_some())
        {
            return Err(self.fail(format!(
                "takes no modifiers, `{}` carries one",
                source.column
            )));
        }
        Ok(())
    }
}

fn join_modifiers(modifiers: &[Modifier]) -> String {
    modifiers
        .iter()
        .map(Modifier::as_str)
        .collect::<Vec<_>>()
        .join("/")
}

/// Immutable catalogue of actions.
#[derive(Debug, Clone, Default)]
pub struct ActionRegistry {
    actions: BTreeMap<ActionKind, Action>,
}

impl ActionRegistry {
    pub fn new<I>(actions: I) -> Self
    where
        I: IntoIterator<Item = Action>,
    {
        Self {
            actions: actions.into_iter().map(|a| (a.kind, a)).collect(),
        }
    }

    pub fn resolve(&self, action_name: &str) -> Result<&Action, RegistryError> {
        let kind = ActionKind::from_str(action_name)?;
        self.actions
            .get(&kind)
            .ok_or_else(|| RegistryError::UnknownAction(action_name.trim().to_string()))
    }

    pub fn get(&self, kind: ActionKind) -> Option<&Action> {
        self.actions.get(&kind)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Action> {
        self.actions.values()
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn col(name: &str) -> SourceRef {
        SourceRef::new(name)
    }

    #[test]
    fn action_names_accept_spelling_variants() {
        assert_eq!("categorize".parse::<ActionKind>().unwrap(), ActionKind::Categorise);
        assert_eq!("order-new".parse::<ActionKind>().unwrap(), ActionKind::OrderNew);
        assert!("MERGE".parse::<ActionKind>().is_err());
    }

    #[test]
    fn new_rejects_sources() {
        let action = Action::new(ActionKind::New, "constant");
        assert!(action.validate_arity(&[]).is_ok());
        assert!(action.validate_arity(&[col("a")]).is_err());
    }

    #[test]
    fn paired_list_needs_even_count() {
        let action = Action::new(ActionKind::OrderNew, "latest");
        assert!(action.validate_arity(&[col("v1"), col("d1")]).is_ok());
        let err = action
            .validate_arity(&[col("v1"), col("d1"), col("v2")])
            .unwrap_err();
        assert_eq!(err.action, ActionKind::OrderNew);
        assert!(action.validate_arity(&[]).is_err());
    }

    #[test]
    fn join_needs_two_columns_without_modifiers() {
        let action = Action::new(ActionKind::Join, "concatenate");
        assert!(action.validate_arity(&[col("a")]).is_err());
        assert!(action.validate_arity(&[col("a"), col("b")]).is_ok());
        assert!(
            action
                .validate_arity(&[col("a"), col("b").with_modifier(Modifier::Add)])
                .is_err()
        );
    }

    #[test]
    fn calculate_rejects_foreign_modifiers() {
        let action = Action::new(ActionKind::Calculate, "sum");
        let err = action
            .validate_arity(&[col("a").with_modifier(Modifier::Bool)])
            .unwrap_err();
        assert!(err.message.contains("ADD/SUB"));
    }
}
