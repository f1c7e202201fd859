//! Crosswalk method definitions.
//!
//! A method is a draft: it can be built, edited and serialized freely. It is
//! only executed after validation turns it into a `ValidatedMethod`.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::action::Modifier;

/// Reference to a source column, optionally tagged with a modifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "SourceRefRepr")]
pub struct SourceRef {
    pub column: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub modifier: Option<Modifier>,
    /// Destination term asserted by a BOOL source.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub term: Option<String>,
}

/// Sources may be written as a bare column name.
#[derive(Deserialize)]
#[serde(untagged)]
enum SourceRefRepr {
    Column(String),
    Full {
        column: String,
        #[serde(default)]
        modifier: Option<Modifier>,
        #[serde(default)]
        term: Option<String>,
    },
}

impl From<SourceRefRepr> for SourceRef {
    fn from(repr: SourceRefRepr) -> Self {
        match repr {
            SourceRefRepr::Column(column) => SourceRef::new(column),
            SourceRefRepr::Full {
                column,
                modifier,
                term,
            } => SourceRef {
                column,
                modifier,
                term,
            },
        }
    }
}

impl SourceRef {
    pub fn new(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            modifier: None,
            term: None,
        }
    }

    pub fn with_modifier(mut self, modifier: Modifier) -> Self {
        self.modifier = Some(modifier);
        self
    }

    pub fn with_term(mut self, term: impl Into<String>) -> Self {
        self.term = Some(term.into());
        self
    }

    pub fn add(column: impl Into<String>) -> Self {
        Self::new(column).with_modifier(Modifier::Add)
    }

    pub fn sub(column: impl Into<String>) -> Self {
        Self::new(column).with_modifier(Modifier::Sub)
    }

    pub fn boolean(column: impl Into<String>) -> Self {
        Self::new(column).with_modifier(Modifier::Bool)
    }

    pub fn term(column: impl Into<String>) -> Self {
        Self::new(column).with_modifier(Modifier::Term)
    }
}

/// One action binding deriving a single destination field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CrosswalkStep {
    pub action: String,
    pub target: String,
    #[serde(default)]
    pub sources: Vec<SourceRef>,
    /// Literal assigned by NEW.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub constant: Option<serde_json::Value>,
    /// Source value to destination term, for TERM classification.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub term_map: BTreeMap<String, String>,
}

impl CrosswalkStep {
    pub fn new(action: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            action: action.into(),
            target: target.into(),
            sources: Vec::new(),
            constant: None,
            term_map: BTreeMap::new(),
        }
    }

    pub fn with_source(mut self, source: SourceRef) -> Self {
        self.sources.push(source);
        self
    }

    pub fn with_sources<I>(mut self, sources: I) -> Self
    where
        I: IntoIterator<Item = SourceRef>,
    {
        self.sources.extend(sources);
        self
    }

    pub fn with_constant(mut self, constant: impl Into<serde_json::Value>) -> Self {
        self.constant = Some(constant.into());
        self
    }

    pub fn with_term(mut self, source_value: impl Into<String>, term: impl Into<String>) -> Self {
        self.term_map.insert(source_value.into(), term.into());
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CrosswalkMethod {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub steps: Vec<CrosswalkStep>,
}

impl CrosswalkMethod {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            steps: Vec::new(),
        }
    }

    pub fn add_step(&mut self, step: CrosswalkStep) {
        self.steps.push(step);
    }

    pub fn with_step(mut self, step: CrosswalkStep) -> Self {
        self.steps.push(step);
        self
    }

    /// Every source column any step reads, deduplicated and sorted.
    pub fn referenced_columns(&self) -> BTreeSet<&str> {
        self.steps
            .iter()
            .flat_map(|step| step.sources.iter().map(|s| s.column.as_str()))
            .collect()
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}
