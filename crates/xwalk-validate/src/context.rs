use xwalk_ingest::TabularProvider;
use xwalk_model::{ActionRegistry, FieldTypeRegistry, Schema, StrictPolicy};

/// Everything a crosswalk is validated against.
#[derive(Clone)]
pub struct ValidationContext<'a> {
    pub field_types: &'a FieldTypeRegistry,
    pub actions: &'a ActionRegistry,
    pub schema: &'a Schema,
    /// Source column catalogue.
    pub source_columns: Vec<String>,
    /// Source data used for mapping completeness checks.
    pub sample: Option<&'a dyn TabularProvider>,
    pub strict: StrictPolicy,
    /// Rows of the sample inspected; all rows when unset.
    pub sample_rows: Option<usize>,
}

impl<'a> ValidationContext<'a> {
    pub fn new(
        field_types: &'a FieldTypeRegistry,
        actions: &'a ActionRegistry,
        schema: &'a Schema,
        source_columns: Vec<String>,
    ) -> Self {
        Self {
            field_types,
            actions,
            schema,
            source_columns,
            sample: None,
            strict: StrictPolicy::default(),
            sample_rows: None,
        }
    }

    /// Context whose column catalogue and sample both come from `provider`.
    pub fn for_provider(
        field_types: &'a FieldTypeRegistry,
        actions: &'a ActionRegistry,
        schema: &'a Schema,
        provider: &'a dyn TabularProvider,
    ) -> Self {
        Self::new(field_types, actions, schema, provider.column_names()).with_sample(provider)
    }

    pub fn with_sample(mut self, sample: &'a dyn TabularProvider) -> Self {
        self.sample = Some(sample);
        self
    }

    pub fn with_strict(mut self, strict: StrictPolicy) -> Self {
        self.strict = strict;
        self
    }

    pub fn with_sample_rows(mut self, rows: usize) -> Self {
        self.sample_rows = Some(rows);
        self
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.source_columns.iter().any(|c| c == name)
    }
}
