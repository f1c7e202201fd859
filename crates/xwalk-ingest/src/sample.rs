//! Sample value extraction for mapping checks.

use std::collections::BTreeSet;

use xwalk_model::RawValue;

use crate::error::ProviderError;
use crate::provider::TabularProvider;

/// Distinct non-missing values of a column, as trimmed text.
///
/// Only the first `max_rows` rows are inspected when a limit is given.
pub fn distinct_values(
    provider: &dyn TabularProvider,
    column: &str,
    missing_values: &[String],
    max_rows: Option<usize>,
) -> Result<BTreeSet<String>, ProviderError> {
    let values = provider.read_column(column)?;
    let limit = max_rows.unwrap_or(values.len());
    Ok(values
        .iter()
        .take(limit)
        .filter(|value| !value.is_absent(missing_values))
        .filter_map(RawValue::to_text)
        .collect())
}
