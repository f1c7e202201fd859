//! Source data access for crosswalk evaluation.
//!
//! Validation and evaluation only see the [`TabularProvider`] contract. This
//! crate supplies the polars-backed implementation, CSV loading and a
//! spilling wrapper that bounds resident memory.

mod csv;
mod error;
mod polars_utils;
mod provider;
mod sample;
mod spill;

pub use csv::read_csv_frame;
pub use error::{IngestError, ProviderError, Result};
pub use polars_utils::any_to_raw;
pub use provider::{FrameProvider, TabularProvider};
pub use sample::distinct_values;
pub use spill::{MAX_RELOAD_ATTEMPTS, SpillingProvider};
