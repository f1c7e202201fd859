//! Crosswalk evaluation.
//!
//! - **engine**: parallel evaluation of a validated method over a provider
//! - **executors**: per-action row logic
//! - **frame_builder**: destination table to polars frame
//! - **output**: CSV/JSON rendering, fingerprints and file output
//! - **cancel**: cooperative cancellation

mod cancel;
mod engine;
mod error;
mod executors;
mod frame_builder;
mod options;
mod output;

pub use cancel::CancellationHandle;
pub use engine::{Evaluation, evaluate};
pub use error::{EvaluateError, OutputError};
pub use executors::StepDiagnostics;
pub use frame_builder::build_frame;
pub use options::EvaluationOptions;
pub use output::{fingerprint, render_output, write_output};
