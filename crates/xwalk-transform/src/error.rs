use thiserror::Error;
use xwalk_ingest::ProviderError;
use xwalk_model::ValidationReport;

#[derive(Debug, Error)]
pub enum EvaluateError {
    /// The method does not fit the data it was handed.
    #[error("method is not valid for this source:\n{0}")]
    Invalid(ValidationReport),

    /// Strict policy turned findings into errors.
    #[error("strict evaluation failed:\n{0}")]
    Strict(ValidationReport),

    #[error("evaluation cancelled")]
    Cancelled,

    #[error(transparent)]
    Provider(#[from] ProviderError),

    #[error("failed to build destination frame: {0}")]
    Frame(#[from] polars::prelude::PolarsError),

    #[error("failed to start worker pool: {0}")]
    Pool(#[from] rayon::ThreadPoolBuildError),
}

impl EvaluateError {
    /// Report attached to validation and strict failures.
    pub fn report(&self) -> Option<&ValidationReport> {
        match self {
            EvaluateError::Invalid(report) | EvaluateError::Strict(report) => Some(report),
            _ => None,
        }
    }
}

#[derive(Debug, Error)]
pub enum OutputError {
    #[error("failed to render csv: {0}")]
    Csv(#[from] polars::prelude::PolarsError),

    #[error("failed to render json: {0}")]
    Json(#[from] serde_json::Error),

    #[error("failed to write {path}: {source}")]
    Io {
        path: std::path::PathBuf,
        #[source]
        source: std::io::Error,
    },
}
