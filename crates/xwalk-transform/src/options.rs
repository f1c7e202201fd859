use xwalk_model::{EngineConfig, StrictPolicy};

/// Options for a single evaluation run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EvaluationOptions {
    /// Applied on top of the policy the method was validated with.
    pub strict: StrictPolicy,
    pub workers: usize,
    pub batch_size: usize,
}

impl Default for EvaluationOptions {
    fn default() -> Self {
        Self::from(&EngineConfig::default())
    }
}

impl From<&EngineConfig> for EvaluationOptions {
    fn from(config: &EngineConfig) -> Self {
        Self {
            strict: StrictPolicy::default(),
            workers: config.workers.max(1),
            batch_size: config.batch_size.max(1),
        }
    }
}

impl EvaluationOptions {
    pub fn with_strict(mut self, strict: StrictPolicy) -> Self {
        self.strict = strict;
        self
    }

    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers.max(1);
        self
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }
}
