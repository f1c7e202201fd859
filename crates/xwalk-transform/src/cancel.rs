use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Handle to cancel an in-progress evaluation.
///
/// Clones share one flag; workers poll it between row batches.
#[derive(Debug, Clone, Default)]
pub struct CancellationHandle {
    cancel_flag: Arc<AtomicBool>,
}

impl CancellationHandle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation.
    pub fn cancel(&self) {
        self.cancel_flag.store(true, Ordering::SeqCst);
    }

    /// Check if cancellation was requested.
    pub fn is_cancelled(&self) -> bool {
        self.cancel_flag.load(Ordering::SeqCst)
    }
}
