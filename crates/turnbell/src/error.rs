use std::sync::Arc;

use thiserror::Error;

/// Errors surfaced by the turn tracker.
///
/// Cloneable so a single failed invocation can be reported to every caller
/// that was awaiting it.
#[derive(Error, Debug, Clone)]
pub enum TrackerError {
    #[error("Completion callback failed: {0:#}")]
    Callback(Arc<anyhow::Error>),

    /// The task running the callback ended without reporting an outcome,
    /// either because the callback panicked or the runtime shut down.
    #[error("Completion callback was interrupted before finishing")]
    Interrupted,
}

impl From<anyhow::Error> for TrackerError {
    fn from(err: anyhow::Error) -> Self {
        Self::Callback(Arc::new(err))
    }
}

/// Result type alias using `TrackerError`.
pub type Result<T> = std::result::Result<T, TrackerError>;
