//! Observability error types.

use servstate_core::ServiceError;

/// Result type alias for observe operations.
pub type Result<T> = std::result::Result<T, ObserveError>;

/// Observability errors.
#[derive(Debug, thiserror::Error)]
pub enum ObserveError {
    /// Monitor error.
    #[error("monitor error: {0}")]
    Monitor(String),

    /// Lifecycle registry error.
    #[error(transparent)]
    Service(#[from] ServiceError),
}

impl ObserveError {
    /// Creates a monitor error.
    #[must_use]
    pub fn monitor(msg: impl Into<String>) -> Self {
        Self::Monitor(msg.into())
    }
}
