//! Test error types.

use servstate_core::{ServiceError, ServiceStateKind};

/// Result type alias for test operations.
pub type Result<T> = std::result::Result<T, TestError>;

/// Testing errors.
#[derive(Debug, thiserror::Error)]
pub enum TestError {
    /// Harness error.
    #[error("harness error: {0}")]
    Harness(String),

    /// The requested kind cannot be reached from the current one.
    #[error("{to} is unreachable from {from}")]
    Unreachable {
        /// Kind the record is in.
        from: ServiceStateKind,
        /// Kind that was requested.
        to: ServiceStateKind,
    },

    /// Assertion failed.
    #[error("assertion failed: {0}")]
    Assertion(String),

    /// Lifecycle error.
    #[error("service error: {0}")]
    Service(#[from] ServiceError),
}

impl TestError {
    /// Creates a harness error.
    #[must_use]
    pub fn harness(msg: impl Into<String>) -> Self {
        Self::Harness(msg.into())
    }

    /// Creates an assertion error.
    #[must_use]
    pub fn assertion(msg: impl Into<String>) -> Self {
        Self::Assertion(msg.into())
    }
}
