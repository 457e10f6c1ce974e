//! Error types for servstate-core.
//!
//! An illegal transition is an expected outcome, not a fault: the plain
//! `change_state` path reports it as `false`. The variants here serve the
//! diagnostic APIs, the registry, and configuration loading.

use crate::types::ServiceStateKind;

/// Result type alias for lifecycle operations.
pub type Result<T> = std::result::Result<T, ServiceError>;

/// Error type for lifecycle operations.
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    /// The requested target is not reachable from the current state.
    #[error("illegal transition: {from} -> {to}")]
    IllegalTransition {
        /// State observed when the transition was evaluated.
        from: ServiceStateKind,
        /// Requested target state.
        to: ServiceStateKind,
    },

    /// Text did not name a service state kind.
    #[error("unknown service state kind: {0}")]
    UnknownKind(String),

    /// A service name was empty.
    #[error("service name cannot be empty")]
    EmptyName,

    /// Service not registered.
    #[error("service not found: {0}")]
    NotFound(String),

    /// Operation not permitted in the current state.
    #[error("invalid state: {0}")]
    State(String),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),

    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ServiceError {
    /// Creates an illegal transition error.
    #[must_use]
    pub const fn illegal(from: ServiceStateKind, to: ServiceStateKind) -> Self {
        Self::IllegalTransition { from, to }
    }

    /// Creates a not-found error.
    #[must_use]
    pub fn not_found(name: impl Into<String>) -> Self {
        Self::NotFound(name.into())
    }

    /// Creates a configuration error.
    #[must_use]
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Creates an invalid state error.
    #[must_use]
    pub fn state(msg: impl Into<String>) -> Self {
        Self::State(msg.into())
    }

    /// Returns true if this error is part of normal transition arbitration.
    #[must_use]
    pub const fn is_illegal_transition(&self) -> bool {
        matches!(self, Self::IllegalTransition { .. })
    }
}

impl From<serde_json::Error> for ServiceError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}
