// Allow unwrap/expect in tests for clear failure messages
#![cfg_attr(test, allow(clippy::unwrap_used, clippy::expect_used, clippy::panic))]

//! # servstate-core
//!
//! Service lifecycle primitives for a publish/subscribe middleware kernel.
//!
//! Every long-running kernel service (durability, networking,
//! administration, ...) owns one [`ServiceState`]: an immutable name and a
//! lifecycle kind that only moves along a fixed legality table. Other kernel
//! components read it to decide whether a service can be relied upon and
//! race on it to arbitrate shutdown or failure handling.
//!
//! This crate provides:
//!
//! - [`ServiceStateKind`] and the transition legality table
//! - [`ServiceState`], a lock-free lifecycle record shared as `Arc`
//! - [`ServiceManager`], the per-domain registry of records
//! - [`LifecycleConfig`] for loading a domain's service list
//!
//! ## Example
//!
//! ```
//! use servstate_core::{ServiceManager, ServiceStateKind};
//!
//! let manager = ServiceManager::new("domain0");
//! let durability = manager.register("durability").unwrap();
//!
//! assert!(durability.change_state(ServiceStateKind::Initialising));
//! assert!(durability.change_state(ServiceStateKind::Operational));
//!
//! // Two shutdown requests: only the first one to commit drives shutdown.
//! let observed = durability.snapshot();
//! assert!(durability.change_state_from(observed, ServiceStateKind::Terminating));
//! assert!(!durability.change_state_from(observed, ServiceStateKind::Terminating));
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod config;
pub mod error;
pub mod manager;
pub mod state;
#[cfg(test)]
pub mod tests;
pub mod types;

pub use config::{LifecycleConfig, MonitorConfig};
pub use error::{Result, ServiceError};
pub use manager::{ServiceManager, ServiceSnapshot};
pub use state::ServiceState;
pub use types::{ServiceStateKind, StateSnapshot, Transition};
