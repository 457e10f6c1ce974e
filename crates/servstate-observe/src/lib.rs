// Allow unwrap/expect in tests for clear failure messages
#![cfg_attr(test, allow(clippy::unwrap_used, clippy::expect_used, clippy::panic))]

//! # servstate-observe
//!
//! Observation of service lifecycle records.
//!
//! This crate provides:
//! - **Health classification**: map state kinds to a health verdict and roll
//!   a whole domain up into a [`HealthReport`]
//! - **State monitoring**: poll a [`ServiceManager`](servstate_core::ServiceManager)
//!   and report registrations, transitions and reclaims as [`StateEvent`]s,
//!   optionally from a background tokio task
//!
//! Reacting to a fault (restarting a service, tearing down a domain) is the
//! caller's business.
//!
//! ## Example
//!
//! ```rust
//! use std::sync::Arc;
//! use servstate_core::{ServiceManager, ServiceStateKind};
//! use servstate_observe::{HealthReport, StateEvent, StateMonitor};
//!
//! let manager = Arc::new(ServiceManager::new("domain0"));
//! let mut monitor = StateMonitor::new(Arc::clone(&manager));
//!
//! let durability = manager.register("durability").unwrap();
//! monitor.poll();
//!
//! durability.change_state(ServiceStateKind::Initialising);
//! durability.change_state(ServiceStateKind::Died);
//!
//! let events = monitor.poll();
//! assert!(matches!(events[0], StateEvent::Changed { missed: 1, .. }));
//! assert_eq!(HealthReport::assess(&manager).faulted_count(), 1);
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod error;
pub mod health;
pub mod monitor;

pub use error::{ObserveError, Result};
pub use health::{HealthReport, ServiceHealth, ServiceHealthEntry};
pub use monitor::{MonitorHandle, StateEvent, StateMonitor};
