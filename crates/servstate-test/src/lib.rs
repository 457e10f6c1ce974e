// Allow unwrap/expect in tests for clear failure messages
#![cfg_attr(test, allow(clippy::unwrap_used, clippy::expect_used, clippy::panic))]

//! # servstate-test
//!
//! Testing infrastructure for servstate.
//!
//! This crate provides:
//! - **Lifecycle driver**: walk a record to any reachable kind along the
//!   shortest legal path
//! - **Contention harness**: race transition requests from many threads and
//!   collect per-round winners
//! - **Falsification tests**: cross-crate tests that try to refute the
//!   lifecycle guarantees
//!
//! ## Example
//!
//! ```rust
//! use servstate_core::ServiceStateKind;
//! use servstate_test::{ContentionHarness, RaceMode};
//!
//! let report = ContentionHarness::new(ServiceStateKind::Operational)
//!     .with_rounds(10)
//!     .race(
//!         &[ServiceStateKind::Terminating, ServiceStateKind::Died],
//!         RaceMode::Arbitrated,
//!     )
//!     .unwrap();
//! assert_eq!(report.max_winners(), 1);
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod error;
pub mod harness;

pub use error::{Result, TestError};
pub use harness::{
    ContentionHarness, ContentionReport, RaceMode, RoundOutcome, drive_to, path_between,
};

/// Installs a test-friendly tracing subscriber filtered by `RUST_LOG`.
///
/// Safe to call from every test; only the first call installs anything.
pub fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_test_writer()
        .try_init();
}
