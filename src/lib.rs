//! servstate: service lifecycle state machine for pub/sub middleware kernels.
//!
//! # Quick Start
//!
//! ```rust
//! use servstate::prelude::*;
//!
//! let manager = ServiceManager::new("domain0");
//! let durability = manager.register("durability").unwrap();
//! assert!(durability.change_state(ServiceStateKind::Initialising));
//! assert!(durability.change_state(ServiceStateKind::Operational));
//! assert!(!durability.change_state(ServiceStateKind::Initialising));
//! assert!(HealthReport::assess(&manager).all_healthy());
//! ```

pub use servstate_core as core;
pub use servstate_observe as observe;

/// Prelude module for common imports.
pub mod prelude {
    pub use servstate_core::{
        LifecycleConfig, MonitorConfig, ServiceError, ServiceManager, ServiceSnapshot,
        ServiceState, ServiceStateKind, StateSnapshot, Transition,
    };
    pub use servstate_observe::{
        HealthReport, MonitorHandle, ServiceHealth, StateEvent, StateMonitor,
    };
}
