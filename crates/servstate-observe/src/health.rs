//! Health classification of service lifecycle states.
//!
//! Fault monitors read a service's kind and decide whether it can be
//! relied upon. This module turns kinds into a health verdict and rolls a
//! whole registry up into a [`HealthReport`]. Reacting to faults is left
//! to the caller.

use serde::{Deserialize, Serialize};
use servstate_core::{ServiceManager, ServiceStateKind};

// =============================================================================
// ServiceHealth
// =============================================================================

/// Health verdict for one service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ServiceHealth {
    /// Registered or starting; not yet reliable.
    Pending,
    /// Operational.
    Healthy,
    /// Shutting down in an orderly way.
    Stopping,
    /// Shut down for good.
    Stopped,
    /// Died or rejected its configuration.
    Faulted(ServiceStateKind),
}

impl ServiceHealth {
    /// Classifies a state kind.
    #[must_use]
    pub const fn from_kind(kind: ServiceStateKind) -> Self {
        match kind {
            ServiceStateKind::None | ServiceStateKind::Initialising => Self::Pending,
            ServiceStateKind::Operational => Self::Healthy,
            ServiceStateKind::Terminating => Self::Stopping,
            ServiceStateKind::Terminated => Self::Stopped,
            ServiceStateKind::IncompatibleConfiguration | ServiceStateKind::Died => {
                Self::Faulted(kind)
            }
        }
    }

    /// Returns true if the service can be relied upon.
    #[must_use]
    pub const fn is_healthy(&self) -> bool {
        matches!(self, Self::Healthy)
    }

    /// Returns true if the service needs remediation.
    #[must_use]
    pub const fn is_faulted(&self) -> bool {
        matches!(self, Self::Faulted(_))
    }
}

impl From<ServiceStateKind> for ServiceHealth {
    fn from(kind: ServiceStateKind) -> Self {
        Self::from_kind(kind)
    }
}

// =============================================================================
// HealthReport
// =============================================================================

/// Health of one registered service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceHealthEntry {
    /// Service name.
    pub name: String,
    /// State kind at the time of assessment.
    pub kind: ServiceStateKind,
    /// Verdict derived from `kind`.
    pub health: ServiceHealth,
}

/// Health of every service in a domain at one point in time.
///
/// Each entry is its own snapshot; the report as a whole is not atomic
/// across services.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthReport {
    /// Domain the report describes.
    pub domain: String,
    /// Per-service entries, sorted by name.
    pub entries: Vec<ServiceHealthEntry>,
}

impl HealthReport {
    /// Assesses every service registered with `manager`.
    #[must_use]
    pub fn assess(manager: &ServiceManager) -> Self {
        let entries = manager
            .snapshot()
            .into_iter()
            .map(|snap| ServiceHealthEntry {
                health: ServiceHealth::from_kind(snap.kind),
                kind: snap.kind,
                name: snap.name,
            })
            .collect();

        Self {
            domain: manager.domain().to_string(),
            entries,
        }
    }

    /// Returns the entries that need remediation.
    pub fn faulted(&self) -> impl Iterator<Item = &ServiceHealthEntry> {
        self.entries.iter().filter(|e| e.health.is_faulted())
    }

    /// Returns the number of healthy services.
    #[must_use]
    pub fn healthy_count(&self) -> usize {
        self.entries.iter().filter(|e| e.health.is_healthy()).count()
    }

    /// Returns the number of faulted services.
    #[must_use]
    pub fn faulted_count(&self) -> usize {
        self.faulted().count()
    }

    /// Returns the health ratio (healthy / total).
    #[must_use]
    pub fn health_ratio(&self) -> f64 {
        if self.entries.is_empty() {
            1.0
        } else {
            self.healthy_count() as f64 / self.entries.len() as f64
        }
    }

    /// Returns true if every service is operational.
    #[must_use]
    pub fn all_healthy(&self) -> bool {
        self.entries.iter().all(|e| e.health.is_healthy())
    }

    /// Returns the entry for `name`.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&ServiceHealthEntry> {
        self.entries.iter().find(|e| e.name == name)
    }
}
