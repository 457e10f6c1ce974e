//! Service Manager - the registry of lifecycle records for one domain.
//!
//! The manager creates records when services register, hands out shared
//! handles, answers name and kind queries for administrative tooling, and
//! is the only place records are reclaimed. The registry lock guards the
//! map alone; transitions run on the records themselves, outside the lock.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use crate::config::LifecycleConfig;
use crate::error::{Result, ServiceError};
use crate::state::ServiceState;
use crate::types::{ServiceStateKind, StateSnapshot};

// =============================================================================
// ServiceSnapshot
// =============================================================================

/// Point-in-time view of one registered service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceSnapshot {
    /// Service name.
    pub name: String,
    /// State kind at the time of the read.
    pub kind: ServiceStateKind,
    /// Generation at the time of the read.
    pub generation: u64,
}

impl ServiceSnapshot {
    fn capture(state: &ServiceState) -> Self {
        let StateSnapshot { kind, generation } = state.snapshot();
        Self {
            name: state.name().to_string(),
            kind,
            generation,
        }
    }

    /// Returns the kind/generation pair.
    #[must_use]
    pub const fn state(&self) -> StateSnapshot {
        StateSnapshot {
            kind: self.kind,
            generation: self.generation,
        }
    }
}

// =============================================================================
// ServiceManager
// =============================================================================

/// Registry of service lifecycle records keyed by service name.
#[derive(Debug)]
pub struct ServiceManager {
    domain: String,
    services: RwLock<HashMap<Arc<str>, Arc<ServiceState>>>,
}

impl ServiceManager {
    /// Creates an empty registry for `domain`.
    #[must_use]
    pub fn new(domain: impl Into<String>) -> Self {
        Self {
            domain: domain.into(),
            services: RwLock::new(HashMap::new()),
        }
    }

    /// Creates a registry from configuration, registering every listed
    /// service.
    ///
    /// # Errors
    /// Returns an error if the configuration is invalid.
    pub fn from_config(config: &LifecycleConfig) -> Result<Self> {
        config.validate()?;
        let manager = Self::new(config.domain.clone());
        for name in &config.services {
            manager.register(name.as_str())?;
        }
        Ok(manager)
    }

    /// Returns the domain name.
    #[must_use]
    pub fn domain(&self) -> &str {
        &self.domain
    }

    /// Registers a service, returning its lifecycle record.
    ///
    /// Registering a name that is already known returns the existing record
    /// unchanged, so a restarted service picks up where its previous
    /// incarnation left off (typically `DIED`).
    ///
    /// # Errors
    /// Returns `ServiceError::EmptyName` if `name` is empty.
    pub fn register(&self, name: &str) -> Result<Arc<ServiceState>> {
        if let Some(existing) = self.services.read().get(name) {
            return Ok(Arc::clone(existing));
        }

        let mut services = self.services.write();
        if let Some(existing) = services.get(name) {
            return Ok(Arc::clone(existing));
        }

        let state = ServiceState::shared(name)?;
        services.insert(state.shared_name(), Arc::clone(&state));
        drop(services);

        tracing::info!(domain = %self.domain, name = %name, "registered service");
        Ok(state)
    }

    /// Returns the record for `name`, if registered.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<Arc<ServiceState>> {
        self.services.read().get(name).cloned()
    }

    /// Returns the current kind of `name`.
    ///
    /// # Errors
    /// Returns `ServiceError::NotFound` if the service is not registered.
    pub fn kind_of(&self, name: &str) -> Result<ServiceStateKind> {
        self.require(name).map(|state| state.kind())
    }

    /// Requests a transition for `name`.
    ///
    /// `Ok(false)` means the table rejected the transition; this is an
    /// expected outcome when callers race.
    ///
    /// # Errors
    /// Returns `ServiceError::NotFound` if the service is not registered.
    pub fn change_state(&self, name: &str, new: ServiceStateKind) -> Result<bool> {
        let state = self.require(name)?;

        match state.transition(new) {
            Ok(transition) => {
                if new.is_faulted() {
                    tracing::warn!(
                        name = %name,
                        from = %transition.from,
                        to = %transition.to,
                        "service entered fault state"
                    );
                } else {
                    tracing::debug!(
                        name = %name,
                        from = %transition.from,
                        to = %transition.to,
                        generation = transition.generation,
                        "service state changed"
                    );
                }
                Ok(true)
            }
            Err(err) => {
                tracing::trace!(name = %name, error = %err, "transition rejected");
                Ok(false)
            }
        }
    }

    /// Returns the names of all services currently in `kind`, sorted.
    #[must_use]
    pub fn services_in(&self, kind: ServiceStateKind) -> Vec<String> {
        let mut names: Vec<String> = self
            .services
            .read()
            .values()
            .filter(|state| state.kind() == kind)
            .map(|state| state.name().to_string())
            .collect();
        names.sort();
        names
    }

    /// Returns a snapshot of every registered service, sorted by name.
    #[must_use]
    pub fn snapshot(&self) -> Vec<ServiceSnapshot> {
        let mut snapshots: Vec<ServiceSnapshot> = self
            .services
            .read()
            .values()
            .map(|state| ServiceSnapshot::capture(state))
            .collect();
        snapshots.sort_by(|a, b| a.name.cmp(&b.name));
        snapshots
    }

    /// Returns handles to every registered record, sorted by name.
    #[must_use]
    pub fn records(&self) -> Vec<Arc<ServiceState>> {
        let mut records: Vec<Arc<ServiceState>> =
            self.services.read().values().cloned().collect();
        records.sort_by(|a, b| a.name().cmp(b.name()));
        records
    }

    /// Renders [`snapshot`](Self::snapshot) as JSON for administrative
    /// tooling.
    ///
    /// # Errors
    /// Returns `ServiceError::Serialization` if encoding fails.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(&self.snapshot())?)
    }

    /// Removes `name` from the registry and returns its record.
    ///
    /// Callers still holding the record can keep querying its last kind
    /// and name.
    ///
    /// The liveness check reads a snapshot of the record. Only `TERMINATED`
    /// is final; a holder can still restart a reclaimed `DIED` or
    /// `INCOMPATIBLE_CONFIGURATION` record, but that record stays outside
    /// the registry and a later [`register`](Self::register) creates a new
    /// one.
    ///
    /// # Errors
    /// Returns `ServiceError::NotFound` if the service is not registered,
    /// or `ServiceError::State` while it is still starting, running, or
    /// terminating.
    pub fn reclaim(&self, name: &str) -> Result<Arc<ServiceState>> {
        let mut services = self.services.write();

        let state = services
            .get(name)
            .ok_or_else(|| ServiceError::not_found(name))?;

        let kind = state.kind();
        if kind.is_alive() {
            return Err(ServiceError::state(format!(
                "cannot reclaim service {name} while {kind}"
            )));
        }

        let state = services
            .remove(name)
            .ok_or_else(|| ServiceError::not_found(name))?;
        drop(services);

        tracing::info!(name = %name, kind = %kind, "reclaimed service");
        Ok(state)
    }

    /// Returns the number of registered services.
    #[must_use]
    pub fn count(&self) -> usize {
        self.services.read().len()
    }

    /// Returns all registered names, sorted.
    #[must_use]
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .services
            .read()
            .keys()
            .map(|name| name.to_string())
            .collect();
        names.sort();
        names
    }

    fn require(&self, name: &str) -> Result<Arc<ServiceState>> {
        self.get(name).ok_or_else(|| ServiceError::not_found(name))
    }
}
