//! Polling monitor for service state changes.
//!
//! [`StateMonitor`] remembers the last snapshot of every registered
//! service and reports the differences on each [`poll`](StateMonitor::poll).
//! Because records are polled, a service can move several times between two
//! polls; the generation counter exposes how many transitions were not seen
//! individually.

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use servstate_core::{
    MonitorConfig, ServiceManager, ServiceState, ServiceStateKind, StateSnapshot,
};
use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::error::{ObserveError, Result};

/// Capacity of the broadcast channel behind [`MonitorHandle::subscribe`].
const EVENT_CHANNEL_CAPACITY: usize = 256;

// =============================================================================
// StateEvent
// =============================================================================

/// A change observed between two polls.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum StateEvent {
    /// A record was seen for the first time.
    Registered {
        /// Service name.
        name: String,
        /// Kind at first sight.
        kind: ServiceStateKind,
    },
    /// A record committed one or more transitions since the last poll.
    Changed {
        /// Service name.
        name: String,
        /// Kind at the previous poll.
        from: ServiceStateKind,
        /// Kind now.
        to: ServiceStateKind,
        /// Generation now.
        generation: u64,
        /// Transitions committed in between that were not observed.
        missed: u64,
    },
    /// A record left the registry.
    Reclaimed {
        /// Service name.
        name: String,
        /// Kind of the record when it was last queried.
        last: ServiceStateKind,
    },
}

impl StateEvent {
    /// Returns the service name the event refers to.
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::Registered { name, .. }
            | Self::Changed { name, .. }
            | Self::Reclaimed { name, .. } => name,
        }
    }

    /// Returns true if the event reports a service entering a fault kind.
    #[must_use]
    pub const fn is_fault(&self) -> bool {
        match self {
            Self::Registered { kind, .. } => kind.is_faulted(),
            Self::Changed { to, .. } => to.is_faulted(),
            Self::Reclaimed { .. } => false,
        }
    }
}

// =============================================================================
// StateMonitor
// =============================================================================

#[derive(Debug)]
struct Tracked {
    record: Arc<ServiceState>,
    last: StateSnapshot,
}

/// Diffs a [`ServiceManager`] against its own previous observation.
#[derive(Debug)]
pub struct StateMonitor {
    manager: Arc<ServiceManager>,
    tracked: HashMap<Arc<str>, Tracked>,
    history: VecDeque<StateEvent>,
    capacity: usize,
}

impl StateMonitor {
    /// Creates a monitor with the default history capacity.
    #[must_use]
    pub fn new(manager: Arc<ServiceManager>) -> Self {
        let capacity = MonitorConfig::default().history;
        Self {
            manager,
            tracked: HashMap::new(),
            history: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Creates a monitor sized by `config`.
    ///
    /// # Errors
    /// Returns an error if `config` is invalid.
    pub fn from_config(manager: Arc<ServiceManager>, config: &MonitorConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::new(manager).with_history(config.history))
    }

    /// Sets how many events the history keeps. Zero is treated as one.
    #[must_use]
    pub fn with_history(mut self, capacity: usize) -> Self {
        self.capacity = capacity.max(1);
        while self.history.len() > self.capacity {
            self.history.pop_front();
        }
        self
    }

    /// Returns the monitored registry.
    #[must_use]
    pub fn manager(&self) -> &Arc<ServiceManager> {
        &self.manager
    }

    /// Returns recorded events, oldest first.
    pub fn history(&self) -> impl Iterator<Item = &StateEvent> {
        self.history.iter()
    }

    /// Returns the number of services currently tracked.
    #[must_use]
    pub fn tracked_count(&self) -> usize {
        self.tracked.len()
    }

    /// Returns the last snapshot observed for `name`.
    #[must_use]
    pub fn last_seen(&self, name: &str) -> Option<StateSnapshot> {
        self.tracked.get(name).map(|t| t.last)
    }

    /// Compares the registry with the previous poll and returns what changed.
    ///
    /// Events for present services come in name order, followed by
    /// reclaimed services in name order. A name that was reclaimed and
    /// registered again between polls yields `Reclaimed` then `Registered`.
    pub fn poll(&mut self) -> Vec<StateEvent> {
        let mut events = Vec::new();
        let mut present = HashSet::new();

        for record in self.manager.records() {
            let name = record.shared_name();
            let snap = record.snapshot();
            present.insert(Arc::clone(&name));

            match self.tracked.get_mut(&name) {
                Some(tracked) if Arc::ptr_eq(&tracked.record, &record) => {
                    if snap.generation != tracked.last.generation {
                        events.push(StateEvent::Changed {
                            name: name.to_string(),
                            from: tracked.last.kind,
                            to: snap.kind,
                            generation: snap.generation,
                            missed: snap
                                .generation
                                .saturating_sub(tracked.last.generation)
                                .saturating_sub(1),
                        });
                        tracked.last = snap;
                    }
                }
                Some(tracked) => {
                    events.push(StateEvent::Reclaimed {
                        name: name.to_string(),
                        last: tracked.record.kind(),
                    });
                    events.push(StateEvent::Registered {
                        name: name.to_string(),
                        kind: snap.kind,
                    });
                    *tracked = Tracked { record, last: snap };
                }
                None => {
                    events.push(StateEvent::Registered {
                        name: name.to_string(),
                        kind: snap.kind,
                    });
                    self.tracked.insert(name, Tracked { record, last: snap });
                }
            }
        }

        let mut gone: Vec<Arc<str>> = self
            .tracked
            .keys()
            .filter(|name| !present.contains(*name))
            .cloned()
            .collect();
        gone.sort();
        for name in gone {
            if let Some(tracked) = self.tracked.remove(&name) {
                events.push(StateEvent::Reclaimed {
                    name: name.to_string(),
                    last: tracked.record.kind(),
                });
            }
        }

        for event in &events {
            self.log(event);
            if self.history.len() == self.capacity {
                self.history.pop_front();
            }
            self.history.push_back(event.clone());
        }

        events
    }

    fn log(&self, event: &StateEvent) {
        let domain = self.manager.domain();
        match event {
            StateEvent::Changed {
                name,
                from,
                to,
                missed,
                ..
            } if to.is_faulted() => {
                tracing::warn!(domain, name = %name, %from, %to, missed, "service faulted");
            }
            StateEvent::Registered { name, kind } if kind.is_faulted() => {
                tracing::warn!(
                    domain,
                    name = %name,
                    %kind,
                    "service registered in fault state"
                );
            }
            StateEvent::Changed {
                name,
                from,
                to,
                missed,
                ..
            } => {
                tracing::debug!(
                    domain,
                    name = %name,
                    %from,
                    %to,
                    missed,
                    "service changed state"
                );
            }
            StateEvent::Registered { name, kind } => {
                tracing::debug!(domain, name = %name, %kind, "service appeared");
            }
            StateEvent::Reclaimed { name, last } => {
                tracing::debug!(domain, name = %name, %last, "service reclaimed");
            }
        }
    }

    /// Runs the monitor on the tokio runtime, polling every `period`.
    ///
    /// The first poll happens immediately. Events are broadcast to every
    /// receiver obtained from [`MonitorHandle::subscribe`]; receivers that
    /// fall behind lose the oldest events.
    ///
    /// # Errors
    /// Returns an error if `period` is zero or no tokio runtime is running
    /// on the calling thread.
    pub fn spawn(mut self, period: Duration) -> Result<MonitorHandle> {
        if period.is_zero() {
            return Err(ObserveError::monitor("poll period must be non-zero"));
        }
        let runtime = tokio::runtime::Handle::try_current()
            .map_err(|e| ObserveError::monitor(format!("no tokio runtime: {e}")))?;

        let (event_tx, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        let (shutdown_tx, mut shutdown_rx) = watch::channel(false);
        let tx = event_tx.clone();

        let task = runtime.spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            tracing::debug!(domain = self.manager.domain(), ?period, "state monitor started");

            loop {
                tokio::select! {
                    _ = shutdown_rx.changed() => break,
                    _ = ticker.tick() => {
                        for event in self.poll() {
                            // No receivers is not an error.
                            let _ = tx.send(event);
                        }
                    }
                }
            }

            tracing::debug!(domain = self.manager.domain(), "state monitor stopped");
            self
        });

        Ok(MonitorHandle {
            event_tx,
            shutdown_tx,
            task,
        })
    }
}

// =============================================================================
// MonitorHandle
// =============================================================================

/// Handle to a running [`StateMonitor`].
///
/// Dropping the handle also stops the task.
#[derive(Debug)]
pub struct MonitorHandle {
    event_tx: broadcast::Sender<StateEvent>,
    shutdown_tx: watch::Sender<bool>,
    task: JoinHandle<StateMonitor>,
}

impl MonitorHandle {
    /// Subscribes to events produced after this call.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<StateEvent> {
        self.event_tx.subscribe()
    }

    /// Returns true while the polling task is alive.
    #[must_use]
    pub fn is_running(&self) -> bool {
        !self.task.is_finished()
    }

    /// Stops polling and returns the monitor with its history.
    ///
    /// # Errors
    /// Returns an error if the polling task panicked or was cancelled.
    pub async fn stop(self) -> Result<StateMonitor> {
        let _ = self.shutdown_tx.send(true);
        self.task
            .await
            .map_err(|e| ObserveError::monitor(format!("monitor task failed: {e}")))
    }
}
