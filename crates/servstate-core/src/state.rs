//! The per-service lifecycle record.
//!
//! A [`ServiceState`] holds one atomic cell packing the state kind together
//! with a transition counter, plus the immutable service name. All reads are
//! single atomic loads and every transition is a compare-and-swap loop that
//! re-checks the legality table against the value it lost to, so readers
//! never block and writers never wait on each other.
//!
//! The record is meant to be shared as `Arc<ServiceState>`: the kernel's
//! registry, the service itself, and any number of monitors each hold a
//! handle, and the record stays queryable after the service is gone.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::error::{Result, ServiceError};
use crate::types::{ServiceStateKind, StateSnapshot, Transition};

/// Bits of the cell reserved for the kind; the rest hold the generation.
const KIND_BITS: u32 = 8;
const KIND_MASK: u64 = (1 << KIND_BITS) - 1;
const GENERATION_MASK: u64 = u64::MAX >> KIND_BITS;

const fn pack(kind: ServiceStateKind, generation: u64) -> u64 {
    ((generation & GENERATION_MASK) << KIND_BITS) | kind.as_u8() as u64
}

const fn unpack(raw: u64) -> StateSnapshot {
    let kind = match ServiceStateKind::from_u8((raw & KIND_MASK) as u8) {
        Some(kind) => kind,
        // The cell only ever holds values produced by `pack`.
        None => ServiceStateKind::Terminated,
    };
    StateSnapshot {
        kind,
        generation: raw >> KIND_BITS,
    }
}

const fn next_generation(generation: u64) -> u64 {
    generation.wrapping_add(1) & GENERATION_MASK
}

/// Authoritative lifecycle state of one service.
///
/// # Example
///
/// ```
/// use servstate_core::{ServiceState, ServiceStateKind};
///
/// let state = ServiceState::new("durability").unwrap();
/// assert_eq!(state.kind(), ServiceStateKind::None);
///
/// assert!(state.change_state(ServiceStateKind::Initialising));
/// assert!(state.change_state(ServiceStateKind::Operational));
/// assert!(!state.change_state(ServiceStateKind::Initialising));
/// assert_eq!(state.kind(), ServiceStateKind::Operational);
/// ```
pub struct ServiceState {
    cell: AtomicU64,
    name: Arc<str>,
}

impl ServiceState {
    /// Creates a record in state `None`.
    ///
    /// # Errors
    /// Returns `ServiceError::EmptyName` if `name` is empty.
    pub fn new(name: impl Into<String>) -> Result<Self> {
        let name: String = name.into();
        if name.is_empty() {
            return Err(ServiceError::EmptyName);
        }
        Ok(Self {
            cell: AtomicU64::new(pack(ServiceStateKind::None, 0)),
            name: Arc::from(name),
        })
    }

    /// Creates a record already wrapped for sharing.
    ///
    /// # Errors
    /// Returns `ServiceError::EmptyName` if `name` is empty.
    pub fn shared(name: impl Into<String>) -> Result<Arc<Self>> {
        Self::new(name).map(Arc::new)
    }

    /// Returns the service name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns a handle to the name that outlives this record.
    #[must_use]
    pub fn shared_name(&self) -> Arc<str> {
        Arc::clone(&self.name)
    }

    /// Returns the current state kind.
    ///
    /// The value may be stale as soon as it is returned.
    #[must_use]
    pub fn kind(&self) -> ServiceStateKind {
        self.snapshot().kind
    }

    /// Returns the current kind together with its generation.
    #[must_use]
    pub fn snapshot(&self) -> StateSnapshot {
        unpack(self.cell.load(Ordering::Acquire))
    }

    /// Moves to `new` if the legality table allows it from the current kind.
    ///
    /// Returns `false`, leaving the state untouched, when the transition is
    /// illegal. Concurrent callers are linearized: the outcome of any set of
    /// overlapping calls equals some serial order of them. Self-transitions
    /// are legal, so two callers requesting the same kind can both get
    /// `true`; use [`change_state_from`](Self::change_state_from) when only
    /// one caller may win.
    pub fn change_state(&self, new: ServiceStateKind) -> bool {
        self.transition(new).is_ok()
    }

    /// Like [`change_state`](Self::change_state), reporting what happened.
    ///
    /// # Errors
    /// Returns `ServiceError::IllegalTransition` carrying the kind the
    /// request was evaluated against.
    pub fn transition(&self, new: ServiceStateKind) -> Result<Transition> {
        let mut raw = self.cell.load(Ordering::Acquire);
        loop {
            let current = unpack(raw);
            if !current.kind.can_transition_to(new) {
                return Err(ServiceError::illegal(current.kind, new));
            }

            let generation = next_generation(current.generation);
            match self.cell.compare_exchange_weak(
                raw,
                pack(new, generation),
                Ordering::AcqRel,
                Ordering::Acquire,
            ) {
                Ok(_) => {
                    return Ok(Transition {
                        from: current.kind,
                        to: new,
                        generation,
                    });
                }
                Err(actual) => raw = actual,
            }
        }
    }

    /// Moves to `new` only if nothing has committed since `observed` was
    /// taken and the table allows `observed.kind -> new`.
    ///
    /// All callers racing from the same snapshot contend for one
    /// generation; exactly one of them can win.
    pub fn change_state_from(&self, observed: StateSnapshot, new: ServiceStateKind) -> bool {
        if !observed.kind.can_transition_to(new) {
            return false;
        }
        self.cell
            .compare_exchange(
                pack(observed.kind, observed.generation),
                pack(new, next_generation(observed.generation)),
                Ordering::AcqRel,
                Ordering::Acquire,
            )
            .is_ok()
    }
}

impl fmt::Debug for ServiceState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let snapshot = self.snapshot();
        f.debug_struct("ServiceState")
            .field("name", &self.name)
            .field("kind", &snapshot.kind)
            .field("generation", &snapshot.generation)
            .finish()
    }
}

impl fmt::Display for ServiceState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.kind())
    }
}
