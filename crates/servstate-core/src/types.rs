//! Core types for service lifecycle tracking.
//!
//! The legality table lives here as one bitmask per source state, so a
//! transition check is a shift and a mask with no allocation or locking.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ServiceError;

/// Lifecycle state of a service.
///
/// Transitions follow a fixed legality table (row = current, column = next):
/// ```text
///                   NONE  INIT  OPER  INCOMPAT  TERMING  TERMED  DIED
/// NONE               x     x
/// INITIALISING             x     x      x         x               x
/// OPERATIONAL                    x      x         x               x
/// INCOMPATIBLE                          x                         x
/// TERMINATING                                     x        x      x
/// TERMINATED
/// DIED                     x                                      x
/// ```
/// Every kind except `Terminated` may transition to itself. `Terminated` is
/// absorbing: nothing leaves it, not even a self-transition.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[repr(u8)]
pub enum ServiceStateKind {
    /// Registered but not yet started.
    #[default]
    None = 0,
    /// Starting up.
    Initialising = 1,
    /// Running and reliable.
    Operational = 2,
    /// The service cannot honor its configuration.
    IncompatibleConfiguration = 3,
    /// Shutting down.
    Terminating = 4,
    /// Shut down for good.
    Terminated = 5,
    /// Crashed; may be reinitialised.
    Died = 6,
}

/// Legal successors per source state, indexed by discriminant.
/// Bit `n` set means the kind with discriminant `n` is a legal target.
const SUCCESSORS: [u8; 7] = [
    // None: None, Initialising
    0b000_0011,
    // Initialising: Initialising, Operational, IncompatibleConfiguration,
    // Terminating, Died
    0b101_1110,
    // Operational: Operational, IncompatibleConfiguration, Terminating, Died
    0b101_1100,
    // IncompatibleConfiguration: IncompatibleConfiguration, Died
    0b100_1000,
    // Terminating: Terminating, Terminated, Died
    0b111_0000,
    // Terminated: nothing
    0b000_0000,
    // Died: Initialising, Died
    0b100_0010,
];

impl ServiceStateKind {
    /// All kinds in discriminant order.
    pub const ALL: [Self; 7] = [
        Self::None,
        Self::Initialising,
        Self::Operational,
        Self::IncompatibleConfiguration,
        Self::Terminating,
        Self::Terminated,
        Self::Died,
    ];

    /// Returns the compact encoding used by the atomic state cell.
    #[must_use]
    pub const fn as_u8(self) -> u8 {
        self as u8
    }

    /// Decodes a kind from its compact encoding.
    #[must_use]
    pub const fn from_u8(raw: u8) -> Option<Self> {
        match raw {
            0 => Some(Self::None),
            1 => Some(Self::Initialising),
            2 => Some(Self::Operational),
            3 => Some(Self::IncompatibleConfiguration),
            4 => Some(Self::Terminating),
            5 => Some(Self::Terminated),
            6 => Some(Self::Died),
            _ => None,
        }
    }

    /// Returns true if the table allows `self -> next`.
    #[must_use]
    pub const fn can_transition_to(self, next: Self) -> bool {
        SUCCESSORS[self as usize] & (1 << next as u8) != 0
    }

    /// Returns every legal target from this kind, in discriminant order.
    pub fn successors(self) -> impl Iterator<Item = Self> {
        Self::ALL
            .into_iter()
            .filter(move |next| self.can_transition_to(*next))
    }

    /// Returns true only for `Terminated`.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Terminated)
    }

    /// Returns true if the service has crashed or rejected its configuration.
    #[must_use]
    pub const fn is_faulted(self) -> bool {
        matches!(self, Self::Died | Self::IncompatibleConfiguration)
    }

    /// Returns true while the service is executing (starting, running, or
    /// stopping).
    #[must_use]
    pub const fn is_alive(self) -> bool {
        matches!(
            self,
            Self::Initialising | Self::Operational | Self::Terminating
        )
    }

    /// Returns the kernel spelling of this kind.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::None => "NONE",
            Self::Initialising => "INITIALISING",
            Self::Operational => "OPERATIONAL",
            Self::IncompatibleConfiguration => "INCOMPATIBLE_CONFIGURATION",
            Self::Terminating => "TERMINATING",
            Self::Terminated => "TERMINATED",
            Self::Died => "DIED",
        }
    }
}

impl fmt::Display for ServiceStateKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ServiceStateKind {
    type Err = ServiceError;

    /// Parses the kernel spelling, case-insensitively, with or without a
    /// `STATE_` prefix.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let upper = s.trim().to_ascii_uppercase();
        let bare = upper.strip_prefix("STATE_").unwrap_or(upper.as_str());
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == bare)
            .ok_or_else(|| ServiceError::UnknownKind(s.to_string()))
    }
}

/// Consistent view of a state cell at one instant.
///
/// `generation` counts committed transitions, self-transitions included, so
/// two snapshots with equal generations describe the same point in the
/// service's history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StateSnapshot {
    /// State kind at the time of the read.
    pub kind: ServiceStateKind,
    /// Number of transitions committed before the read.
    pub generation: u64,
}

/// A committed transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transition {
    /// Kind the transition started from.
    pub from: ServiceStateKind,
    /// Kind that was committed.
    pub to: ServiceStateKind,
    /// Generation after the commit.
    pub generation: u64,
}

impl Transition {
    /// Returns true if the transition did not change the kind.
    #[must_use]
    pub fn is_self_transition(&self) -> bool {
        self.from == self.to
    }
}
