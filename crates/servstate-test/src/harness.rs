//! Lifecycle driver and contention harness.
//!
//! [`drive_to`] walks a record along the shortest legal path to a target
//! kind. [`ContentionHarness`] releases one thread per proposed target at
//! the same instant, round after round, and reports who won.

use std::collections::{BTreeSet, VecDeque};
use std::sync::Barrier;
use std::thread;

use servstate_core::{ServiceState, ServiceStateKind, StateSnapshot, Transition};

use crate::error::{Result, TestError};

// =============================================================================
// Lifecycle driver
// =============================================================================

/// Returns the shortest sequence of kinds leading from `from` to `to`,
/// excluding `from` itself.
///
/// `Some(vec![])` means the record is already there.
#[must_use]
pub fn path_between(
    from: ServiceStateKind,
    to: ServiceStateKind,
) -> Option<Vec<ServiceStateKind>> {
    if from == to {
        return Some(Vec::new());
    }

    let mut parent: [Option<ServiceStateKind>; ServiceStateKind::ALL.len()] =
        [None; ServiceStateKind::ALL.len()];
    let mut queue = VecDeque::from([from]);

    while let Some(kind) = queue.pop_front() {
        for next in kind.successors() {
            if next == from || parent[next as usize].is_some() {
                continue;
            }
            parent[next as usize] = Some(kind);
            if next == to {
                let mut path = vec![to];
                let mut cursor = kind;
                while cursor != from {
                    path.push(cursor);
                    cursor = parent[cursor as usize]?;
                }
                path.reverse();
                return Some(path);
            }
            queue.push_back(next);
        }
    }

    None
}

/// Moves `state` to `target` along the shortest legal path.
///
/// # Errors
/// Returns `TestError::Unreachable` if no path exists, or a service error
/// if another thread moved the record while it was being driven.
pub fn drive_to(state: &ServiceState, target: ServiceStateKind) -> Result<Vec<Transition>> {
    let from = state.kind();
    let path = path_between(from, target).ok_or(TestError::Unreachable { from, to: target })?;

    let mut applied = Vec::with_capacity(path.len());
    for kind in path {
        applied.push(state.transition(kind)?);
    }
    Ok(applied)
}

// =============================================================================
// Contention harness
// =============================================================================

/// How contenders submit their request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RaceMode {
    /// `change_state`: every legal request eventually commits in some order.
    Linearized,
    /// `change_state_from` with the round's starting snapshot: one winner.
    Arbitrated,
}

/// What happened in one round.
#[derive(Debug, Clone)]
pub struct RoundOutcome {
    /// State every contender started from.
    pub start: StateSnapshot,
    /// Per-contender result, in target order.
    pub accepted: Vec<bool>,
    /// State after every contender returned.
    pub end: StateSnapshot,
}

impl RoundOutcome {
    /// Returns the number of accepted requests.
    #[must_use]
    pub fn winners(&self) -> usize {
        self.accepted.iter().filter(|won| **won).count()
    }

    /// Checks the round against `targets`: the generation advanced once
    /// per accepted request, and the record ends in an accepted target, or
    /// where it started when nobody won.
    ///
    /// # Errors
    /// Returns `TestError::Assertion` describing the first violation.
    pub fn verify(&self, targets: &[ServiceStateKind]) -> Result<()> {
        if self.accepted.len() != targets.len() {
            return Err(TestError::assertion(format!(
                "{} results for {} contenders",
                self.accepted.len(),
                targets.len()
            )));
        }

        let commits = self.winners() as u64;
        if self.end.generation != self.start.generation.wrapping_add(commits) {
            return Err(TestError::assertion(format!(
                "generation moved from {} to {} with {commits} accepted requests",
                self.start.generation, self.end.generation
            )));
        }

        let landed = if commits == 0 {
            self.end.kind == self.start.kind
        } else {
            targets
                .iter()
                .zip(&self.accepted)
                .any(|(target, won)| *won && *target == self.end.kind)
        };
        if !landed {
            return Err(TestError::assertion(format!(
                "round ended in {} which no accepted request proposed",
                self.end.kind
            )));
        }
        Ok(())
    }
}

/// Results of all rounds of a race.
#[derive(Debug, Clone)]
pub struct ContentionReport {
    /// Proposed targets, one per contender.
    pub targets: Vec<ServiceStateKind>,
    /// Submission mode.
    pub mode: RaceMode,
    /// One outcome per round.
    pub rounds: Vec<RoundOutcome>,
}

impl ContentionReport {
    /// Returns the largest number of winners seen in a single round.
    #[must_use]
    pub fn max_winners(&self) -> usize {
        self.rounds.iter().map(RoundOutcome::winners).max().unwrap_or(0)
    }

    /// Returns the smallest number of winners seen in a single round.
    #[must_use]
    pub fn min_winners(&self) -> usize {
        self.rounds.iter().map(RoundOutcome::winners).min().unwrap_or(0)
    }

    /// Returns every kind a round ended in.
    #[must_use]
    pub fn final_kinds(&self) -> BTreeSet<ServiceStateKind> {
        self.rounds.iter().map(|r| r.end.kind).collect()
    }

    /// Returns how many rounds each contender won, in target order.
    #[must_use]
    pub fn win_counts(&self) -> Vec<usize> {
        let mut counts = vec![0; self.targets.len()];
        for round in &self.rounds {
            for (count, won) in counts.iter_mut().zip(&round.accepted) {
                *count += usize::from(*won);
            }
        }
        counts
    }
}

/// Races concurrent transition requests against fresh records.
#[derive(Debug, Clone)]
pub struct ContentionHarness {
    start: ServiceStateKind,
    rounds: usize,
}

impl ContentionHarness {
    /// Creates a harness whose rounds start from `start`.
    #[must_use]
    pub const fn new(start: ServiceStateKind) -> Self {
        Self { start, rounds: 100 }
    }

    /// Sets the number of rounds.
    #[must_use]
    pub const fn with_rounds(mut self, rounds: usize) -> Self {
        self.rounds = rounds;
        self
    }

    /// Runs every round, one thread per target.
    ///
    /// # Errors
    /// Returns an error if `targets` is empty, the start kind is
    /// unreachable, a contender thread panics, or a round fails
    /// [`RoundOutcome::verify`].
    pub fn race(&self, targets: &[ServiceStateKind], mode: RaceMode) -> Result<ContentionReport> {
        if targets.is_empty() {
            return Err(TestError::harness("race needs at least one contender"));
        }

        let mut rounds = Vec::with_capacity(self.rounds);
        for _ in 0..self.rounds {
            rounds.push(self.round(targets, mode)?);
        }

        let report = ContentionReport {
            targets: targets.to_vec(),
            mode,
            rounds,
        };
        tracing::debug!(
            start = %self.start,
            ?mode,
            rounds = self.rounds,
            max_winners = report.max_winners(),
            "contention race finished"
        );
        Ok(report)
    }

    fn round(&self, targets: &[ServiceStateKind], mode: RaceMode) -> Result<RoundOutcome> {
        let state = ServiceState::new("contended")?;
        drive_to(&state, self.start)?;
        let start = state.snapshot();
        let barrier = Barrier::new(targets.len());

        let accepted = thread::scope(|scope| {
            let contenders: Vec<_> = targets
                .iter()
                .map(|&target| {
                    let state = &state;
                    let barrier = &barrier;
                    scope.spawn(move || {
                        barrier.wait();
                        match mode {
                            RaceMode::Linearized => state.change_state(target),
                            RaceMode::Arbitrated => state.change_state_from(start, target),
                        }
                    })
                })
                .collect();

            contenders
                .into_iter()
                .map(|c| {
                    c.join()
                        .map_err(|_| TestError::harness("contender thread panicked"))
                })
                .collect::<Result<Vec<bool>>>()
        })?;

        let outcome = RoundOutcome {
            start,
            accepted,
            end: state.snapshot(),
        };
        outcome.verify(targets)?;
        Ok(outcome)
    }
}
