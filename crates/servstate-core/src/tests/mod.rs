//! Test infrastructure for falsification testing.
//!
//! Each test states a claim about the lifecycle record and tries to refute
//! it. Tests are grouped by category:
//!
//! | Category | ID Range | Description |
//! |----------|----------|-------------|
//! | A | F001-F010 | Transition legality |
//! | B | F011-F020 | Concurrency and visibility |
//! | C | F021-F030 | Identity and registry |


use std::sync::Arc;

use crate::state::ServiceState;
use crate::types::ServiceStateKind;

/// Shortest legal path from `NONE` to each kind.
pub fn path_to(kind: ServiceStateKind) -> &'static [ServiceStateKind] {
    use ServiceStateKind as K;
    match kind {
        K::None => &[],
        K::Initialising => &[K::Initialising],
        K::Operational => &[K::Initialising, K::Operational],
        K::IncompatibleConfiguration => &[K::Initialising, K::IncompatibleConfiguration],
        K::Terminating => &[K::Initialising, K::Terminating],
        K::Terminated => &[K::Initialising, K::Terminating, K::Terminated],
        K::Died => &[K::Initialising, K::Died],
    }
}

/// Creates a shared record driven to `kind` along [`path_to`].
pub fn state_in(name: &str, kind: ServiceStateKind) -> Arc<ServiceState> {
    let state = ServiceState::shared(name).unwrap();
    for step in path_to(kind) {
        assert!(state.change_state(*step), "setup step {step} failed");
    }
    assert_eq!(state.kind(), kind);
    state
}
