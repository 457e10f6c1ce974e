//! Falsification Tests: Category A - Lifecycle scenarios (F101-F110)

use std::sync::Arc;
use std::thread;

use proptest::prelude::*;
use servstate_core::{
    LifecycleConfig, ServiceError, ServiceManager, ServiceState, ServiceStateKind as K,
};
use servstate_test::{drive_to, init_tracing, path_between};

/// F101: Startup followed by an illegal restart request is rejected
#[test]
fn f101_startup_then_illegal_reinit() {
    init_tracing();
    let state = ServiceState::new("durability").unwrap();
    assert_eq!(state.kind(), K::None);

    assert!(state.change_state(K::Initialising));
    assert_eq!(state.kind(), K::Initialising);
    assert!(state.change_state(K::Operational));

    assert!(!state.change_state(K::Initialising));
    assert_eq!(state.kind(), K::Operational);
}

/// F102: TERMINATED refuses DIED and keeps its name
#[test]
fn f102_terminated_refuses_died() {
    let state = ServiceState::new("networking").unwrap();
    for step in [K::Initialising, K::Terminating, K::Terminated] {
        assert!(state.change_state(step));
    }

    assert!(!state.change_state(K::Died));
    assert_eq!(state.kind(), K::Terminated);
    assert_eq!(state.name(), "networking");
}

/// F103: The rejection names the kind it was evaluated against
#[test]
fn f103_rejection_reports_current_kind() {
    let state = ServiceState::new("cmsoap").unwrap();
    drive_to(&state, K::Operational).unwrap();

    let err = state.transition(K::None).unwrap_err();
    assert!(matches!(
        err,
        ServiceError::IllegalTransition {
            from: K::Operational,
            to: K::None
        }
    ));
}

/// F104: A died service can be restarted through INITIALISING
#[test]
fn f104_restart_after_death() {
    let manager = ServiceManager::new("domain0");
    let state = manager.register("durability").unwrap();
    drive_to(&state, K::Died).unwrap();

    assert!(manager.change_state("durability", K::Initialising).unwrap());
    assert!(manager.change_state("durability", K::Operational).unwrap());
    assert_eq!(state.snapshot().generation, 4);
}

/// F105: A service thread and the manager see the same record
#[test]
fn f105_service_thread_shares_record() {
    let manager = Arc::new(ServiceManager::new("domain0"));
    let record = manager.register("durability").unwrap();

    let service = {
        let record = Arc::clone(&record);
        thread::spawn(move || {
            drive_to(&record, K::Operational).unwrap();
            drive_to(&record, K::Terminated).unwrap();
        })
    };
    service.join().unwrap();

    assert_eq!(manager.kind_of("durability").unwrap(), K::Terminated);
    let reclaimed = manager.reclaim("durability").unwrap();
    assert!(Arc::ptr_eq(&reclaimed, &record));
    assert_eq!(record.kind(), K::Terminated);
}

/// F106: A domain loaded from TOML can run every service to completion
#[test]
fn f106_configured_domain_full_lifecycle() {
    let config = LifecycleConfig::from_toml_str(
        r#"
        domain = "ospl_sp_domain"
        services = ["durability", "networking"]

        [monitor]
        poll_interval = "50ms"
        history = 16
        "#,
    )
    .unwrap();
    let manager = ServiceManager::from_config(&config).unwrap();

    for name in manager.names() {
        let state = manager.get(&name).unwrap();
        drive_to(&state, K::Terminated).unwrap();
    }

    assert_eq!(manager.services_in(K::Terminated).len(), 2);
    let json = manager.to_json().unwrap();
    assert!(json.contains("TERMINATED"));
}

/// F107: Unknown services are reported, never created implicitly
#[test]
fn f107_unknown_service_not_created() {
    let manager = ServiceManager::new("domain0");
    let err = manager.change_state("ghost", K::Initialising).unwrap_err();
    assert!(matches!(err, ServiceError::NotFound(_)));
    assert_eq!(manager.count(), 0);
}

proptest! {
    /// F108: Any reachable kind is reached with exactly one generation per step
    #[test]
    fn f108_drive_counts_generations(from in 0u8..7, to in 0u8..7) {
        let from = K::from_u8(from).unwrap();
        let to = K::from_u8(to).unwrap();
        let state = ServiceState::new("svc").unwrap();
        drive_to(&state, from).unwrap();
        let base = state.snapshot().generation;

        match path_between(from, to) {
            Some(path) => {
                drive_to(&state, to).unwrap();
                prop_assert_eq!(state.kind(), to);
                prop_assert_eq!(state.snapshot().generation - base, path.len() as u64);
            }
            None => {
                prop_assert!(drive_to(&state, to).is_err());
                prop_assert_eq!(state.snapshot().generation, base);
            }
        }
    }
}
