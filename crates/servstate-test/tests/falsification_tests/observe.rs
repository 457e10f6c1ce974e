//! Falsification Tests: Category C - Observation (F121-F130)

use std::sync::Arc;
use std::time::Duration;

use servstate_core::{LifecycleConfig, ServiceManager, ServiceStateKind as K};
use servstate_observe::{HealthReport, ServiceHealth, StateEvent, StateMonitor};
use servstate_test::{drive_to, init_tracing};

/// F121: A monitor never under-reports transitions between polls
#[test]
fn f121_missed_transitions_accounted() {
    let manager = Arc::new(ServiceManager::new("domain0"));
    let mut monitor = StateMonitor::new(Arc::clone(&manager));
    let state = manager.register("durability").unwrap();
    monitor.poll();

    let mut observed = 0;
    for _ in 0..10 {
        drive_to(&state, K::Died).unwrap();
        assert!(state.change_state(K::Initialising));
        for event in monitor.poll() {
            if let StateEvent::Changed { missed, .. } = event {
                observed += missed + 1;
            }
        }
    }

    assert_eq!(observed, state.snapshot().generation);
}

/// F122: Health follows the record through a crash and restart
#[test]
fn f122_health_tracks_restart() {
    let manager = ServiceManager::new("domain0");
    let state = manager.register("networking").unwrap();

    drive_to(&state, K::Operational).unwrap();
    assert!(HealthReport::assess(&manager).all_healthy());

    assert!(state.change_state(K::Died));
    let report = HealthReport::assess(&manager);
    assert_eq!(
        report.get("networking").unwrap().health,
        ServiceHealth::Faulted(K::Died)
    );

    drive_to(&state, K::Operational).unwrap();
    assert_eq!(HealthReport::assess(&manager).faulted_count(), 0);
}

/// F123: Reclaimed services disappear from reports and monitors
#[test]
fn f123_reclaim_visible_to_observers() {
    let manager = Arc::new(ServiceManager::new("domain0"));
    let mut monitor = StateMonitor::new(Arc::clone(&manager));
    let state = manager.register("cmsoap").unwrap();
    monitor.poll();

    drive_to(&state, K::Terminated).unwrap();
    manager.reclaim("cmsoap").unwrap();

    let events = monitor.poll();
    assert_eq!(
        events,
        vec![StateEvent::Reclaimed {
            name: "cmsoap".into(),
            last: K::Terminated,
        }]
    );
    assert!(HealthReport::assess(&manager).entries.is_empty());
}

/// F124: A monitor built from configuration honours its history bound
#[test]
fn f124_configured_history_bound() {
    let config = LifecycleConfig::from_toml_str(
        r#"
        domain = "domain0"
        services = ["a", "b", "c", "d"]

        [monitor]
        history = 3
        "#,
    )
    .unwrap();
    let manager = Arc::new(ServiceManager::from_config(&config).unwrap());
    let mut monitor = StateMonitor::from_config(Arc::clone(&manager), &config.monitor).unwrap();

    assert_eq!(monitor.poll().len(), 4);
    let kept: Vec<_> = monitor.history().map(|e| e.name().to_string()).collect();
    assert_eq!(kept, vec!["b", "c", "d"]);
}

/// F125: A background monitor reports a crash to every subscriber
#[tokio::test]
async fn f125_background_monitor_broadcasts_fault() {
    init_tracing();
    let manager = Arc::new(ServiceManager::new("domain0"));
    let state = manager.register("durability").unwrap();
    drive_to(&state, K::Operational).unwrap();

    let mut monitor = StateMonitor::new(Arc::clone(&manager));
    monitor.poll();
    let handle = monitor.spawn(Duration::from_millis(5)).unwrap();
    let mut first = handle.subscribe();
    let mut second = handle.subscribe();

    assert!(state.change_state(K::Died));

    for rx in [&mut first, &mut second] {
        let event = tokio::time::timeout(Duration::from_secs(5), rx.recv())
            .await
            .unwrap()
            .unwrap();
        assert!(event.is_fault());
        assert_eq!(event.name(), "durability");
    }

    let monitor = handle.stop().await.unwrap();
    assert_eq!(monitor.last_seen("durability").unwrap().kind, K::Died);
}
