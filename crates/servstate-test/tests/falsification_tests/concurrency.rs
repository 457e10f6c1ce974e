//! Falsification Tests: Category B - Contention (F111-F120)

use std::sync::{Arc, Barrier};
use std::thread;

use servstate_core::{ServiceManager, ServiceStateKind as K};
use servstate_test::{ContentionHarness, RaceMode, drive_to};

/// F111: Shutdown racing death from one snapshot has exactly one winner
#[test]
fn f111_shutdown_vs_death_one_winner() {
    let report = ContentionHarness::new(K::Operational)
        .with_rounds(200)
        .race(&[K::Terminating, K::Died], RaceMode::Arbitrated)
        .unwrap();

    assert_eq!(report.max_winners(), 1);
    assert_eq!(report.min_winners(), 1);
    for round in &report.rounds {
        let winner = if round.accepted[0] {
            K::Terminating
        } else {
            K::Died
        };
        assert_eq!(round.end.kind, winner);
    }
}

/// F112: Unguarded shutdown racing death always ends in DIED
#[test]
fn f112_shutdown_vs_death_linearized() {
    let report = ContentionHarness::new(K::Operational)
        .with_rounds(200)
        .race(&[K::Terminating, K::Died], RaceMode::Linearized)
        .unwrap();

    let finals: Vec<_> = report.final_kinds().into_iter().collect();
    assert_eq!(finals, vec![K::Died]);
    for round in &report.rounds {
        assert!(round.accepted[1], "DIED is legal from both kinds");
        let commits = round.winners() as u64;
        assert_eq!(round.end.generation, round.start.generation + commits);
    }
}

/// F113: Illegal contenders never win, guarded or not
#[test]
fn f113_illegal_contenders_never_win() {
    let targets = [K::None, K::Terminated, K::Operational, K::Initialising];
    for mode in [RaceMode::Linearized, RaceMode::Arbitrated] {
        let report = ContentionHarness::new(K::Initialising)
            .with_rounds(50)
            .race(&targets, mode)
            .unwrap();
        let wins = report.win_counts();
        assert_eq!(wins[0], 0, "NONE won under {mode:?}");
        assert_eq!(wins[1], 0, "TERMINATED won under {mode:?}");
    }
}

/// F114: Nothing moves a TERMINATED record, however many contenders
#[test]
fn f114_terminated_frozen() {
    for mode in [RaceMode::Linearized, RaceMode::Arbitrated] {
        let report = ContentionHarness::new(K::Terminated)
            .with_rounds(20)
            .race(&K::ALL, mode)
            .unwrap();
        assert_eq!(report.max_winners(), 0);
        for round in &report.rounds {
            assert_eq!(round.end, round.start);
        }
    }
}

/// F115: Arbitrated rounds advance the generation by exactly one
#[test]
fn f115_arbitrated_generation_step() {
    let report = ContentionHarness::new(K::Initialising)
        .with_rounds(100)
        .race(&K::ALL, RaceMode::Arbitrated)
        .unwrap();
    for round in &report.rounds {
        assert_eq!(round.winners(), 1);
        assert_eq!(round.end.generation, round.start.generation + 1);
    }
}

/// F116: Concurrent manager traffic on distinct services does not interfere
#[test]
fn f116_independent_services() {
    const SERVICES: usize = 8;
    let manager = Arc::new(ServiceManager::new("domain0"));
    let barrier = Arc::new(Barrier::new(SERVICES));

    let handles: Vec<_> = (0..SERVICES)
        .map(|i| {
            let manager = Arc::clone(&manager);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                let name = format!("svc-{i}");
                let state = manager.register(&name).unwrap();
                barrier.wait();
                for _ in 0..100 {
                    drive_to(&state, K::Died).unwrap();
                    assert!(manager.change_state(&name, K::Initialising).unwrap());
                }
                drive_to(&state, K::Terminated).unwrap();
            })
        })
        .collect();

    for h in handles {
        h.join().unwrap();
    }

    assert_eq!(manager.services_in(K::Terminated).len(), SERVICES);
    for snap in manager.snapshot() {
        // NONE->INIT, then 100 x (->DIED ->INIT), then ->TERMINATING ->TERMINATED.
        assert_eq!(snap.generation, 1 + 200 + 2, "{}", snap.name);
    }
}
