mod common;

use common::{hung_service, setup_tracing, RecordingExit};
use proptest::prelude::*;
use sigwait::{
    escalate_on_signal, ChannelSignals, Coordinator, FnService, Outcome, Signal, StopWaitable,
    FORCE_EXIT_CODE, TERMINATION_SIGNALS,
};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

#[test]
fn graceful_stop_after_one_signal() {
    setup_tracing();
    let (tx, source) = ChannelSignals::new();
    let (exit, codes) = RecordingExit::new();
    let coordinator = Coordinator::new(source, exit);

    let cleaned_up = Arc::new(AtomicBool::new(false));
    let cleaned_up_clone = cleaned_up.clone();
    let service = Arc::new(FnService::new("worker", move || {
        thread::sleep(Duration::from_millis(10));
        cleaned_up_clone.store(true, Ordering::SeqCst);
    }));

    let start = Instant::now();
    tx.send(Signal::Interrupt).unwrap();
    coordinator.run_until_signal(service).unwrap();
    let elapsed = start.elapsed();

    assert!(cleaned_up.load(Ordering::SeqCst));
    assert!(elapsed >= Duration::from_millis(10));
    assert!(elapsed < Duration::from_secs(1));
    assert!(codes.try_recv().is_err());
}

#[test]
fn second_signal_forces_exit() {
    setup_tracing();
    let (tx, source) = ChannelSignals::new();
    let (exit, codes) = RecordingExit::new();
    let coordinator = Coordinator::new(source, exit);
    let service = Arc::new(hung_service("hung"));

    let returned = Arc::new(AtomicBool::new(false));
    let returned_clone = returned.clone();
    let run_service = service.clone();
    thread::spawn(move || {
        let _ = coordinator.run_until_signal(run_service);
        returned_clone.store(true, Ordering::SeqCst);
    });

    tx.send(Signal::Interrupt).unwrap();
    thread::sleep(Duration::from_millis(5));
    let start = Instant::now();
    tx.send(Signal::Interrupt).unwrap();

    let code = codes.recv_timeout(Duration::from_secs(1)).unwrap();
    assert_eq!(code, FORCE_EXIT_CODE);
    assert!(start.elapsed() < Duration::from_secs(1));

    thread::sleep(Duration::from_millis(20));
    assert!(!returned.load(Ordering::SeqCst));
    assert!(!service.wait().is_complete());
}

#[test]
fn external_stop_without_signal() {
    setup_tracing();
    let (_tx, source) = ChannelSignals::new();
    let (exit, codes) = RecordingExit::new();
    let coordinator = Coordinator::new(source, exit);
    let service = Arc::new(FnService::new("external", || {
        panic!("stop must not be requested without a signal")
    }));

    let stopper = service.clone();
    thread::spawn(move || {
        thread::sleep(Duration::from_millis(10));
        stopper.mark_stopped();
    });

    coordinator.run_until_signal(service.clone()).unwrap();
    assert!(service.wait().is_complete());
    assert!(codes.try_recv().is_err());
}

#[test]
fn three_signals_behave_like_two() {
    setup_tracing();
    let (tx, source) = ChannelSignals::new();
    let (exit, codes) = RecordingExit::new();
    let coordinator = Coordinator::new(source, exit);
    let service = Arc::new(hung_service("hung"));

    tx.send(Signal::Terminate).unwrap();
    tx.send(Signal::Hangup).unwrap();
    tx.send(Signal::Quit).unwrap();
    thread::spawn(move || {
        let _ = coordinator.run_until_signal(service);
    });

    assert_eq!(
        codes.recv_timeout(Duration::from_secs(1)).unwrap(),
        FORCE_EXIT_CODE
    );
    assert!(codes.recv_timeout(Duration::from_millis(50)).is_err());
}

#[test]
fn signal_after_completion_is_ignored() {
    setup_tracing();
    let (tx, source) = ChannelSignals::new();
    let (exit, codes) = RecordingExit::new();
    let coordinator = Coordinator::new(source, exit);
    let service = Arc::new(FnService::new("quick", || {}));

    tx.send(Signal::Interrupt).unwrap();
    coordinator.run_until_signal(service).unwrap();

    // Arrives after the graceful path was already taken
    tx.send(Signal::Interrupt).unwrap();
    assert!(codes.recv_timeout(Duration::from_millis(50)).is_err());
}

#[test]
fn coordinator_reused_after_external_stop() {
    setup_tracing();
    let (tx, source) = ChannelSignals::new();
    let (exit, codes) = RecordingExit::new();
    let coordinator = Coordinator::new(source, exit);

    // First run ends without any signal
    let first = Arc::new(FnService::new("first", || {
        panic!("first service must not be stopped")
    }));
    first.mark_stopped();
    coordinator.run_until_signal(first).unwrap();

    // The next signal belongs to the second run
    let cleaned_up = Arc::new(AtomicBool::new(false));
    let cleaned_up_clone = cleaned_up.clone();
    let second = Arc::new(FnService::new("second", move || {
        cleaned_up_clone.store(true, Ordering::SeqCst);
    }));
    let (returned_tx, returned) = crossbeam_channel::bounded(1);
    thread::spawn(move || {
        let result = coordinator.run_until_signal(second);
        let _ = returned_tx.send(result.is_ok());
    });

    tx.send(Signal::Interrupt).unwrap();
    assert_eq!(returned.recv_timeout(Duration::from_secs(1)), Ok(true));
    assert!(cleaned_up.load(Ordering::SeqCst));
    assert!(codes.try_recv().is_err());
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn signal_sequences_before_completion(
        picks in prop::collection::vec(0..TERMINATION_SIGNALS.len(), 1..5)
    ) {
        let signals: Vec<Signal> = picks.iter().map(|&i| TERMINATION_SIGNALS[i]).collect();
        let (tx, rx) = crossbeam_channel::unbounded();
        for signal in &signals {
            tx.send(*signal).unwrap();
        }
        let (exit, codes) = RecordingExit::new();

        if signals.len() == 1 {
            let service = FnService::new("quick", || {});
            prop_assert_eq!(escalate_on_signal(&service, &rx, &exit), Outcome::Stopped);
            prop_assert!(service.wait().wait_timeout(Duration::from_secs(1)));
            prop_assert!(codes.try_recv().is_err());
        } else {
            thread::spawn(move || {
                let service = hung_service("hung");
                escalate_on_signal(&service, &rx, &exit);
            });
            prop_assert_eq!(
                codes.recv_timeout(Duration::from_secs(1)).unwrap(),
                FORCE_EXIT_CODE
            );
        }
    }
}
