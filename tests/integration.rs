use std::sync::{Arc, Barrier};
use std::thread;
use std::time::{Duration, Instant};
use windowgate::{Clock, ManualClock, Responder, ResponderConfig, ResponderManager, WindowStats};

fn manual_responder(window_ms: u64) -> (Arc<Responder>, ManualClock) {
    let clock = ManualClock::new(0);
    let responder = Responder::with_clock(ResponderConfig::new(window_ms), clock.clone());
    (Arc::new(responder), clock)
}

#[test]
fn test_single_success_per_window() {
    let (responder, clock) = manual_responder(30_000);

    let results: Vec<bool> = (0..50)
        .map(|i| {
            clock.set_ms(i * 500);
            responder.respond().success
        })
        .collect();

    assert!(results[0]);
    assert_eq!(results.iter().filter(|won| **won).count(), 1);
}

#[test]
fn test_rollover_resets_counters() {
    let (responder, clock) = manual_responder(30_000);
    for _ in 0..5 {
        responder.respond();
    }

    clock.set_ms(30_000);
    let response = responder.respond();
    assert!(response.success);
    assert_eq!(response.stats.total_requests, 1);
    assert_eq!(response.stats.false_responses, 0);
    assert_eq!(response.stats.window_start_ms, 30_000);
}

#[test]
fn test_counters_consistent_over_many_windows() {
    let (responder, clock) = manual_responder(100);
    let mut wins = 0;

    for step in 0..2_000u64 {
        clock.set_ms(step * 3);
        let response = responder.respond();
        if response.success {
            wins += 1;
        }
        assert!(response.stats.is_consistent());
    }

    // 6000ms of traffic every 3ms with a 100ms window: windows start at
    // 0, 102, 204, ... (the first call at or after expiry).
    assert_eq!(wins, 59);
}

#[test]
fn test_stats_reads_are_pure() {
    let (responder, clock) = manual_responder(1_000);
    responder.respond();
    responder.respond();

    let before = responder.stats();
    clock.set_ms(50_000);
    for _ in 0..100 {
        assert_eq!(responder.stats(), before);
    }

    // The expired window only rolls on the next respond().
    let response = responder.respond();
    assert!(response.success);
    assert_eq!(response.stats.window_start_ms, 50_000);
}

#[test]
fn test_manual_reset_from_any_state() {
    let (responder, clock) = manual_responder(30_000);

    for prior_calls in [0, 1, 7] {
        for _ in 0..prior_calls {
            responder.respond();
        }
        clock.advance_ms(3);
        let now = clock.now_ms();
        assert_eq!(responder.reset_manually(), WindowStats::empty(now));
        assert!(responder.respond().success);
    }
}

#[test]
fn test_concurrent_burst_across_real_time_window() {
    let started = Instant::now();
    let responder = Arc::new(Responder::with_config(ResponderConfig::new(150)));
    let barrier = Arc::new(Barrier::new(8));

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let responder = responder.clone();
            let barrier = barrier.clone();
            thread::spawn(move || {
                barrier.wait();
                let mut wins = 0;
                for _ in 0..40 {
                    if responder.respond().success {
                        wins += 1;
                    }
                    thread::sleep(Duration::from_millis(1));
                }
                wins
            })
        })
        .collect();

    let wins: u64 = handles.into_iter().map(|h| h.join().unwrap()).sum();
    let elapsed_ms = started.elapsed().as_millis() as u64;

    // At most one winner per 150ms window. The extra millisecond covers the
    // clock's truncation to whole milliseconds.
    assert!(wins >= 1);
    assert!(
        wins <= (elapsed_ms + 1) / 150 + 1,
        "{} wins in {}ms with a 150ms window",
        wins,
        elapsed_ms
    );

    let stats = responder.stats();
    assert!(stats.is_consistent());
    assert_eq!(stats.true_responses, 1);
}

#[test]
fn test_manager_lifecycle() {
    let clock = ManualClock::new(0);
    let manager = Arc::new(
        ResponderManager::with_clock(ResponderConfig::new(100), clock.clone())
            .with_cleanup_settings(20, 100),
    );

    for i in 0..20 {
        assert!(manager.respond(&format!("tenant-{}", i)).unwrap().success);
    }
    assert_eq!(manager.active_keys(), 20);

    // Keep five tenants busy while the rest go idle.
    clock.set_ms(50);
    for i in 0..5 {
        assert!(!manager.respond(&format!("tenant-{}", i)).unwrap().success);
    }

    // Every window has expired; only the untouched tenants are idle.
    clock.set_ms(120);

    let (handle, stop_tx) = manager.clone().start_stoppable_cleanup_thread().unwrap();

    let mut remaining = manager.active_keys();
    for _ in 0..100 {
        if remaining == 5 {
            break;
        }
        thread::sleep(Duration::from_millis(10));
        remaining = manager.active_keys();
    }
    assert_eq!(remaining, 5);

    stop_tx.send(()).unwrap();
    handle.join().unwrap();

    let stats = manager.manager_stats();
    assert_eq!(stats.total_created, 20);
    assert_eq!(stats.total_cleaned, 15);
}
