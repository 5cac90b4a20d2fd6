//! Basic usage example for the windowgate crate.

use std::sync::Arc;
use std::thread;
use std::time::Duration;
use windowgate::{ManualClock, Responder, ResponderBuilder, ResponderConfig};

fn main() {
    println!("=== Basic Responder Example ===\n");

    // Example 1: One winner per window
    simple_example();

    println!("{}", "\n".to_owned() + "=".repeat(50).as_str() + "\n");

    // Example 2: Deterministic time with a manual clock
    manual_clock_example();

    println!("{}", "\n".to_owned() + "=".repeat(50).as_str() + "\n");

    // Example 3: Many threads, still one winner
    concurrent_example();

    println!("{}", "\n".to_owned() + "=".repeat(50).as_str() + "\n");

    // Example 4: Real-time rollover and manual reset
    rollover_example();
}

fn simple_example() {
    println!("1. One Winner Per Window:");

    let responder = Responder::with_config(ResponderConfig::per_seconds(30));
    println!("   Created responder with a 30 second window");

    for i in 1..=5 {
        let response = responder.respond();
        if response.success {
            println!("   Request {} - ✅ true", i);
        } else {
            println!("   Request {} - ❌ false", i);
        }
    }

    println!("\n{}", responder.stats());
}

fn manual_clock_example() {
    println!("2. Manual Clock:");

    let clock = ManualClock::new(0);
    let responder = ResponderBuilder::new()
        .window_ms(30_000)
        .clock(clock.clone())
        .build();

    for t in [0, 5, 10, 31_000] {
        clock.set_ms(t);
        let response = responder.respond();
        println!(
            "   t={:>6}ms -> {:<5} (total: {}, false: {})",
            t, response.success, response.stats.total_requests, response.stats.false_responses
        );
    }
}

fn concurrent_example() {
    println!("3. Concurrent Callers:");

    let responder = Arc::new(Responder::new());
    let handles: Vec<_> = (0..8)
        .map(|id| {
            let responder = responder.clone();
            thread::spawn(move || {
                let wins = (0..250).filter(|_| responder.respond().success).count();
                (id, wins)
            })
        })
        .collect();

    for handle in handles {
        let (id, wins) = handle.join().unwrap();
        if wins > 0 {
            println!("   Thread {} won the window", id);
        }
    }

    let stats = responder.stats();
    println!(
        "   {} requests, {} true, {} false",
        stats.total_requests, stats.true_responses, stats.false_responses
    );
}

fn rollover_example() {
    println!("4. Rollover and Manual Reset:");

    let responder = Responder::with_config(ResponderConfig::new(200));
    println!("   first call:  {}", responder.respond().success);
    println!("   second call: {}", responder.respond().success);
    println!(
        "   next window in ~{}ms",
        responder.time_until_next_window().as_millis()
    );

    thread::sleep(Duration::from_millis(210));
    println!("   after 210ms: {}", responder.respond().success);

    let stats = responder.reset_manually();
    println!("   manual reset -> total {}", stats.total_requests);
    println!("   after reset: {}", responder.respond().success);
}
