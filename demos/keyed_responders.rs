use std::sync::Arc;
use windowgate::{ResponderConfig, ResponderManager};

fn main() {
    let manager = Arc::new(
        ResponderManager::new(ResponderConfig::per_seconds(10)).with_cleanup_settings(1_000, 15_000),
    );
    let (handle, stop_tx) = manager
        .clone()
        .start_stoppable_cleanup_thread()
        .expect("spawn cleanup thread");

    for tenant in ["alpha", "beta", "alpha", "gamma", "beta"] {
        if let Some(response) = manager.respond(tenant) {
            println!(
                "{:<6} -> {:<5} ({} requests this window)",
                tenant, response.success, response.stats.total_requests
            );
        }
    }

    println!("{:?}", manager.manager_stats());

    stop_tx.send(()).unwrap();
    handle.join().unwrap();
}
