//! Example demonstrating graceful shutdown via signal handling
//!
//! A worker thread prints progress until the process receives SIGINT,
//! SIGHUP, SIGTERM or SIGQUIT. Cleanup then takes a couple of seconds.
//! Press Ctrl-C a second time during cleanup to force quit.
//!
//! Run with: cargo run --example graceful_shutdown

use sigwait::FnService;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

fn main() -> sigwait::Result<()> {
    tracing_subscriber::fmt::init();

    let running = Arc::new(AtomicBool::new(true));
    let worker_running = running.clone();
    let worker = thread::spawn(move || {
        let mut counter = 0;
        while worker_running.load(Ordering::SeqCst) {
            thread::sleep(Duration::from_millis(500));
            counter += 1;
            println!("Working... iteration {}", counter);
        }
        counter
    });

    let service = Arc::new(FnService::new("worker", move || {
        running.store(false, Ordering::SeqCst);
        let iterations = worker.join().unwrap_or_default();
        println!("Worker stopped after {} iterations", iterations);

        // Close connections, flush data, etc.
        println!("Cleaning up resources...");
        thread::sleep(Duration::from_secs(2));
        println!("Cleanup completed");
    }));

    sigwait::run_until_signal(service)?;
    println!("Exiting");
    Ok(())
}
