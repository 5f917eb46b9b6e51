#![allow(dead_code)]

use crossbeam_channel::{unbounded, Receiver, Sender};
use sigwait::{Exit, FnService};
use std::sync::Once;
use std::thread;

static INIT: Once = Once::new();

/// Sets up the tracing subscriber for tests, ensuring it's only initialized once.
pub fn setup_tracing() {
    INIT.call_once(|| {
        tracing_subscriber::fmt::init();
    });
}

/// An [`Exit`] that reports the exit code instead of terminating the process.
///
/// The calling thread is parked forever afterwards, as a real exit never returns.
pub struct RecordingExit {
    codes: Sender<i32>,
}

impl RecordingExit {
    pub fn new() -> (Self, Receiver<i32>) {
        let (codes, rx) = unbounded();
        (Self { codes }, rx)
    }
}

impl Exit for RecordingExit {
    fn exit(&self, code: i32) -> ! {
        let _ = self.codes.send(code);
        loop {
            thread::park();
        }
    }
}

/// A service whose cleanup never finishes.
pub fn hung_service(name: &str) -> FnService {
    FnService::new(name, || loop {
        thread::park();
    })
}
