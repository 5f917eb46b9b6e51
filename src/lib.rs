//! sigwait: graceful shutdown on termination signals
//!
//! This crate runs a service until it stops, turning process termination
//! signals into an orderly shutdown:
//! - The first SIGINT, SIGHUP, SIGTERM or SIGQUIT requests a stop of the service
//! - A second signal received before the stop completes exits the process
//!   immediately with [`FORCE_EXIT_CODE`]
//! - The call returns once the service reports it is fully stopped, whatever
//!   caused it to stop
//!
//! A service exposes two one-shot notifications through [`StopWaitable`]:
//! one returned by `stop()` that fires when cleanup has finished, and one
//! returned by `wait()` that fires when the service is fully stopped.
//!
//! ## Example
//!
//! ```rust,no_run
//! use sigwait::FnService;
//! use std::sync::atomic::{AtomicBool, Ordering};
//! use std::sync::Arc;
//!
//! fn main() -> sigwait::Result<()> {
//!     let running = Arc::new(AtomicBool::new(true));
//!     let flag = running.clone();
//!
//!     let service = Arc::new(FnService::new("worker", move || {
//!         // Flush buffers, close connections, ...
//!         flag.store(false, Ordering::SeqCst);
//!     }));
//!
//!     // Returns after the first signal once cleanup has run.
//!     // Press Ctrl-C twice to skip cleanup and exit with status 255.
//!     sigwait::run_until_signal(service)?;
//!     assert!(!running.load(Ordering::SeqCst));
//!     Ok(())
//! }
//! ```
//!
//! # Testing
//!
//! Both process-wide collaborators can be replaced. [`ChannelSignals`]
//! delivers signals from an in-process channel instead of the OS, and any
//! [`Exit`] implementation can stand in for [`ProcessExit`]:
//!
//! ```rust
//! use sigwait::{ChannelSignals, Coordinator, FnService, ProcessExit, Signal};
//! use std::sync::Arc;
//!
//! let (tx, source) = ChannelSignals::new();
//! let coordinator = Coordinator::new(source, ProcessExit);
//! let service = Arc::new(FnService::new("worker", || {}));
//!
//! tx.send(Signal::Interrupt).unwrap();
//! coordinator.run_until_signal(service).unwrap();
//! ```

pub mod completion;
pub mod config;
pub mod coordinator;
pub mod exit;
pub mod service;
pub mod signal;

// Re-export core types
pub use completion::{Completer, Completion};
pub use config::{FORCE_EXIT_CODE, TERMINATION_SIGNALS};
pub use coordinator::{escalate_on_signal, escalate_until, run_until_signal, Coordinator, Outcome};
pub use error::{Error, Result};
pub use exit::{Exit, ProcessExit};
pub use service::{FnService, StopWaitable};
pub use signal::{ChannelSignals, OsSignals, Signal, SignalSource, Subscription};

/// Error types for sigwait
pub mod error {
    use thiserror::Error;

    #[derive(Error, Debug)]
    pub enum Error {
        #[error("Failed to subscribe to termination signals: {0}")]
        Subscribe(#[source] std::io::Error),

        #[error("Failed to spawn thread: {0}")]
        Spawn(#[source] std::io::Error),
    }

    pub type Result<T> = std::result::Result<T, Error>;
}
