//! Services that can be stopped and waited upon.

use std::sync::{Arc, Mutex, MutexGuard, OnceLock, PoisonError};
use std::thread;

use crate::completion::{Completer, Completion};

/// A service whose shutdown can be requested and observed.
pub trait StopWaitable: Send + Sync {
    /// Begin cleanup and return a notification that fires once cleanup has
    /// fully finished.
    fn stop(&self) -> Completion;

    /// Return a notification that fires once the service is fully stopped,
    /// whatever caused it to stop.
    fn wait(&self) -> Completion;
}

impl<T: StopWaitable + ?Sized> StopWaitable for &T {
    fn stop(&self) -> Completion {
        (**self).stop()
    }

    fn wait(&self) -> Completion {
        (**self).wait()
    }
}

impl<T: StopWaitable + ?Sized> StopWaitable for Arc<T> {
    fn stop(&self) -> Completion {
        (**self).stop()
    }

    fn wait(&self) -> Completion {
        (**self).wait()
    }
}

type Cleanup = Box<dyn FnOnce() + Send>;

/// A [`StopWaitable`] built from a cleanup closure.
///
/// The first call to [`stop`](StopWaitable::stop) runs the closure on its
/// own thread. Later calls return the same completion without running
/// anything. The service counts as stopped when the closure returns, panics,
/// or when [`mark_stopped`](FnService::mark_stopped) is called, whichever
/// happens first.
pub struct FnService {
    state: Arc<StopState>,
    stopping: OnceLock<Completion>,
    stopped: Completion,
}

/// Cleanup shared between the service and its cleanup thread.
struct StopState {
    name: String,
    cleanup: Mutex<Option<Cleanup>>,
    stopped_tx: Mutex<Option<Completer>>,
    done_tx: Mutex<Option<Completer>>,
}

impl StopState {
    /// Run the cleanup at most once, then fire both completions.
    fn run(&self) {
        let _finished = FireOnDrop(self);
        let cleanup = lock(&self.cleanup).take();
        if let Some(cleanup) = cleanup {
            cleanup();
        }
        tracing::debug!(service = %self.name, "Service cleanup finished");
    }
}

/// Fires the stopped and cleanup completions, in that order, even when the
/// cleanup unwinds.
struct FireOnDrop<'a>(&'a StopState);

impl Drop for FireOnDrop<'_> {
    fn drop(&mut self) {
        if thread::panicking() {
            tracing::warn!(service = %self.0.name, "Service cleanup panicked");
        }
        fire(&self.0.stopped_tx);
        fire(&self.0.done_tx);
    }
}

impl FnService {
    /// Create a service named `name` that runs `cleanup` when stopped.
    pub fn new<F>(name: impl Into<String>, cleanup: F) -> Self
    where
        F: FnOnce() + Send + 'static,
    {
        let (stopped_tx, stopped) = Completion::pair();
        Self {
            state: Arc::new(StopState {
                name: name.into(),
                cleanup: Mutex::new(Some(Box::new(cleanup))),
                stopped_tx: Mutex::new(Some(stopped_tx)),
                done_tx: Mutex::new(None),
            }),
            stopping: OnceLock::new(),
            stopped,
        }
    }

    /// Returns the service name for logging purposes.
    pub fn name(&self) -> &str {
        &self.state.name
    }

    /// Report that the service stopped for a reason other than [`stop`](StopWaitable::stop).
    pub fn mark_stopped(&self) {
        fire(&self.state.stopped_tx);
    }

    fn begin_stop(&self) -> Completion {
        let (done_tx, done) = Completion::pair();
        *lock(&self.state.done_tx) = Some(done_tx);

        tracing::debug!(service = %self.state.name, "Starting service cleanup");
        let state = Arc::clone(&self.state);
        let spawned = thread::Builder::new()
            .name(format!("{}-stop", self.state.name))
            .spawn(move || state.run());

        if let Err(e) = spawned {
            tracing::warn!(
                service = %self.state.name,
                "Failed to spawn cleanup thread, running cleanup inline: {}",
                e
            );
            self.state.run();
        }
        done
    }
}

impl StopWaitable for FnService {
    fn stop(&self) -> Completion {
        self.stopping.get_or_init(|| self.begin_stop()).clone()
    }

    fn wait(&self) -> Completion {
        self.stopped.clone()
    }
}

impl std::fmt::Debug for FnService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FnService")
            .field("name", &self.state.name)
            .field("stopping", &self.stopping.get().is_some())
            .field("stopped", &self.stopped.is_complete())
            .finish()
    }
}

// A panicking cleanup must not keep the completions from firing.
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

fn fire(completer: &Mutex<Option<Completer>>) {
    if let Some(completer) = lock(completer).take() {
        completer.complete();
    }
}
