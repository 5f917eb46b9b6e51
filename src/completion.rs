//! One-shot completion notifications
//!
//! A [`Completion`] is the receiving half of a fire-once notification. It is
//! backed by a `crossbeam_channel` that never carries a message: the
//! notification fires when the paired [`Completer`] is consumed or dropped and
//! the channel disconnects. Disconnection is observed by every receiver clone,
//! so any number of waiters unblock together and the notification can never
//! fire twice or un-fire.

use crossbeam_channel::{bounded, Receiver, RecvTimeoutError, Sender, TryRecvError};
use std::convert::Infallible;
use std::time::Duration;

/// Producer half of a completion pair.
///
/// Dropping a `Completer` fires the notification just like
/// [`Completer::complete`] does.
#[derive(Debug)]
pub struct Completer {
    _tx: Sender<Infallible>,
}

impl Completer {
    /// Fire the notification.
    pub fn complete(self) {
        drop(self);
    }
}

/// A fire-once, broadcast-safe notification.
#[derive(Clone, Debug)]
pub struct Completion {
    rx: Receiver<Infallible>,
}

impl Completion {
    /// Create a linked completer/completion pair.
    pub fn pair() -> (Completer, Completion) {
        let (tx, rx) = bounded(0);
        (Completer { _tx: tx }, Completion { rx })
    }

    /// A notification that has already fired.
    pub fn done() -> Self {
        let (completer, completion) = Self::pair();
        completer.complete();
        completion
    }

    /// Block until the notification fires.
    pub fn wait(&self) {
        match self.rx.recv() {
            Ok(never) => match never {},
            Err(_) => {}
        }
    }

    /// Block for at most `timeout`. Returns `true` if the notification fired.
    pub fn wait_timeout(&self, timeout: Duration) -> bool {
        matches!(
            self.rx.recv_timeout(timeout),
            Err(RecvTimeoutError::Disconnected)
        )
    }

    /// Check whether the notification has fired without blocking.
    pub fn is_complete(&self) -> bool {
        matches!(self.rx.try_recv(), Err(TryRecvError::Disconnected))
    }

    /// The underlying channel, for use in a `crossbeam_channel::select!` race.
    ///
    /// The receive operation becomes ready, with an error, once the
    /// notification fires.
    pub fn receiver(&self) -> &Receiver<Infallible> {
        &self.rx
    }
}
