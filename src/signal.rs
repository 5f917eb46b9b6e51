//! Signal listener
//!
//! This module bridges operating-system termination signals into a
//! `crossbeam_channel`. [`OsSignals`] registers SIGINT, SIGHUP, SIGTERM and
//! SIGQUIT through signal-hook and forwards every delivery, in arrival order,
//! from a dedicated thread. Registration completes inside
//! [`SignalSource::subscribe`], so a signal raised after `subscribe` returns
//! is never lost.
//!
//! [`ChannelSignals`] implements the same capability over a caller-owned
//! channel, which lets tests and embedders inject signals without touching
//! process-wide signal state.

use crossbeam_channel::{unbounded, Receiver, Sender};
use libc::c_int;
use signal_hook::consts::signal::{SIGHUP, SIGINT, SIGQUIT, SIGTERM};
use signal_hook::iterator::{Handle, Signals};
use std::fmt;
use std::thread;

use crate::config::{LISTENER_THREAD_NAME, TERMINATION_SIGNALS};
use crate::error::{Error, Result};

/// A termination-class signal.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Signal {
    /// SIGINT, usually Ctrl-C.
    Interrupt,
    /// SIGHUP, the controlling terminal went away.
    Hangup,
    /// SIGTERM, the default `kill` signal.
    Terminate,
    /// SIGQUIT.
    Quit,
}

impl Signal {
    /// The raw signal number.
    pub fn as_raw(self) -> c_int {
        match self {
            Signal::Interrupt => SIGINT,
            Signal::Hangup => SIGHUP,
            Signal::Terminate => SIGTERM,
            Signal::Quit => SIGQUIT,
        }
    }

    /// Map a raw signal number back, or `None` if it is not a termination signal.
    pub fn from_raw(raw: c_int) -> Option<Self> {
        match raw {
            SIGINT => Some(Signal::Interrupt),
            SIGHUP => Some(Signal::Hangup),
            SIGTERM => Some(Signal::Terminate),
            SIGQUIT => Some(Signal::Quit),
            _ => None,
        }
    }

    /// The conventional signal name, such as "SIGINT".
    pub fn name(self) -> &'static str {
        match self {
            Signal::Interrupt => "SIGINT",
            Signal::Hangup => "SIGHUP",
            Signal::Terminate => "SIGTERM",
            Signal::Quit => "SIGQUIT",
        }
    }
}

impl fmt::Display for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// An active subscription to termination signals.
pub struct Subscription {
    signals: Receiver<Signal>,
    handle: Option<Handle>,
}

impl Subscription {
    /// Wrap a receiver that is not backed by OS registrations.
    pub fn from_receiver(signals: Receiver<Signal>) -> Self {
        Self {
            signals,
            handle: None,
        }
    }

    /// The delivery channel. Clones share the same stream.
    pub fn signals(&self) -> &Receiver<Signal> {
        &self.signals
    }

    /// Stop forwarding OS signals.
    ///
    /// The forwarding thread exits and drops its sender, so receivers see a
    /// disconnected channel once buffered signals are drained. The OS-level
    /// handlers stay installed, so the signals remain caught afterwards.
    pub fn close(self) {
        if let Some(handle) = self.handle {
            tracing::debug!("Closing termination signal subscription");
            handle.close();
        }
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("pending", &self.signals.len())
            .field("os", &self.handle.is_some())
            .finish()
    }
}

/// Capability to subscribe to termination signals.
pub trait SignalSource {
    /// Subscribe to termination signals.
    ///
    /// The subscription must be fully established when this returns.
    fn subscribe(&self) -> Result<Subscription>;
}

/// Termination signals delivered by the operating system.
#[derive(Clone, Copy, Debug, Default)]
pub struct OsSignals;

impl OsSignals {
    /// Create the OS source. Nothing is registered until [`SignalSource::subscribe`].
    pub fn new() -> Self {
        Self
    }
}

impl SignalSource for OsSignals {
    fn subscribe(&self) -> Result<Subscription> {
        let raw = TERMINATION_SIGNALS.map(Signal::as_raw);
        let mut signals = Signals::new(raw).map_err(Error::Subscribe)?;
        let handle = signals.handle();
        let (tx, rx) = unbounded();

        thread::Builder::new()
            .name(LISTENER_THREAD_NAME.into())
            .spawn(move || forward(&mut signals, &tx))
            .map_err(Error::Spawn)?;

        tracing::debug!(signals = ?TERMINATION_SIGNALS, "Subscribed to termination signals");
        Ok(Subscription {
            signals: rx,
            handle: Some(handle),
        })
    }
}

fn forward(signals: &mut Signals, tx: &Sender<Signal>) {
    for raw in signals.forever() {
        let Some(signal) = Signal::from_raw(raw) else {
            continue;
        };
        if tx.send(signal).is_err() {
            tracing::debug!("Signal receiver dropped, listener exiting");
            return;
        }
    }
    tracing::debug!("Signal listener closed");
}

/// Signals injected through a caller-owned channel.
#[derive(Clone, Debug)]
pub struct ChannelSignals {
    rx: Receiver<Signal>,
}

impl ChannelSignals {
    /// Create a source together with the sender that feeds it.
    ///
    /// Dropping every sender closes the source.
    pub fn new() -> (Sender<Signal>, Self) {
        let (tx, rx) = unbounded();
        (tx, Self { rx })
    }
}

impl SignalSource for ChannelSignals {
    fn subscribe(&self) -> Result<Subscription> {
        Ok(Subscription::from_receiver(self.rx.clone()))
    }
}
