//! Shutdown coordination
//!
//! The first termination signal requests a graceful stop of the service. A
//! second signal received while that stop is still in progress exits the
//! process immediately with [`FORCE_EXIT_CODE`]. There is no timeout: a
//! service that never finishes stopping is waited on until a second signal
//! arrives.
//!
//! Signals are observed strictly one at a time from a single channel, so the
//! first signal has been fully handled (notices emitted, stop requested)
//! before a second one can have any effect.

use crossbeam_channel::{select, Receiver};
use std::sync::Arc;
use std::thread;

use crate::completion::Completion;
use crate::config::{ESCALATION_THREAD_NAME, FORCE_EXIT_CODE};
use crate::error::{Error, Result};
use crate::exit::{Exit, ProcessExit};
use crate::service::StopWaitable;
use crate::signal::{OsSignals, Signal, SignalSource};

/// How an escalation finished.
///
/// Forced termination is not an outcome: it never returns.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Outcome {
    /// A signal was received and the service completed its stop.
    Stopped,
    /// The signal channel closed before any signal arrived. No stop was requested.
    SourceClosed,
    /// The run this escalation belonged to ended first.
    RunEnded,
}

/// Stop `service` on the first signal, exit the process on the second.
///
/// Blocks until a signal arrives, requests a stop, then waits for either the
/// stop to complete or another signal. If both are ready at the same time the
/// completed stop wins. If the channel disconnects after the first signal,
/// only the stop completion is waited on.
pub fn escalate_on_signal<W, E>(service: &W, signals: &Receiver<Signal>, exit: &E) -> Outcome
where
    W: StopWaitable + ?Sized,
    E: Exit + ?Sized,
{
    let (_never, run_done) = Completion::pair();
    escalate_until(service, signals, exit, &run_done)
}

/// [`escalate_on_signal`], abandoned as soon as `run_done` fires.
///
/// Once `run_done` has fired no stop is requested and no exit happens, so
/// the calling thread can always wind down with its run.
pub fn escalate_until<W, E>(
    service: &W,
    signals: &Receiver<Signal>,
    exit: &E,
    run_done: &Completion,
) -> Outcome
where
    W: StopWaitable + ?Sized,
    E: Exit + ?Sized,
{
    let signal = select! {
        recv(signals) -> msg => match msg {
            Ok(signal) => signal,
            Err(_) => {
                tracing::debug!("Signal source closed before any signal arrived");
                return Outcome::SourceClosed;
            }
        },
        recv(run_done.receiver()) -> _ => return Outcome::RunEnded,
    };
    if run_done.is_complete() {
        return Outcome::RunEnded;
    }
    tracing::info!("Received signal {}", signal);
    tracing::info!("Exiting...");

    let stopped = service.stop();
    select! {
        recv(stopped.receiver()) -> _ => {},
        recv(run_done.receiver()) -> _ => {
            if !stopped.is_complete() {
                tracing::debug!("Run ended before the requested stop completed");
                return Outcome::RunEnded;
            }
        },
        recv(signals) -> msg => match msg {
            Ok(_) if stopped.is_complete() => {}
            Ok(_) if run_done.is_complete() => return Outcome::RunEnded,
            Ok(second) => force_quit(second, exit),
            Err(_) => {
                tracing::debug!("Signal source closed, waiting for stop to complete");
                select! {
                    recv(stopped.receiver()) -> _ => {},
                    recv(run_done.receiver()) -> _ => {
                        if !stopped.is_complete() {
                            return Outcome::RunEnded;
                        }
                    },
                }
            }
        },
    }

    tracing::debug!("Service stop completed");
    Outcome::Stopped
}

fn force_quit<E: Exit + ?Sized>(signal: Signal, exit: &E) -> ! {
    tracing::warn!("Received signal {} during shutdown, force quitting...", signal);
    exit.exit(FORCE_EXIT_CODE)
}

/// Runs a service until it stops, escalating on repeated termination signals.
#[derive(Debug)]
pub struct Coordinator<S = OsSignals, E = ProcessExit> {
    source: S,
    exit: Arc<E>,
}

impl Coordinator {
    /// A coordinator listening to real OS signals and exiting the real process.
    pub fn os() -> Self {
        Self::new(OsSignals::new(), ProcessExit)
    }
}

impl<S, E> Coordinator<S, E>
where
    S: SignalSource,
    E: Exit + 'static,
{
    /// Create a coordinator that subscribes through `source` and force quits
    /// through `exit`.
    pub fn new(source: S, exit: E) -> Self {
        Self {
            source,
            exit: Arc::new(exit),
        }
    }

    /// Block until `service` reports it has fully stopped.
    ///
    /// The signal subscription is in place before this starts waiting. The
    /// escalation policy runs on its own thread, so the service stopping for
    /// any other reason also ends the wait. That thread is finished before
    /// this returns, so a coordinator can be reused for another run. Errors
    /// are only returned for setup failures, before any signal is observed.
    pub fn run_until_signal<W>(&self, service: Arc<W>) -> Result<()>
    where
        W: StopWaitable + ?Sized + 'static,
    {
        let _span = tracing::info_span!("run_until_signal").entered();

        let subscription = self.source.subscribe()?;
        let signals = subscription.signals().clone();
        let exit = Arc::clone(&self.exit);
        let escalation_service = Arc::clone(&service);
        let (run_done_tx, run_done) = Completion::pair();

        let escalation = thread::Builder::new()
            .name(ESCALATION_THREAD_NAME.into())
            .spawn(move || {
                let outcome = escalate_until(&*escalation_service, &signals, &*exit, &run_done);
                tracing::debug!(?outcome, "Escalation finished");
            })
            .map_err(Error::Spawn)?;

        service.wait().wait();
        tracing::debug!("Service fully stopped");
        run_done_tx.complete();
        if escalation.join().is_err() {
            tracing::warn!("Escalation thread panicked");
        }
        subscription.close();
        Ok(())
    }
}

/// Run `service` until it stops, reacting to SIGINT, SIGHUP, SIGTERM and SIGQUIT.
///
/// See [`Coordinator::run_until_signal`].
pub fn run_until_signal<W>(service: Arc<W>) -> Result<()>
where
    W: StopWaitable + ?Sized + 'static,
{
    Coordinator::os().run_until_signal(service)
}
