//! Configuration constants for sigwait
//!
//! Nothing here is configurable at runtime. The signal set and the forced
//! exit status are fixed so every process using this crate reacts to
//! termination requests the same way.

use crate::signal::Signal;

/// Signals that request a shutdown
///
/// The first one received starts a graceful stop, a second one received
/// before the stop completes forces the process to exit.
pub const TERMINATION_SIGNALS: [Signal; 4] = [
    Signal::Interrupt,
    Signal::Hangup,
    Signal::Terminate,
    Signal::Quit,
];

/// Exit code used when a second signal forces the process to quit
///
/// The OS reports it as exit status 255.
pub const FORCE_EXIT_CODE: i32 = -1;

/// Name of the thread forwarding OS signals into the delivery channel
pub const LISTENER_THREAD_NAME: &str = "sigwait-listener";

/// Name of the thread running the escalation policy
pub const ESCALATION_THREAD_NAME: &str = "sigwait-escalation";
