//! Forced process exit

/// Terminates the process.
///
/// [`ProcessExit`] is what production code uses. Tests substitute an
/// implementation that records the code and parks the calling thread, since
/// an implementation must never return.
pub trait Exit: Send + Sync {
    fn exit(&self, code: i32) -> !;
}

/// Exits the current process immediately, without unwinding or running
/// destructors.
#[derive(Clone, Copy, Debug, Default)]
pub struct ProcessExit;

impl Exit for ProcessExit {
    fn exit(&self, code: i32) -> ! {
        std::process::exit(code)
    }
}

impl<E: Exit + ?Sized> Exit for &E {
    fn exit(&self, code: i32) -> ! {
        (**self).exit(code)
    }
}

impl<E: Exit + ?Sized> Exit for std::sync::Arc<E> {
    fn exit(&self, code: i32) -> ! {
        (**self).exit(code)
    }
}
