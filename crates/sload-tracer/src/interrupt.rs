use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc, OnceLock,
};

use tracing::debug;

#[derive(Debug, Default)]
struct Interrupt {
    flag: AtomicBool,
    reason: OnceLock<String>,
}

/// A cloneable handle used to request that a trace stop.
///
/// The handle can be moved to any thread and used while the trace is still running on the
/// execution thread. Stopping never blocks and never panics. The request is advisory: the
/// tracers in this crate record it and report it alongside their result, but they keep
/// recording until the engine finishes the transaction. Halting execution is the host's job.
#[derive(Debug, Clone, Default)]
pub struct InterruptHandle(Arc<Interrupt>);

impl InterruptHandle {
    /// Create a handle with the flag cleared.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `reason` and raise the interrupt flag.
    ///
    /// Only the first reason is kept; later calls still raise the flag but do not replace it.
    pub fn stop(&self, reason: impl Into<String>) {
        let reason = reason.into();
        debug!(%reason, "Trace stop requested");
        // The reason is published before the flag, so a reader that sees the flag sees it too.
        let _ = self.0.reason.set(reason);
        self.0.flag.store(true, Ordering::Release);
    }

    /// Returns `true` once [`stop`](Self::stop) has been called on any clone of this handle.
    pub fn is_interrupted(&self) -> bool {
        self.0.flag.load(Ordering::Acquire)
    }

    /// The reason passed to the first [`stop`](Self::stop) call, if any.
    pub fn reason(&self) -> Option<&str> {
        if !self.is_interrupted() {
            return None;
        }
        self.0.reason.get().map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use std::thread;

    use super::*;

    #[test]
    fn test_fresh_handle_is_not_interrupted() {
        let handle = InterruptHandle::new();
        assert!(!handle.is_interrupted());
        assert_eq!(handle.reason(), None);
    }

    #[test]
    fn test_first_reason_wins() {
        let handle = InterruptHandle::new();
        handle.stop("execution timeout");
        handle.stop("cancelled");
        assert!(handle.is_interrupted());
        assert_eq!(handle.reason(), Some("execution timeout"));
    }

    #[test]
    fn test_stop_from_another_thread() {
        let handle = InterruptHandle::new();
        let remote = handle.clone();
        thread::spawn(move || remote.stop("cancelled")).join().unwrap();
        assert!(handle.is_interrupted());
        assert_eq!(handle.reason(), Some("cancelled"));
    }
}
