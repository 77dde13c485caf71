//! Execution timeout.

use std::{
    sync::mpsc::{self, RecvTimeoutError},
    thread::{self, JoinHandle},
    time::Duration,
};

use sload_tracer::InterruptHandle;
use tracing::warn;

/// Reason passed to the tracer when the timeout expires.
pub(crate) const TIMEOUT_REASON: &str = "execution timeout";

/// Stops a tracer from a separate thread once a timeout expires, unless finished first.
#[derive(Debug)]
pub(crate) struct Watchdog {
    cancel: mpsc::Sender<()>,
    thread: JoinHandle<()>,
}

impl Watchdog {
    pub(crate) fn spawn(timeout: Duration, handle: InterruptHandle) -> Self {
        let (cancel, cancelled) = mpsc::channel::<()>();
        let thread = thread::spawn(move || {
            if let Err(RecvTimeoutError::Timeout) = cancelled.recv_timeout(timeout) {
                warn!(?timeout, "Execution timed out, stopping tracer");
                handle.stop(TIMEOUT_REASON);
            }
        });
        Self { cancel, thread }
    }

    /// Disarm the watchdog and wait for its thread to exit.
    pub(crate) fn finish(self) {
        drop(self.cancel);
        // The watchdog thread never panics.
        let _ = self.thread.join();
    }
}

/// Parse a duration such as `500ms`, `5s`, `2m` or a bare number of seconds.
pub(crate) fn parse_duration(s: &str) -> Result<Duration, String> {
    let s = s.trim();
    let split = s.find(|c: char| !c.is_ascii_digit()).unwrap_or(s.len());
    let (number, unit) = s.split_at(split);
    let number: u64 = number.parse().map_err(|_| format!("invalid duration '{s}'"))?;
    match unit {
        "ms" => Ok(Duration::from_millis(number)),
        "" | "s" => Ok(Duration::from_secs(number)),
        "m" => number
            .checked_mul(60)
            .map(Duration::from_secs)
            .ok_or_else(|| format!("duration '{s}' is too large")),
        _ => Err(format!("invalid duration unit '{unit}' in '{s}', expected ms, s or m")),
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case("250ms", Duration::from_millis(250))]
    #[case("5s", Duration::from_secs(5))]
    #[case("5", Duration::from_secs(5))]
    #[case("2m", Duration::from_secs(120))]
    fn test_parse_duration(#[case] input: &str, #[case] expected: Duration) {
        assert_eq!(parse_duration(input).unwrap(), expected);
    }

    #[rstest]
    #[case("")]
    #[case("ms")]
    #[case("5h")]
    #[case("1.5s")]
    #[case("18446744073709551615m")]
    fn test_parse_duration_rejects(#[case] input: &str) {
        assert!(parse_duration(input).is_err());
    }

    #[test]
    fn test_expired_watchdog_stops_tracer() {
        let handle = InterruptHandle::new();
        let watchdog = Watchdog::spawn(Duration::ZERO, handle.clone());
        watchdog.thread.join().unwrap();
        assert_eq!(handle.reason(), Some(TIMEOUT_REASON));
    }

    #[test]
    fn test_finished_watchdog_does_not_stop_tracer() {
        let handle = InterruptHandle::new();
        Watchdog::spawn(Duration::from_secs(3600), handle.clone()).finish();
        assert!(!handle.is_interrupted());
    }
}
