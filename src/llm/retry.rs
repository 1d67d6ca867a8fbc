//! Retry with exponential backoff for transient HTTP failures.

use std::thread;
use std::time::Duration;

/// Errors that can tell whether retrying the same request might succeed.
pub trait Transient {
    /// Returns `true` for network errors, timeouts, HTTP 5xx and rate limiting.
    fn is_transient(&self) -> bool;
}

/// Delays between attempts used by `retry_with_backoff`.
pub const BACKOFF_DELAYS: [Duration; 3] = [
    Duration::from_secs(1),
    Duration::from_secs(2),
    Duration::from_secs(4),
];

/// Retries an operation with exponential backoff.
///
/// The operation is attempted once and then retried up to 3 times with
/// delays of 1s, 2s and 4s. Only transient errors are retried; anything
/// else is returned immediately.
pub fn retry_with_backoff<F, T, E>(f: F) -> Result<T, E>
where
    F: FnMut() -> Result<T, E>,
    E: Transient,
{
    retry_with_delays(&BACKOFF_DELAYS, f)
}

/// Retries an operation once per entry in `delays`, sleeping that long first.
///
/// Returns the last error when every attempt failed.
pub fn retry_with_delays<F, T, E>(delays: &[Duration], mut f: F) -> Result<T, E>
where
    F: FnMut() -> Result<T, E>,
    E: Transient,
{
    let mut last_error = match f() {
        Ok(result) => return Ok(result),
        Err(e) if !e.is_transient() => return Err(e),
        Err(e) => e,
    };

    for (attempt, delay) in delays.iter().enumerate() {
        tracing::warn!(
            attempt = attempt + 1,
            delay_ms = delay.as_millis() as u64,
            "retrying after transient error"
        );
        thread::sleep(*delay);

        match f() {
            Ok(result) => return Ok(result),
            Err(e) if !e.is_transient() => return Err(e),
            Err(e) => last_error = e,
        }
    }

    Err(last_error)
}
