//! Fixed-delay retry for transient API errors. The delay never grows.

use crate::api::ApiError;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::sleep;
use std::time::{Duration, Instant};

/// Outcome of a retried call.
#[derive(Debug)]
pub enum Retried<T> {
    Done(T),
    /// Every attempt failed with a transient error; carries the last one.
    Exhausted(ApiError),
    /// The interrupt flag was raised while waiting between attempts.
    Interrupted,
}

#[derive(Clone, Copy, Debug)]
pub struct RetryPolicy {
    pub max_attempts: usize,
    pub delay: Duration,
}

impl RetryPolicy {
    pub fn new(max_attempts: usize, delay: Duration) -> Self {
        Self { max_attempts: max_attempts.max(1), delay }
    }

    /// Run `op` up to `max_attempts` times. Only errors for which
    /// `ApiError::is_transient` holds are retried; `op` is expected to have
    /// already folded the rest into its `Ok` value.
    pub fn run<T, F>(&self, interrupt: &AtomicBool, label: &str, mut op: F) -> Retried<T>
    where
        F: FnMut() -> Result<T, ApiError>,
    {
        let mut attempt = 0usize;
        loop {
            match op() {
                Ok(v) => return Retried::Done(v),
                Err(e) => {
                    attempt += 1;
                    if attempt >= self.max_attempts {
                        return Retried::Exhausted(e);
                    }
                    tracing::warn!(
                        target_id = label, error = %e, attempt, max = self.max_attempts,
                        "Reddit API error: {}. Retrying in {} seconds... ({}/{})",
                        e, self.delay.as_secs(), attempt, self.max_attempts
                    );
                    if !interruptible_sleep(self.delay, interrupt) {
                        return Retried::Interrupted;
                    }
                }
            }
        }
    }
}

/// Sleep for `total`, waking early if `interrupt` is raised.
/// Returns false when interrupted.
pub fn interruptible_sleep(total: Duration, interrupt: &AtomicBool) -> bool {
    const TICK: Duration = Duration::from_millis(100);
    let deadline = Instant::now() + total;
    loop {
        if interrupt.load(Ordering::SeqCst) {
            return false;
        }
        let now = Instant::now();
        if now >= deadline {
            return true;
        }
        sleep(TICK.min(deadline - now));
    }
}
