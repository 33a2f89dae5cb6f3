//! Rate Limiter
//!
//! Spaces out invocations of a wrapped async function by a minimum delay.

use std::future::Future;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;

/// Minimum-delay rate limiter around an async function.
///
/// Every [`call`](RateLimiter::call) waits until at least `min_delay` has
/// passed since the previous invocation started, then runs the wrapped
/// function. The timestamp is taken when the caller is released, not when
/// the wrapped future completes, so a burst is serialized to one start per
/// window.
///
/// The check-and-update runs under an async mutex held across the wait.
/// Callers sharing one limiter (through `Arc`) are released in lock order.
/// Errors from the wrapped function are returned untouched.
pub struct RateLimiter<F> {
    func: F,
    min_delay: Duration,
    /// Start of the most recent invocation
    last_call: Mutex<Option<Instant>>,
}

impl<F> RateLimiter<F> {
    /// Create a new rate limiter.
    pub fn new(func: F, min_delay: Duration) -> Self {
        Self {
            func,
            min_delay,
            last_call: Mutex::new(None),
        }
    }

    /// Create a rate limiter with the delay given in seconds.
    ///
    /// Negative, non-finite or overflowing values are treated as no delay.
    pub fn from_secs(func: F, min_delay_secs: f64) -> Self {
        let min_delay = Duration::try_from_secs_f64(min_delay_secs).unwrap_or(Duration::ZERO);
        Self::new(func, min_delay)
    }

    pub fn min_delay(&self) -> Duration {
        self.min_delay
    }

    /// Invoke the wrapped function once the minimum delay has elapsed.
    pub async fn call<A, Fut>(&self, args: A) -> Fut::Output
    where
        F: Fn(A) -> Fut,
        Fut: Future,
    {
        self.wait_turn().await;
        (self.func)(args).await
    }

    async fn wait_turn(&self) {
        let mut last_call = self.last_call.lock().await;

        if let Some(previous) = *last_call {
            let elapsed = previous.elapsed();
            if elapsed < self.min_delay {
                let wait = self.min_delay - elapsed;
                tracing::debug!("rate limiter: waiting {}ms", wait.as_millis());
                tokio::time::sleep(wait).await;
            }
        }

        *last_call = Some(Instant::now());
    }
}
