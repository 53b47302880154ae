//! Sliding-window admission control shared by all callers of one provider.
//!
//! The window is a log of admission instants. A caller that would push the log
//! past `capacity` computes how long until the oldest entry leaves the window,
//! releases the lock and sleeps, then re-checks. Nobody sleeps while holding
//! the log lock, so a waiting caller never stalls [`RateLimiter::in_flight`].
//!
//! Waiters are admitted in arrival order: a caller first takes its turn on an
//! async FIFO queue and only then competes for the window, so a newcomer can
//! never grab a slot freed for a caller that has been sleeping on it.

use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::time::Instant;

use crate::core::FeedError;

/// Length of the rolling window used by [`RateLimiter::per_minute`].
pub const DEFAULT_WINDOW: Duration = Duration::from_secs(60);

/// Added to every computed wait so the oldest call is strictly outside the window on wake-up.
const SAFETY_MARGIN: Duration = Duration::from_millis(50);

/// Admits at most `capacity` calls within any rolling window.
///
/// Exactly `capacity` calls are admitted per window; the `capacity + 1`-th waits
/// until the first one is older than the window. Waiting never rejects a call,
/// it only adds latency. Use [`enter_within`](Self::enter_within) to bound the
/// wait, or drop the future returned by [`enter`](Self::enter) to abandon it;
/// an abandoned wait leaves nothing recorded.
#[derive(Debug)]
pub struct RateLimiter {
    calls: Mutex<VecDeque<Instant>>,
    turnstile: tokio::sync::Mutex<()>,
    capacity: usize,
    window: Duration,
}

impl RateLimiter {
    /// Creates a limiter for `max_calls` per 60 seconds.
    #[must_use]
    pub fn per_minute(max_calls: u32) -> Self {
        Self::new(max_calls, DEFAULT_WINDOW)
    }

    /// Creates a limiter for `capacity` calls per `window`. A capacity of zero is treated as one.
    #[must_use]
    pub fn new(capacity: u32, window: Duration) -> Self {
        let capacity = usize::try_from(capacity.max(1)).unwrap_or(usize::MAX);
        Self {
            calls: Mutex::new(VecDeque::with_capacity(capacity)),
            turnstile: tokio::sync::Mutex::new(()),
            capacity,
            window,
        }
    }

    /// Maximum number of admissions per window.
    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    /// Length of the rolling window.
    #[must_use]
    pub const fn window(&self) -> Duration {
        self.window
    }

    /// Number of admissions that still count against the current window.
    pub fn in_flight(&self) -> usize {
        let mut calls = self.lock();
        self.prune(&mut calls, Instant::now());
        calls.len()
    }

    /// Waits until a call can be admitted without breaking the window invariant, then records it.
    ///
    /// Concurrent callers are admitted first come, first served.
    pub async fn enter(&self) {
        let _turn = self.turnstile.lock().await;
        loop {
            match self.try_admit(Instant::now()) {
                Ok(()) => return,
                Err(wait) => {
                    tracing::debug!(wait_ms = wait.as_millis() as u64, "enforcing rate limit, sleeping");
                    tokio::time::sleep(wait).await;
                }
            }
        }
    }

    /// Like [`enter`](Self::enter), but gives up once admission would need more than `max_wait`.
    ///
    /// # Errors
    ///
    /// Returns [`FeedError::AdmissionTimeout`] when the window stays full past `max_wait`.
    /// No call is recorded in that case.
    pub async fn enter_within(&self, max_wait: Duration) -> Result<(), FeedError> {
        let deadline = Instant::now() + max_wait;
        let _turn = tokio::time::timeout_at(deadline, self.turnstile.lock())
            .await
            .map_err(|_| FeedError::AdmissionTimeout(max_wait))?;
        loop {
            let now = Instant::now();
            match self.try_admit(now) {
                Ok(()) => return Ok(()),
                Err(wait) if now + wait > deadline => {
                    tracing::debug!(
                        wait_ms = wait.as_millis() as u64,
                        max_wait_ms = max_wait.as_millis() as u64,
                        "rate limit wait exceeds allowed budget"
                    );
                    return Err(FeedError::AdmissionTimeout(max_wait));
                }
                Err(wait) => tokio::time::sleep(wait).await,
            }
        }
    }

    /// Records `now` and returns `Ok` if there is room, otherwise the time to wait before retrying.
    fn try_admit(&self, now: Instant) -> Result<(), Duration> {
        let mut calls = self.lock();
        self.prune(&mut calls, now);

        if calls.len() < self.capacity {
            calls.push_back(now);
            return Ok(());
        }

        let oldest = calls.front().copied().unwrap_or(now);
        let age = now.saturating_duration_since(oldest);
        Err(self.window.saturating_sub(age) + SAFETY_MARGIN)
    }

    fn prune(&self, calls: &mut VecDeque<Instant>, now: Instant) {
        while let Some(&oldest) = calls.front() {
            if now.saturating_duration_since(oldest) >= self.window {
                calls.pop_front();
            } else {
                break;
            }
        }
    }

    // A poisoned window is still a valid log of instants.
    fn lock(&self) -> MutexGuard<'_, VecDeque<Instant>> {
        self.calls.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
