use std::collections::VecDeque;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use tokio::time::Instant;

use crate::provider_policy::ProviderPolicy;

const DEFAULT_BACKOFF: Duration = Duration::from_secs(1);

/// Sliding-window log limiter.
///
/// Keeps the instant of every admission made during the trailing window.
/// Each check first drops instants older than the window, so at any moment
/// the number of admissions inside any window-length span is at most
/// `max_requests`. Cloning shares the same log.
#[derive(Debug, Clone)]
pub struct RateLimiter {
    admitted: Arc<Mutex<VecDeque<Instant>>>,
    max_requests: u32,
    window: Duration,
    backoff: Duration,
}

impl RateLimiter {
    pub fn new(max_requests: u32, window: Duration) -> Self {
        Self {
            admitted: Arc::new(Mutex::new(VecDeque::new())),
            max_requests,
            window,
            backoff: DEFAULT_BACKOFF,
        }
    }

    pub fn from_policy(policy: &ProviderPolicy) -> Self {
        Self::new(policy.quota_limit, policy.quota_window).with_backoff(policy.admission_backoff)
    }

    pub fn with_backoff(mut self, backoff: Duration) -> Self {
        self.backoff = backoff;
        self
    }

    /// Records an admission and returns `true` when under quota.
    pub fn try_admit(&self) -> bool {
        let now = Instant::now();
        let mut admitted = self.lock();
        Self::prune(&mut admitted, now, self.window);

        if admitted.len() >= self.max_requests as usize {
            return false;
        }
        admitted.push_back(now);
        true
    }

    /// Suspends the calling task until a slot frees up, then records it.
    ///
    /// Never fails. Callers that need a bound wrap this in a timeout.
    pub async fn await_slot(&self) {
        let mut waits = 0_u32;
        while !self.try_admit() {
            waits = waits.saturating_add(1);
            tracing::debug!(
                max_requests = self.max_requests,
                waits,
                "rate limit reached, waiting for a slot"
            );
            tokio::time::sleep(self.backoff).await;
        }
    }

    /// Admissions currently inside the window.
    pub fn in_window(&self) -> usize {
        let mut admitted = self.lock();
        Self::prune(&mut admitted, Instant::now(), self.window);
        admitted.len()
    }

    pub fn remaining(&self) -> u32 {
        let used = u32::try_from(self.in_window()).unwrap_or(u32::MAX);
        self.max_requests.saturating_sub(used)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, VecDeque<Instant>> {
        self.admitted.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn prune(admitted: &mut VecDeque<Instant>, now: Instant, window: Duration) {
        while let Some(oldest) = admitted.front() {
            if now.saturating_duration_since(*oldest) >= window {
                admitted.pop_front();
            } else {
                break;
            }
        }
    }
}
