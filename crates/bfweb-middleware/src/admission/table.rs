//! The bounded per-client counter table.

use super::clock::{Clock, SystemClock};
use super::policy::RateLimitPolicy;
use super::AdmissionOutcome;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Result of a single admission check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AdmissionDecision {
    /// What happened to the request.
    pub outcome: AdmissionOutcome,
    /// Time left in the current window when the decision was made.
    pub reset_in: Duration,
}

#[derive(Debug)]
struct TableState {
    counts: HashMap<String, u64>,
    reset_at: Instant,
}

impl TableState {
    /// Clears the table if `now` is strictly past the reset instant.
    fn reset_if_expired(&mut self, now: Instant, window: Duration) -> bool {
        if now > self.reset_at {
            self.counts.clear();
            self.reset_at = now + window;
            true
        } else {
            false
        }
    }
}

/// Request counts per client for the current fixed window.
///
/// Holds at most `max_clients` keys. All reads and writes, including the
/// window reset, happen under one lock, so concurrent checks against the
/// same key are serialized and the count never exceeds what the policy
/// admitted. The lock is never held across an await.
///
/// # Example
///
/// ```
/// use bfweb_middleware::admission::{AdmissionOutcome, ClientCounterTable, RateLimitPolicy};
/// use std::time::Duration;
///
/// let policy = RateLimitPolicy::new(1, 10, Duration::from_secs(60)).unwrap();
/// let table = ClientCounterTable::new(policy);
///
/// assert_eq!(table.admit("10.0.0.1"), AdmissionOutcome::Allowed);
/// assert_eq!(table.admit("10.0.0.1"), AdmissionOutcome::RejectedRequestLimitExceeded);
/// ```
#[derive(Debug)]
pub struct ClientCounterTable {
    policy: RateLimitPolicy,
    clock: Arc<dyn Clock>,
    state: Mutex<TableState>,
}

impl ClientCounterTable {
    /// Creates an empty table on the system clock.
    pub fn new(policy: RateLimitPolicy) -> Self {
        Self::with_clock(policy, Arc::new(SystemClock))
    }

    /// Creates an empty table on the given clock.
    ///
    /// The first window ends one `window` after the clock's current reading.
    pub fn with_clock(policy: RateLimitPolicy, clock: Arc<dyn Clock>) -> Self {
        let reset_at = clock.now() + policy.window();
        Self {
            policy,
            clock,
            state: Mutex::new(TableState {
                counts: HashMap::new(),
                reset_at,
            }),
        }
    }

    /// Returns the policy this table enforces.
    pub fn policy(&self) -> &RateLimitPolicy {
        &self.policy
    }

    /// Counts a request from `key` and decides whether it may proceed.
    pub fn admit(&self, key: &str) -> AdmissionOutcome {
        self.decide(key).outcome
    }

    /// Like [`admit`](Self::admit), also reporting the time left in the
    /// window the decision was made in.
    pub fn decide(&self, key: &str) -> AdmissionDecision {
        let now = self.clock.now();
        let mut state = self.state.lock();
        state.reset_if_expired(now, self.policy.window());

        let tracked = state.counts.len();
        let outcome = match state.counts.get_mut(key) {
            Some(count) => {
                *count = count.saturating_add(1);
                if *count > self.policy.max_requests() {
                    AdmissionOutcome::RejectedRequestLimitExceeded
                } else {
                    AdmissionOutcome::Allowed
                }
            }
            None if tracked >= self.policy.max_clients() => {
                AdmissionOutcome::RejectedNewClientCapacityExceeded
            }
            None => {
                state.counts.insert(key.to_string(), 1);
                // max_requests >= 1, so a first request is always within budget.
                AdmissionOutcome::Allowed
            }
        };

        AdmissionDecision {
            outcome,
            reset_in: state.reset_at.saturating_duration_since(now),
        }
    }

    /// Clears the table if the current window has expired.
    ///
    /// Returns `true` if a reset happened. [`admit`](Self::admit) performs
    /// the same check itself; this is for callers that want to expire state
    /// without counting a request.
    pub fn check_and_maybe_reset(&self) -> bool {
        let now = self.clock.now();
        self.state.lock().reset_if_expired(now, self.policy.window())
    }

    /// Number of distinct clients in the current window.
    pub fn tracked_clients(&self) -> usize {
        self.state.lock().counts.len()
    }

    /// Requests counted for `key` in the current window.
    pub fn count(&self, key: &str) -> Option<u64> {
        self.state.lock().counts.get(key).copied()
    }

    /// Instant at which the table will next be cleared.
    pub fn window_reset_at(&self) -> Instant {
        self.state.lock().reset_at
    }

    /// Time left until the current window ends.
    pub fn time_until_reset(&self) -> Duration {
        let now = self.clock.now();
        self.state.lock().reset_at.saturating_duration_since(now)
    }
}
