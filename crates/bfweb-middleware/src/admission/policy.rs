//! Rate limit policy.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

/// Default request budget per client per window.
pub const DEFAULT_MAX_REQUESTS: u64 = 100;
/// Default number of distinct clients tracked per window.
pub const DEFAULT_MAX_CLIENTS: usize = 1000;
/// Default window length.
pub const DEFAULT_WINDOW: Duration = Duration::from_secs(60);
/// Longest accepted window (one year); keeps every reset instant
/// representable.
pub const MAX_WINDOW: Duration = Duration::from_secs(365 * 24 * 60 * 60);

/// Reasons a policy is rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PolicyError {
    /// `max_requests` was zero.
    #[error("max_requests must be at least 1")]
    ZeroMaxRequests,

    /// `max_clients` was zero.
    #[error("max_clients must be at least 1")]
    ZeroMaxClients,

    /// The window was zero, negative, longer than [`MAX_WINDOW`], or not a
    /// finite number of seconds.
    #[error("window must be a positive duration of at most one year")]
    InvalidWindow,
}

/// Limits enforced by the rate limiter.
///
/// Immutable once built; every constructor validates that both caps are at
/// least 1 and the window is positive and at most [`MAX_WINDOW`].
/// Deserialization goes through the same checks, with `window` given in
/// (possibly fractional) seconds and missing fields taking their defaults.
///
/// ```
/// use bfweb_middleware::admission::RateLimitPolicy;
/// use std::time::Duration;
///
/// let policy: RateLimitPolicy =
///     serde_json::from_str(r#"{"max_requests": 5, "window": 1.5}"#).unwrap();
/// assert_eq!(policy.max_requests(), 5);
/// assert_eq!(policy.max_clients(), 1000);
/// assert_eq!(policy.window(), Duration::from_millis(1500));
///
/// assert!(serde_json::from_str::<RateLimitPolicy>(r#"{"max_clients": 0}"#).is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "PolicyRepr", into = "PolicyRepr")]
pub struct RateLimitPolicy {
    max_requests: u64,
    max_clients: usize,
    window: Duration,
}

impl RateLimitPolicy {
    /// Builds a validated policy.
    pub fn new(
        max_requests: u64,
        max_clients: usize,
        window: Duration,
    ) -> Result<Self, PolicyError> {
        if max_requests == 0 {
            return Err(PolicyError::ZeroMaxRequests);
        }
        if max_clients == 0 {
            return Err(PolicyError::ZeroMaxClients);
        }
        if window.is_zero() || window > MAX_WINDOW {
            return Err(PolicyError::InvalidWindow);
        }
        Ok(Self {
            max_requests,
            max_clients,
            window,
        })
    }

    /// Requests allowed per client per window.
    #[must_use]
    pub fn max_requests(&self) -> u64 {
        self.max_requests
    }

    /// Distinct clients tracked per window.
    #[must_use]
    pub fn max_clients(&self) -> usize {
        self.max_clients
    }

    /// Length of the fixed window.
    #[must_use]
    pub fn window(&self) -> Duration {
        self.window
    }
}

impl Default for RateLimitPolicy {
    fn default() -> Self {
        Self {
            max_requests: DEFAULT_MAX_REQUESTS,
            max_clients: DEFAULT_MAX_CLIENTS,
            window: DEFAULT_WINDOW,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
struct PolicyRepr {
    max_requests: u64,
    max_clients: usize,
    /// Seconds.
    window: f64,
}

impl Default for PolicyRepr {
    fn default() -> Self {
        RateLimitPolicy::default().into()
    }
}

impl TryFrom<PolicyRepr> for RateLimitPolicy {
    type Error = PolicyError;

    fn try_from(repr: PolicyRepr) -> Result<Self, Self::Error> {
        let window =
            Duration::try_from_secs_f64(repr.window).map_err(|_| PolicyError::InvalidWindow)?;
        Self::new(repr.max_requests, repr.max_clients, window)
    }
}

impl From<RateLimitPolicy> for PolicyRepr {
    fn from(policy: RateLimitPolicy) -> Self {
        Self {
            max_requests: policy.max_requests,
            max_clients: policy.max_clients,
            window: policy.window.as_secs_f64(),
        }
    }
}
