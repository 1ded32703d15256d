//! Request admission for the rate limiter.
//!
//! Admission is a fixed-window counter per client:
//!
//! 1. A [`KeyExtractor`] derives the client key (by default the host of the
//!    transport origin). Failure means the request is malformed.
//! 2. Under one lock, the [`ClientCounterTable`] clears itself if the window
//!    has expired, rejects the request if the key is new and the table is
//!    full, and otherwise increments the key's count.
//! 3. A post-increment count above `max_requests` is a rejection.
//!
//! The window is fixed, not sliding: a client can spend its whole budget at
//! the end of one window and again at the start of the next. Nothing is
//! evicted mid-window; once `max_clients` keys are tracked, new clients wait
//! for the next reset.

mod client;
mod clock;
mod policy;
mod table;

pub use client::{split_host, ClientIdentityError, KeyExtractor, FORWARDED_FOR_HEADER};
pub use clock::{Clock, ManualClock, SystemClock};
pub use policy::{
    PolicyError, RateLimitPolicy, DEFAULT_MAX_CLIENTS, DEFAULT_MAX_REQUESTS, DEFAULT_WINDOW,
    MAX_WINDOW,
};
pub use table::{AdmissionDecision, ClientCounterTable};

/// What the rate limiter decided for one request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AdmissionOutcome {
    /// The request may proceed.
    Allowed,
    /// The client is new and the table already tracks `max_clients` keys.
    RejectedNewClientCapacityExceeded,
    /// The client has used up its budget for this window.
    RejectedRequestLimitExceeded,
    /// No client key could be derived from the request.
    RejectedMalformedClientIdentity,
}

impl AdmissionOutcome {
    /// Returns `true` for [`AdmissionOutcome::Allowed`].
    #[must_use]
    pub fn is_allowed(&self) -> bool {
        matches!(self, Self::Allowed)
    }

    /// Stable label used in metrics and logs.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Allowed => "allowed",
            Self::RejectedNewClientCapacityExceeded => "capacity_exceeded",
            Self::RejectedRequestLimitExceeded => "limit_exceeded",
            Self::RejectedMalformedClientIdentity => "malformed_identity",
        }
    }
}
