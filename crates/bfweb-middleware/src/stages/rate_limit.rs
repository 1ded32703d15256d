//! Rate limiting middleware.
//!
//! Enforces a [`RateLimitPolicy`] per client with a bounded, fixed-window
//! counter table (see [`crate::admission`]). Rejections terminate the chain:
//!
//! | Outcome                                  | Response |
//! |------------------------------------------|----------|
//! | client key cannot be derived             | 400      |
//! | new client while the table is full       | 429      |
//! | client over its budget for the window    | 429      |
//!
//! Both 429 variants carry `Retry-After` with the whole seconds left in the
//! current window. They look identical to the caller and are told apart in
//! logs and in the `bfweb_admission_total` metric.
//!
//! ## Example
//!
//! ```ignore
//! use bfweb_middleware::stages::RateLimitMiddleware;
//! use bfweb_middleware::admission::RateLimitPolicy;
//! use std::time::Duration;
//!
//! let policy = RateLimitPolicy::new(100, 1000, Duration::from_secs(60))?;
//! let rate_limit = RateLimitMiddleware::new(Some(policy));
//! ```

use crate::admission::{
    AdmissionDecision, AdmissionOutcome, ClientCounterTable, Clock, KeyExtractor, RateLimitPolicy,
    SystemClock,
};
use crate::context::MiddlewareContext;
use crate::middleware::{BoxFuture, Middleware, Next};
use crate::render::{default_renderer, SharedRenderer};
use crate::types::{Request, Response};
use bfweb_core::ErrorPage;
use http::header::{HeaderValue, RETRY_AFTER};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// Rate limiting middleware.
///
/// Clones share one counter table.
#[derive(Clone)]
pub struct RateLimitMiddleware {
    table: Arc<ClientCounterTable>,
    key_extractor: KeyExtractor,
    renderer: SharedRenderer,
}

impl RateLimitMiddleware {
    /// Creates the middleware with the given policy, or the default policy
    /// (100 requests per client, 1000 clients, 60 second window).
    pub fn new(policy: Option<RateLimitPolicy>) -> Self {
        Self::builder().policy(policy.unwrap_or_default()).build()
    }

    /// Returns a builder.
    pub fn builder() -> RateLimitBuilder {
        RateLimitBuilder::default()
    }

    /// The counter table backing this middleware.
    pub fn table(&self) -> &ClientCounterTable {
        &self.table
    }

    /// The enforced policy.
    pub fn policy(&self) -> &RateLimitPolicy {
        self.table.policy()
    }

    /// Classifies a request, counting it if a client key can be derived.
    ///
    /// A request without a usable key leaves the table untouched.
    pub fn evaluate(&self, request: &Request) -> (Option<String>, AdmissionDecision) {
        match self.key_extractor.extract(request) {
            Ok(key) => {
                let decision = self.table.decide(&key);
                (Some(key), decision)
            }
            Err(e) => {
                tracing::debug!(error = %e, "Client identity could not be derived");
                (
                    None,
                    AdmissionDecision {
                        outcome: AdmissionOutcome::RejectedMalformedClientIdentity,
                        reset_in: Duration::ZERO,
                    },
                )
            }
        }
    }

    fn too_many_requests(&self, path: String, reset_in: Duration) -> Response {
        let mut response = self.renderer.render(&ErrorPage::too_many_requests(path));
        let retry_after = retry_after_secs(reset_in);
        response
            .headers_mut()
            .insert(RETRY_AFTER, HeaderValue::from(retry_after));
        response
    }
}

/// Whole seconds until the window resets, rounded up, never less than 1.
fn retry_after_secs(reset_in: Duration) -> u64 {
    let secs = reset_in.as_secs() + u64::from(reset_in.subsec_nanos() > 0);
    secs.max(1)
}

impl fmt::Debug for RateLimitMiddleware {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RateLimitMiddleware")
            .field("policy", self.policy())
            .field("key_extractor", &self.key_extractor)
            .finish_non_exhaustive()
    }
}

impl Default for RateLimitMiddleware {
    fn default() -> Self {
        Self::new(None)
    }
}

/// Creates a rate limiting stage with the given policy, or the defaults.
///
/// Each call owns a fresh counter table; share a limiter between pipelines
/// by cloning the returned middleware.
pub fn rate_limit(policy: Option<RateLimitPolicy>) -> RateLimitMiddleware {
    RateLimitMiddleware::new(policy)
}

/// Builder for [`RateLimitMiddleware`].
pub struct RateLimitBuilder {
    policy: RateLimitPolicy,
    clock: Arc<dyn Clock>,
    key_extractor: KeyExtractor,
    renderer: SharedRenderer,
}

impl Default for RateLimitBuilder {
    fn default() -> Self {
        Self {
            policy: RateLimitPolicy::default(),
            clock: Arc::new(SystemClock),
            key_extractor: KeyExtractor::default(),
            renderer: default_renderer(),
        }
    }
}

impl RateLimitBuilder {
    /// Sets the policy.
    #[must_use]
    pub fn policy(mut self, policy: RateLimitPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Sets the clock used for window bookkeeping.
    #[must_use]
    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Sets how client keys are derived.
    #[must_use]
    pub fn key_extractor(mut self, key_extractor: KeyExtractor) -> Self {
        self.key_extractor = key_extractor;
        self
    }

    /// Sets the renderer for 400 and 429 responses.
    #[must_use]
    pub fn renderer(mut self, renderer: SharedRenderer) -> Self {
        self.renderer = renderer;
        self
    }

    /// Builds the middleware with a fresh counter table.
    pub fn build(self) -> RateLimitMiddleware {
        RateLimitMiddleware {
            table: Arc::new(ClientCounterTable::with_clock(self.policy, self.clock)),
            key_extractor: self.key_extractor,
            renderer: self.renderer,
        }
    }
}

impl Middleware for RateLimitMiddleware {
    fn name(&self) -> &'static str {
        "rate_limit"
    }

    fn process<'a>(
        &'a self,
        ctx: &'a mut MiddlewareContext,
        request: Request,
        next: Next<'a>,
    ) -> BoxFuture<'a, Response> {
        Box::pin(async move {
            let (key, decision) = self.evaluate(&request);
            bfweb_telemetry::metrics::record_admission(decision.outcome.label());

            let path = request.uri().path().to_string();
            let client = key.as_deref().unwrap_or("-");

            match decision.outcome {
                AdmissionOutcome::Allowed => next.run(ctx, request).await,
                AdmissionOutcome::RejectedMalformedClientIdentity => {
                    tracing::warn!(path = %path, "Rejecting request with malformed client identity");
                    self.renderer.render(&ErrorPage::bad_request(path))
                }
                AdmissionOutcome::RejectedNewClientCapacityExceeded => {
                    tracing::warn!(
                        client = %client,
                        tracked = self.policy().max_clients(),
                        "Rate limiter at client capacity, rejecting new client"
                    );
                    self.too_many_requests(path, decision.reset_in)
                }
                AdmissionOutcome::RejectedRequestLimitExceeded => {
                    tracing::info!(
                        client = %client,
                        limit = self.policy().max_requests(),
                        "Client exceeded request limit"
                    );
                    self.too_many_requests(path, decision.reset_in)
                }
            }
        })
    }
}
