//! Built-in middleware stages.
//!
//! [`Pipeline::standard`](crate::pipeline::Pipeline::standard) composes them
//! in this order:
//!
//! 1. [`cors`] - CORS headers, `OPTIONS` short-circuit
//! 2. [`rate_limit`] - per-client admission
//! 3. [`recovery`] - panic to 500
//! 4. [`request_id`] - correlation ID
//! 5. [`logging`] - one log event per request

pub mod cors;
pub mod logging;
pub mod rate_limit;
pub mod recovery;
pub mod request_id;

pub use cors::{CorsConfig, CorsMiddleware};
pub use logging::LoggingMiddleware;
pub use rate_limit::{rate_limit, RateLimitBuilder, RateLimitMiddleware};
pub use recovery::RecoveryMiddleware;
pub use request_id::{RequestIdMiddleware, REQUEST_ID_HEADER};
