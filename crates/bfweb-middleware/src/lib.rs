//! # bfweb Middleware
//!
//! Request pipeline for bfweb services.
//!
//! A [`Pipeline`] wraps a handler in an ordered list of [`Middleware`]
//! stages. Each stage may pass the request inward with [`Next::run`] or
//! answer it directly, which ends the chain.
//!
//! ## Standard Chain
//!
//! ```text
//! Request → Cors → RateLimit → Recovery → RequestId → Logging → Handler
//! ```
//!
//! | Stage      | Purpose                                             |
//! |------------|-----------------------------------------------------|
//! | Cors       | Access-Control headers, `OPTIONS` answered with 204 |
//! | RateLimit  | Bounded per-client fixed-window admission           |
//! | Recovery   | Panics become 500 responses                         |
//! | RequestId  | Correlation ID, echoed as `X-Request-ID`            |
//! | Logging    | One log event and request metrics per request       |
//!
//! Rejections (400, 429, 500) are rendered through an [`ErrorRenderer`].
//!
//! ## Example
//!
//! ```
//! use bfweb_middleware::pipeline::Pipeline;
//! use bfweb_middleware::render::default_renderer;
//! use bfweb_middleware::stages::CorsConfig;
//!
//! let pipeline = Pipeline::standard(CorsConfig::default(), None, default_renderer());
//! assert_eq!(pipeline.stage_names()[1], "rate_limit");
//! ```

#![doc(html_root_url = "https://docs.rs/bfweb-middleware/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod admission;
pub mod context;
pub mod middleware;
pub mod pipeline;
pub mod render;
pub mod stages;
pub mod types;

pub use admission::{AdmissionOutcome, ClientCounterTable, KeyExtractor, RateLimitPolicy};
pub use context::MiddlewareContext;
pub use middleware::{BoxFuture, HandlerFn, Middleware, Next};
pub use pipeline::{BoxedMiddleware, Pipeline, PipelineBuilder};
pub use render::{ErrorRenderer, SharedRenderer};
pub use stages::rate_limit;
pub use types::{Request, Response, ResponseExt};
