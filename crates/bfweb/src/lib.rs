//! # bfweb
//!
//! **A small HTTP service kit built around a rate-limited middleware
//! pipeline.**
//!
//! - A bounded-memory, per-client fixed-window rate limiter
//! - Request ids, structured request logging, panic recovery and CORS
//! - Error pages rendered as bare statuses, JSON or HTML templates
//! - A hyper server with read/write timeouts and graceful shutdown
//! - File and environment configuration for all of the above
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use bfweb::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = ConfigLoader::new().with_env_prefix("BFWEB").load()?;
//!     let renderer = bfweb::error_renderer(&config)?;
//!     let pipeline = bfweb::standard_pipeline(&config, renderer);
//!
//!     Server::new(config.server, pipeline, |_ctx, _req| {
//!         Box::pin(async { Response::text(StatusCode::OK, "hello") })
//!     })
//!     .run()
//!     .await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! Request → Cors → RateLimit → Recovery → RequestId → Logging → Handler
//! ```

#![doc(html_root_url = "https://docs.rs/bfweb/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

use std::sync::Arc;

pub use bfweb_config as config;
pub use bfweb_core as core;
pub use bfweb_middleware as middleware;
pub use bfweb_server as server;
pub use bfweb_telemetry as telemetry;

pub mod template;

use bfweb_config::{ConfigError, ServiceConfig};
use bfweb_middleware::render::{JsonErrorRenderer, SharedRenderer};
use bfweb_middleware::Pipeline;

pub use template::ErrorTemplate;

/// Builds the renderer a service configuration asks for.
///
/// With `error_template` set, error pages are the filled template; otherwise
/// they are the JSON envelope.
///
/// # Errors
///
/// Returns a [`ConfigError`] if the template file cannot be read.
pub fn error_renderer(config: &ServiceConfig) -> Result<SharedRenderer, ConfigError> {
    match &config.error_template {
        Some(path) => {
            let template = ErrorTemplate::load(path)?;
            tracing::debug!(path = %path.display(), "Loaded error page template");
            Ok(Arc::new(template.into_renderer()))
        }
        None => Ok(Arc::new(JsonErrorRenderer)),
    }
}

/// Builds the standard pipeline from the CORS and rate limit sections.
#[must_use]
pub fn standard_pipeline(config: &ServiceConfig, renderer: SharedRenderer) -> Pipeline {
    Pipeline::standard(config.cors.clone(), Some(config.rate_limit), renderer)
}

/// Prelude module for convenient imports.
///
/// ```rust
/// use bfweb::prelude::*;
/// ```
pub mod prelude {
    pub use bfweb_config::{ConfigFile, ConfigLoader, ServiceConfig};
    pub use bfweb_core::{ClientOrigin, ErrorPage, RequestId};
    pub use bfweb_middleware::{
        BoxFuture, Middleware, MiddlewareContext, Pipeline, RateLimitPolicy, Request, Response,
        ResponseExt,
    };
    pub use bfweb_server::{Server, ServerConfig, ShutdownSignal};
    pub use http::StatusCode;
}
