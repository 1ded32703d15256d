//! Panic recovery middleware.
//!
//! Catches panics raised while the inner stages or the handler run, logs
//! them, and answers with a 500 from the error renderer. The panic never
//! reaches the connection task. Place it early in the chain: it only
//! protects what runs inside it.

use crate::context::MiddlewareContext;
use crate::middleware::{BoxFuture, Middleware, Next};
use crate::render::{default_renderer, SharedRenderer};
use crate::types::{Request, Response};
use bfweb_core::ErrorPage;
use futures_util::FutureExt;
use std::any::Any;
use std::fmt;
use std::panic::AssertUnwindSafe;

/// Middleware that turns panics into 500 responses.
#[derive(Clone)]
pub struct RecoveryMiddleware {
    renderer: SharedRenderer,
}

impl RecoveryMiddleware {
    /// Creates the middleware with the given renderer.
    pub fn new(renderer: SharedRenderer) -> Self {
        Self { renderer }
    }
}

impl Default for RecoveryMiddleware {
    fn default() -> Self {
        Self::new(default_renderer())
    }
}

impl fmt::Debug for RecoveryMiddleware {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RecoveryMiddleware").finish_non_exhaustive()
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(s) = payload.downcast_ref::<&'static str>() {
        s
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s
    } else {
        "<non-string panic payload>"
    }
}

impl Middleware for RecoveryMiddleware {
    fn name(&self) -> &'static str {
        "recovery"
    }

    fn process<'a>(
        &'a self,
        ctx: &'a mut MiddlewareContext,
        request: Request,
        next: Next<'a>,
    ) -> BoxFuture<'a, Response> {
        Box::pin(async move {
            let path = request.uri().path().to_string();

            match AssertUnwindSafe(next.run(ctx, request)).catch_unwind().await {
                Ok(response) => response,
                Err(payload) => {
                    let rid = ctx.request_id().map_or("", |id| id.as_str());
                    tracing::error!(
                        path = %path,
                        rid = %rid,
                        panic = panic_message(payload.as_ref()),
                        "panic while handling request"
                    );
                    bfweb_telemetry::metrics::record_panic();
                    self.renderer.render(&ErrorPage::internal_server_error(path))
                }
            }
        })
    }
}
