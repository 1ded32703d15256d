//! Request logging middleware.
//!
//! Emits exactly one `tracing` event per completed request with the method,
//! path, status, duration and request ID, and records the request metrics.
//! Placed inside the request ID stage so the ID is known.

use crate::context::MiddlewareContext;
use crate::middleware::{BoxFuture, Middleware, Next};
use crate::types::{Request, Response};
use std::time::Instant;

/// Middleware that logs each request once it completes.
#[derive(Debug, Clone, Copy, Default)]
pub struct LoggingMiddleware;

impl LoggingMiddleware {
    /// Creates the middleware.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl Middleware for LoggingMiddleware {
    fn name(&self) -> &'static str {
        "logging"
    }

    fn process<'a>(
        &'a self,
        ctx: &'a mut MiddlewareContext,
        request: Request,
        next: Next<'a>,
    ) -> BoxFuture<'a, Response> {
        Box::pin(async move {
            let start = Instant::now();
            let method = request.method().clone();
            let path = request.uri().path().to_string();

            let response = next.run(ctx, request).await;

            let duration = start.elapsed();
            let status = response.status().as_u16();
            let rid = ctx.request_id().map_or("", |id| id.as_str());

            tracing::info!(
                method = %method,
                path = %path,
                status,
                duration_ms = duration.as_secs_f64() * 1000.0,
                rid = %rid,
                "{} {} {} {:?}",
                method,
                path,
                status,
                duration
            );
            bfweb_telemetry::metrics::record_request(method.as_str(), status, duration);

            response
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ResponseExt;
    use bytes::Bytes;
    use http::{Request as HttpRequest, StatusCode};
    use http_body_util::Full;

    #[tokio::test]
    async fn test_passes_response_through() {
        let middleware = LoggingMiddleware::new();
        let mut ctx = MiddlewareContext::with_request_id("req-9".parse().unwrap());
        let request = HttpRequest::builder()
            .method("POST")
            .uri("/api/items")
            .body(Full::new(Bytes::new()))
            .unwrap();
        let next = Next::handler(|_ctx, _req| {
            Box::pin(async { Response::status_only(StatusCode::CREATED) })
        });

        let response = middleware.process(&mut ctx, request, next).await;
        assert_eq!(response.status(), StatusCode::CREATED);
    }

    #[test]
    fn test_middleware_name() {
        assert_eq!(LoggingMiddleware.name(), "logging");
    }
}
