//! Request ID middleware.
//!
//! Assigns each request a correlation ID and echoes it in the `X-Request-ID`
//! response header.
//!
//! ## Request ID Sources
//!
//! 1. **Context**: an ID already assigned upstream is kept as is
//! 2. **X-Request-ID header**: reused when incoming IDs are trusted and the
//!    value is 1 to 128 visible ASCII characters
//! 3. **Generated UUID v7** otherwise

use crate::context::MiddlewareContext;
use crate::middleware::{BoxFuture, Middleware, Next};
use crate::types::{Request, Response};
use bfweb_core::RequestId;
use http::HeaderValue;

/// The header name for request ID propagation.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Middleware that assigns request IDs.
#[derive(Debug, Clone)]
pub struct RequestIdMiddleware {
    /// Whether to reuse IDs from the `X-Request-ID` request header.
    trust_incoming: bool,
}

impl RequestIdMiddleware {
    /// Creates the middleware, reusing valid incoming IDs.
    #[must_use]
    pub fn new() -> Self {
        Self {
            trust_incoming: true,
        }
    }

    /// Creates a middleware that always generates a fresh ID.
    ///
    /// Use this at an edge where clients should not pick their own IDs.
    #[must_use]
    pub fn untrusted() -> Self {
        Self {
            trust_incoming: false,
        }
    }

    fn incoming_id(&self, request: &Request) -> Option<RequestId> {
        if !self.trust_incoming {
            return None;
        }

        request
            .headers()
            .get(REQUEST_ID_HEADER)
            .and_then(|value| value.to_str().ok())
            .and_then(|s| s.parse().ok())
    }
}

impl Default for RequestIdMiddleware {
    fn default() -> Self {
        Self::new()
    }
}

impl Middleware for RequestIdMiddleware {
    fn name(&self) -> &'static str {
        "request_id"
    }

    fn process<'a>(
        &'a self,
        ctx: &'a mut MiddlewareContext,
        request: Request,
        next: Next<'a>,
    ) -> BoxFuture<'a, Response> {
        Box::pin(async move {
            if ctx.request_id().is_none() {
                let id = self
                    .incoming_id(&request)
                    .unwrap_or_else(RequestId::generate);
                ctx.set_request_id(id);
            }

            let header = ctx
                .request_id()
                .and_then(|id| HeaderValue::from_str(id.as_str()).ok());

            let mut response = next.run(ctx, request).await;

            if let Some(value) = header {
                response.headers_mut().insert(REQUEST_ID_HEADER, value);
            }

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

    fn request(incoming: Option<&str>) -> Request {
        let mut builder = HttpRequest::builder().uri("/test");
        if let Some(id) = incoming {
            builder = builder.header(REQUEST_ID_HEADER, id);
        }
        builder.body(Full::new(Bytes::new())).unwrap()
    }

    fn ok<'a>() -> Next<'a> {
        Next::handler(|_ctx, _req| Box::pin(async { Response::status_only(StatusCode::OK) }))
    }

    fn header(response: &Response) -> &str {
        response
            .headers()
            .get(REQUEST_ID_HEADER)
            .unwrap()
            .to_str()
            .unwrap()
    }

    #[tokio::test]
    async fn test_generates_request_id_when_missing() {
        let middleware = RequestIdMiddleware::new();
        let mut ctx = MiddlewareContext::new();

        let response = middleware.process(&mut ctx, request(None), ok()).await;

        let id = header(&response);
        assert!(!id.is_empty());
        assert_eq!(ctx.request_id().unwrap().as_str(), id);
    }

    #[tokio::test]
    async fn test_reuses_incoming_id() {
        let middleware = RequestIdMiddleware::new();
        let mut ctx = MiddlewareContext::new();

        let response = middleware
            .process(&mut ctx, request(Some("upstream-42")), ok())
            .await;

        assert_eq!(header(&response), "upstream-42");
        assert_eq!(ctx.request_id().unwrap().as_str(), "upstream-42");
    }

    #[tokio::test]
    async fn test_replaces_invalid_incoming_id() {
        let middleware = RequestIdMiddleware::new();
        let mut ctx = MiddlewareContext::new();
        let oversized = "x".repeat(200);

        let response = middleware
            .process(&mut ctx, request(Some(&oversized)), ok())
            .await;

        assert_ne!(header(&response), oversized);
    }

    #[tokio::test]
    async fn test_untrusted_ignores_incoming_id() {
        let middleware = RequestIdMiddleware::untrusted();
        let mut ctx = MiddlewareContext::new();

        let response = middleware
            .process(&mut ctx, request(Some("upstream-42")), ok())
            .await;

        assert_ne!(header(&response), "upstream-42");
    }

    #[tokio::test]
    async fn test_keeps_id_already_in_context() {
        let middleware = RequestIdMiddleware::new();
        let mut ctx = MiddlewareContext::with_request_id("outer".parse().unwrap());

        let response = middleware
            .process(&mut ctx, request(Some("upstream-42")), ok())
            .await;

        assert_eq!(header(&response), "outer");
        assert_eq!(ctx.request_id().unwrap().as_str(), "outer");
    }

    #[test]
    fn test_middleware_name() {
        assert_eq!(RequestIdMiddleware::default().name(), "request_id");
    }
}
