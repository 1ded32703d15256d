//! CORS (Cross-Origin Resource Sharing) middleware.
//!
//! Adds the configured `Access-Control-*` headers to every response that
//! passes through it, including rejections produced by inner stages. Any
//! `OPTIONS` request is answered here with `204 No Content` and never
//! reaches the inner stages or the handler.
//!
//! ## Allow-Origin
//!
//! - `"*"` in `allowed_origins`: `*`, or the request's own origin when
//!   credentials are allowed (browsers reject `*` with credentials)
//! - otherwise the request's `Origin` is echoed if it is listed, together
//!   with `Vary: Origin`; unlisted origins get no allow-origin header

use crate::context::MiddlewareContext;
use crate::middleware::{BoxFuture, Middleware, Next};
use crate::types::{Request, Response, ResponseExt};
use http::header::{HeaderMap, HeaderValue};
use http::{Method, StatusCode};
use serde::{Deserialize, Serialize};

/// CORS header names.
pub mod headers {
    /// Access-Control-Allow-Origin header.
    pub const ALLOW_ORIGIN: &str = "access-control-allow-origin";
    /// Access-Control-Allow-Methods header.
    pub const ALLOW_METHODS: &str = "access-control-allow-methods";
    /// Access-Control-Allow-Headers header.
    pub const ALLOW_HEADERS: &str = "access-control-allow-headers";
    /// Access-Control-Allow-Credentials header.
    pub const ALLOW_CREDENTIALS: &str = "access-control-allow-credentials";
    /// Access-Control-Max-Age header.
    pub const MAX_AGE: &str = "access-control-max-age";
    /// Origin header.
    pub const ORIGIN: &str = "origin";
    /// Vary header.
    pub const VARY: &str = "vary";
}

/// CORS configuration.
///
/// Every field is optional when deserializing; missing fields take the
/// permissive defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CorsConfig {
    /// Allowed origins; `"*"` allows any.
    pub allowed_origins: Vec<String>,
    /// Allowed methods.
    pub allowed_methods: Vec<String>,
    /// Allowed request headers.
    pub allowed_headers: Vec<String>,
    /// Whether credentials (cookies, auth headers) are allowed.
    pub allow_credentials: bool,
    /// Preflight cache duration in seconds; 0 omits the header.
    pub max_age: u64,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            allowed_origins: vec!["*".to_string()],
            allowed_methods: ["GET", "POST", "PUT", "DELETE", "OPTIONS"]
                .into_iter()
                .map(String::from)
                .collect(),
            allowed_headers: vec!["Content-Type".to_string(), "Authorization".to_string()],
            allow_credentials: false,
            max_age: 600,
        }
    }
}

/// CORS middleware.
///
/// Header values are computed once at construction.
#[derive(Debug, Clone)]
pub struct CorsMiddleware {
    any_origin: bool,
    allowed_origins: Vec<String>,
    allow_credentials: bool,
    static_headers: HeaderMap,
}

impl CorsMiddleware {
    /// Creates the middleware from a configuration.
    ///
    /// List entries that are not valid header text are dropped with a
    /// warning.
    pub fn new(config: CorsConfig) -> Self {
        let mut static_headers = HeaderMap::new();

        insert_joined(&mut static_headers, headers::ALLOW_METHODS, &config.allowed_methods);
        insert_joined(&mut static_headers, headers::ALLOW_HEADERS, &config.allowed_headers);
        if config.allow_credentials {
            static_headers.insert(headers::ALLOW_CREDENTIALS, HeaderValue::from_static("true"));
        }
        if config.max_age > 0 {
            static_headers.insert(headers::MAX_AGE, HeaderValue::from(config.max_age));
        }

        Self {
            any_origin: config.allowed_origins.iter().any(|o| o == "*"),
            allowed_origins: config.allowed_origins,
            allow_credentials: config.allow_credentials,
            static_headers,
        }
    }

    /// Creates the middleware with the permissive defaults.
    pub fn permissive() -> Self {
        Self::new(CorsConfig::default())
    }

    fn allow_origin(&self, origin: Option<&HeaderValue>) -> Option<(HeaderValue, bool)> {
        if self.any_origin {
            return match origin {
                Some(origin) if self.allow_credentials => Some((origin.clone(), true)),
                _ => Some((HeaderValue::from_static("*"), false)),
            };
        }

        let origin = origin?;
        let text = origin.to_str().ok()?;
        self.allowed_origins
            .iter()
            .any(|allowed| allowed.eq_ignore_ascii_case(text))
            .then(|| (origin.clone(), true))
    }

    fn apply(&self, response: &mut Response, origin: Option<&HeaderValue>) {
        let map = response.headers_mut();
        for (name, value) in &self.static_headers {
            map.insert(name.clone(), value.clone());
        }
        if let Some((value, varies)) = self.allow_origin(origin) {
            map.insert(headers::ALLOW_ORIGIN, value);
            if varies {
                map.append(headers::VARY, HeaderValue::from_static("Origin"));
            }
        }
    }
}

fn insert_joined(map: &mut HeaderMap, name: &'static str, values: &[String]) {
    if values.is_empty() {
        return;
    }
    match HeaderValue::from_str(&values.join(", ")) {
        Ok(value) => {
            map.insert(name, value);
        }
        Err(_) => tracing::warn!(header = name, ?values, "Ignoring invalid CORS header value"),
    }
}

impl Default for CorsMiddleware {
    fn default() -> Self {
        Self::permissive()
    }
}

impl Middleware for CorsMiddleware {
    fn name(&self) -> &'static str {
        "cors"
    }

    fn process<'a>(
        &'a self,
        ctx: &'a mut MiddlewareContext,
        request: Request,
        next: Next<'a>,
    ) -> BoxFuture<'a, Response> {
        Box::pin(async move {
            let origin = request.headers().get(headers::ORIGIN).cloned();

            let mut response = if request.method() == Method::OPTIONS {
                Response::status_only(StatusCode::NO_CONTENT)
            } else {
                next.run(ctx, request).await
            };

            self.apply(&mut response, origin.as_ref());
            response
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use http::Request as HttpRequest;
    use http_body_util::Full;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;

    fn request(method: Method, origin: Option<&str>) -> Request {
        let mut builder = HttpRequest::builder().method(method).uri("/api");
        if let Some(origin) = origin {
            builder = builder.header(headers::ORIGIN, origin);
        }
        builder.body(Full::new(Bytes::new())).unwrap()
    }

    async fn run(middleware: &CorsMiddleware, request: Request) -> (Response, bool) {
        let reached = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&reached);
        let mut ctx = MiddlewareContext::new();
        let next = Next::handler(move |_ctx, _req| {
            flag.store(true, Ordering::SeqCst);
            Box::pin(async { Response::status_only(StatusCode::OK) })
        });
        let response = middleware.process(&mut ctx, request, next).await;
        (response, reached.load(Ordering::SeqCst))
    }

    fn header<'r>(response: &'r Response, name: &str) -> Option<&'r str> {
        response.headers().get(name).and_then(|v| v.to_str().ok())
    }

    #[test]
    fn test_default_config() {
        let config = CorsConfig::default();
        assert_eq!(config.allowed_origins, vec!["*"]);
        assert_eq!(
            config.allowed_methods,
            vec!["GET", "POST", "PUT", "DELETE", "OPTIONS"]
        );
        assert_eq!(config.allowed_headers, vec!["Content-Type", "Authorization"]);
        assert!(!config.allow_credentials);
        assert_eq!(config.max_age, 600);
    }

    #[tokio::test]
    async fn test_default_headers_on_simple_request() {
        let middleware = CorsMiddleware::permissive();
        let (response, reached) = run(&middleware, request(Method::GET, None)).await;

        assert!(reached);
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(header(&response, headers::ALLOW_ORIGIN), Some("*"));
        assert_eq!(
            header(&response, headers::ALLOW_METHODS),
            Some("GET, POST, PUT, DELETE, OPTIONS")
        );
        assert_eq!(
            header(&response, headers::ALLOW_HEADERS),
            Some("Content-Type, Authorization")
        );
        assert_eq!(header(&response, headers::MAX_AGE), Some("600"));
        assert_eq!(header(&response, headers::ALLOW_CREDENTIALS), None);
    }

    #[tokio::test]
    async fn test_options_short_circuits_with_204() {
        let middleware = CorsMiddleware::permissive();
        let (response, reached) =
            run(&middleware, request(Method::OPTIONS, Some("https://a.example"))).await;

        assert!(!reached);
        assert_eq!(response.status(), StatusCode::NO_CONTENT);
        assert_eq!(header(&response, headers::ALLOW_ORIGIN), Some("*"));
    }

    #[tokio::test]
    async fn test_listed_origin_is_echoed() {
        let middleware = CorsMiddleware::new(CorsConfig {
            allowed_origins: vec!["https://app.example".to_string()],
            ..CorsConfig::default()
        });

        let (response, _) =
            run(&middleware, request(Method::GET, Some("https://app.example"))).await;
        assert_eq!(
            header(&response, headers::ALLOW_ORIGIN),
            Some("https://app.example")
        );
        assert_eq!(header(&response, headers::VARY), Some("Origin"));
    }

    #[tokio::test]
    async fn test_unlisted_origin_gets_no_allow_origin() {
        let middleware = CorsMiddleware::new(CorsConfig {
            allowed_origins: vec!["https://app.example".to_string()],
            ..CorsConfig::default()
        });

        let (response, reached) =
            run(&middleware, request(Method::GET, Some("https://evil.example"))).await;
        assert!(reached);
        assert_eq!(header(&response, headers::ALLOW_ORIGIN), None);
    }

    #[tokio::test]
    async fn test_credentials_with_wildcard_echo_origin() {
        let middleware = CorsMiddleware::new(CorsConfig {
            allow_credentials: true,
            ..CorsConfig::default()
        });

        let (response, _) =
            run(&middleware, request(Method::GET, Some("https://app.example"))).await;
        assert_eq!(
            header(&response, headers::ALLOW_ORIGIN),
            Some("https://app.example")
        );
        assert_eq!(header(&response, headers::ALLOW_CREDENTIALS), Some("true"));
    }

    #[tokio::test]
    async fn test_zero_max_age_omits_header() {
        let middleware = CorsMiddleware::new(CorsConfig {
            max_age: 0,
            ..CorsConfig::default()
        });

        let (response, _) = run(&middleware, request(Method::GET, None)).await;
        assert_eq!(header(&response, headers::MAX_AGE), None);
    }

    #[test]
    fn test_config_deserializes_partially() {
        let config: CorsConfig =
            serde_json::from_str(r#"{"allowed_origins": ["https://x.example"]}"#).unwrap();
        assert_eq!(config.allowed_origins, vec!["https://x.example"]);
        assert_eq!(config.max_age, 600);
    }
}
