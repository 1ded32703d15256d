//! Common types used throughout the middleware pipeline.

use bytes::Bytes;
use http::header::{HeaderValue, CONTENT_TYPE};
use http::StatusCode;
use http_body_util::Full;

/// The HTTP request type used in the middleware pipeline.
///
/// This is a standard `http::Request` with a `Full<Bytes>` body.
pub type Request = http::Request<Full<Bytes>>;

/// The HTTP response type used in the middleware pipeline.
///
/// This is a standard `http::Response` with a `Full<Bytes>` body.
pub type Response = http::Response<Full<Bytes>>;

/// Extension trait for building simple responses.
///
/// None of these constructors can fail: the status and content types are
/// fixed, so the response is assembled directly instead of through
/// `http::response::Builder`.
pub trait ResponseExt {
    /// A response carrying only a status and an empty body.
    fn status_only(status: StatusCode) -> Response;

    /// A plain-text response.
    fn text(status: StatusCode, message: &str) -> Response;

    /// An HTML response.
    fn html(status: StatusCode, body: String) -> Response;

    /// A JSON response.
    fn json(status: StatusCode, body: &serde_json::Value) -> Response;
}

fn with_body(status: StatusCode, content_type: &'static str, body: Bytes) -> Response {
    let mut response = Response::new(Full::new(body));
    *response.status_mut() = status;
    response
        .headers_mut()
        .insert(CONTENT_TYPE, HeaderValue::from_static(content_type));
    response
}

impl ResponseExt for Response {
    fn status_only(status: StatusCode) -> Response {
        let mut response = Response::new(Full::new(Bytes::new()));
        *response.status_mut() = status;
        response
    }

    fn text(status: StatusCode, message: &str) -> Response {
        with_body(
            status,
            "text/plain; charset=utf-8",
            Bytes::from(format!("{message}\n")),
        )
    }

    fn html(status: StatusCode, body: String) -> Response {
        with_body(status, "text/html; charset=utf-8", Bytes::from(body))
    }

    fn json(status: StatusCode, body: &serde_json::Value) -> Response {
        with_body(status, "application/json", Bytes::from(body.to_string()))
    }
}
