//! Error page payloads.

use crate::error::ErrorCategory;
use http::StatusCode;
use serde::{Deserialize, Serialize};

/// Everything an error renderer needs to produce an error response.
///
/// # Example
///
/// ```
/// use bfweb_core::ErrorPage;
/// use http::StatusCode;
///
/// let page = ErrorPage::bad_request("/upload");
/// assert_eq!(page.status(), StatusCode::BAD_REQUEST);
/// assert_eq!(page.title, "Bad Request");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorPage {
    /// Numeric HTTP status code.
    pub code: u16,
    /// Short title, e.g. "Not Found".
    pub title: String,
    /// Human-readable explanation.
    pub message: String,
    /// Path of the request that failed.
    pub path: String,
}

impl ErrorPage {
    /// Creates a page for an arbitrary status.
    pub fn new(
        status: StatusCode,
        title: impl Into<String>,
        message: impl Into<String>,
        path: impl Into<String>,
    ) -> Self {
        Self {
            code: status.as_u16(),
            title: title.into(),
            message: message.into(),
            path: path.into(),
        }
    }

    /// Returns the status as a [`StatusCode`].
    ///
    /// Out-of-range codes are reported as 500.
    #[must_use]
    pub fn status(&self) -> StatusCode {
        StatusCode::from_u16(self.code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }

    /// Returns the category of this page's status.
    #[must_use]
    pub fn category(&self) -> ErrorCategory {
        ErrorCategory::from_status(self.status())
    }

    /// 400 Bad Request.
    pub fn bad_request(path: impl Into<String>) -> Self {
        Self::new(
            StatusCode::BAD_REQUEST,
            "Bad Request",
            "The request could not be processed.",
            path,
        )
    }

    /// 401 Unauthorized.
    pub fn unauthorized(path: impl Into<String>) -> Self {
        Self::new(
            StatusCode::UNAUTHORIZED,
            "Unauthorized",
            "You must authenticate to access this resource.",
            path,
        )
    }

    /// 403 Forbidden.
    pub fn forbidden(path: impl Into<String>) -> Self {
        Self::new(
            StatusCode::FORBIDDEN,
            "Forbidden",
            "You do not have permission to access this resource.",
            path,
        )
    }

    /// 404 Not Found.
    pub fn not_found(path: impl Into<String>) -> Self {
        Self::new(
            StatusCode::NOT_FOUND,
            "Not Found",
            "The requested page does not exist.",
            path,
        )
    }

    /// 405 Method Not Allowed.
    pub fn method_not_allowed(path: impl Into<String>) -> Self {
        Self::new(
            StatusCode::METHOD_NOT_ALLOWED,
            "Method Not Allowed",
            "The HTTP method used is not allowed for this resource.",
            path,
        )
    }

    /// 429 Too Many Requests.
    pub fn too_many_requests(path: impl Into<String>) -> Self {
        Self::new(
            StatusCode::TOO_MANY_REQUESTS,
            "Too Many Requests",
            "You have sent too many requests in a given amount of time. Please try again later.",
            path,
        )
    }

    /// 500 Internal Server Error.
    pub fn internal_server_error(path: impl Into<String>) -> Self {
        Self::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            "Internal Server Error",
            "An error occurred on the server.",
            path,
        )
    }

    /// 503 Service Unavailable.
    pub fn service_unavailable(path: impl Into<String>) -> Self {
        Self::new(
            StatusCode::SERVICE_UNAVAILABLE,
            "Service Unavailable",
            "The server is currently unavailable. Please try again later.",
            path,
        )
    }

    /// 504 Gateway Timeout.
    pub fn gateway_timeout(path: impl Into<String>) -> Self {
        Self::new(
            StatusCode::GATEWAY_TIMEOUT,
            "Gateway Timeout",
            "The server did not finish the request in time.",
            path,
        )
    }
}
