//! Error classification.
//!
//! [`ErrorCategory`] groups HTTP error statuses into a small fixed set. The
//! JSON error renderer uses it to produce stable machine-readable codes, and
//! logging uses it to tag rejections.

use http::StatusCode;
use serde::{Deserialize, Serialize};

/// Categories of errors for classification and handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    /// Malformed or unprocessable request.
    Validation,
    /// Missing or invalid credentials.
    Authentication,
    /// Permission denied.
    Authorization,
    /// Resource not found.
    NotFound,
    /// Method not supported by the resource.
    MethodNotAllowed,
    /// Client exceeded its request budget.
    RateLimited,
    /// Request or handler timed out.
    Timeout,
    /// Server temporarily unavailable.
    Unavailable,
    /// Internal server error.
    Internal,
}

impl ErrorCategory {
    /// Returns the default HTTP status code for this error category.
    #[must_use]
    pub const fn default_status_code(&self) -> StatusCode {
        match self {
            Self::Validation => StatusCode::BAD_REQUEST,
            Self::Authentication => StatusCode::UNAUTHORIZED,
            Self::Authorization => StatusCode::FORBIDDEN,
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            Self::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            Self::Timeout => StatusCode::GATEWAY_TIMEOUT,
            Self::Unavailable => StatusCode::SERVICE_UNAVAILABLE,
            Self::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Returns the machine-readable code used in error envelopes.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::Validation => "BAD_REQUEST",
            Self::Authentication => "UNAUTHORIZED",
            Self::Authorization => "FORBIDDEN",
            Self::NotFound => "NOT_FOUND",
            Self::MethodNotAllowed => "METHOD_NOT_ALLOWED",
            Self::RateLimited => "RATE_LIMITED",
            Self::Timeout => "TIMEOUT",
            Self::Unavailable => "SERVICE_UNAVAILABLE",
            Self::Internal => "INTERNAL_ERROR",
        }
    }

    /// Classifies an HTTP status.
    ///
    /// Statuses without a dedicated category fall back to `Validation` for
    /// 4xx and `Internal` for everything else.
    #[must_use]
    pub fn from_status(status: StatusCode) -> Self {
        match status {
            StatusCode::UNAUTHORIZED => Self::Authentication,
            StatusCode::FORBIDDEN => Self::Authorization,
            StatusCode::NOT_FOUND => Self::NotFound,
            StatusCode::METHOD_NOT_ALLOWED => Self::MethodNotAllowed,
            StatusCode::TOO_MANY_REQUESTS => Self::RateLimited,
            StatusCode::REQUEST_TIMEOUT | StatusCode::GATEWAY_TIMEOUT => Self::Timeout,
            StatusCode::SERVICE_UNAVAILABLE => Self::Unavailable,
            s if s.is_client_error() => Self::Validation,
            _ => Self::Internal,
        }
    }
}
