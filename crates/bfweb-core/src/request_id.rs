//! Request correlation identifiers.
//!
//! A [`RequestId`] is either taken from the caller's `X-Request-ID` header or
//! generated as a UUID v7. Incoming values are not required to be UUIDs, but
//! they must be safe to echo back in a response header and to write to logs.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use uuid::Uuid;

/// Longest incoming request ID that will be accepted.
pub const MAX_REQUEST_ID_LEN: usize = 128;

/// Unique identifier for a single request.
///
/// # Example
///
/// ```
/// use bfweb_core::RequestId;
///
/// let id: RequestId = "req-42".parse().unwrap();
/// assert_eq!(id.as_str(), "req-42");
///
/// assert!("".parse::<RequestId>().is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RequestId(String);

/// Returned when a string cannot be used as a request ID.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid request id: {reason}")]
pub struct InvalidRequestId {
    reason: &'static str,
}

impl RequestId {
    /// Generates a new time-ordered request ID (UUID v7).
    #[must_use]
    pub fn generate() -> Self {
        Self(Uuid::now_v7().to_string())
    }

    /// Returns the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    fn validate(value: &str) -> Result<(), InvalidRequestId> {
        if value.is_empty() {
            return Err(InvalidRequestId { reason: "empty" });
        }
        if value.len() > MAX_REQUEST_ID_LEN {
            return Err(InvalidRequestId { reason: "too long" });
        }
        if !value.bytes().all(|b| b.is_ascii_graphic()) {
            return Err(InvalidRequestId {
                reason: "contains non-visible characters",
            });
        }
        Ok(())
    }
}

impl FromStr for RequestId {
    type Err = InvalidRequestId;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::validate(s)?;
        Ok(Self(s.to_string()))
    }
}

impl TryFrom<String> for RequestId {
    type Error = InvalidRequestId;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::validate(&value)?;
        Ok(Self(value))
    }
}

impl From<RequestId> for String {
    fn from(id: RequestId) -> Self {
        id.0
    }
}

impl From<Uuid> for RequestId {
    fn from(uuid: Uuid) -> Self {
        Self(uuid.to_string())
    }
}

impl AsRef<str> for RequestId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_ids_are_uuid_v7() {
        let id = RequestId::generate();
        let uuid = Uuid::parse_str(id.as_str()).unwrap();
        assert_eq!(uuid.get_version_num(), 7);
    }

    #[test]
    fn test_generated_ids_are_unique() {
        let a = RequestId::generate();
        let b = RequestId::generate();
        assert_ne!(a, b);
    }

    #[test]
    fn test_parse_accepts_opaque_tokens() {
        let id: RequestId = "abc-123_XYZ.7".parse().unwrap();
        assert_eq!(id.to_string(), "abc-123_XYZ.7");
    }

    #[test]
    fn test_parse_rejects_empty() {
        assert!("".parse::<RequestId>().is_err());
    }

    #[test]
    fn test_parse_rejects_whitespace_and_control() {
        assert!("two words".parse::<RequestId>().is_err());
        assert!("line\nbreak".parse::<RequestId>().is_err());
    }

    #[test]
    fn test_parse_rejects_oversized() {
        let long = "a".repeat(MAX_REQUEST_ID_LEN + 1);
        assert!(long.parse::<RequestId>().is_err());

        let max = "a".repeat(MAX_REQUEST_ID_LEN);
        assert!(max.parse::<RequestId>().is_ok());
    }

    #[test]
    fn test_serde_transparent() {
        let id: RequestId = "req-1".parse().unwrap();
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"req-1\"");

        let bad: Result<RequestId, _> = serde_json::from_str("\"\"");
        assert!(bad.is_err());
    }
}
