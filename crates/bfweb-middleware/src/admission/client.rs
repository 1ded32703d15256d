//! Client identity extraction.
//!
//! The rate limiter buckets requests by a client key. By default the key is
//! the host part of the transport origin (`host:port`), so every connection
//! from one address shares a budget regardless of source port.

use crate::types::Request;
use bfweb_core::ClientOrigin;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

/// Header consulted by [`KeyExtractor::ForwardedFor`].
pub const FORWARDED_FOR_HEADER: &str = "x-forwarded-for";

/// Why a client key could not be derived.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ClientIdentityError {
    /// The request carries no transport origin.
    #[error("request has no client origin")]
    MissingOrigin,

    /// No `:port` suffix.
    #[error("missing port in address")]
    MissingPort,

    /// An unbracketed host containing colons.
    #[error("too many colons in address")]
    TooManyColons,

    /// `[` without a matching `]`.
    #[error("missing ']' in address")]
    MissingBracket,

    /// A stray `[` or `]`.
    #[error("unexpected bracket in address")]
    UnexpectedBracket,

    /// A custom extractor produced no key.
    #[error("client key could not be determined")]
    Unidentified,
}

/// Returns the host component of a `host:port` or `[host]:port` string.
///
/// An empty host (`":80"`) and an empty port (`"host:"`) are both accepted.
///
/// ```
/// use bfweb_middleware::admission::split_host;
///
/// assert_eq!(split_host("1.2.3.4:80"), Ok("1.2.3.4"));
/// assert_eq!(split_host("[::1]:8080"), Ok("::1"));
/// assert!(split_host("1.2.3.4").is_err());
/// ```
pub fn split_host(origin: &str) -> Result<&str, ClientIdentityError> {
    let colon = origin.rfind(':').ok_or(ClientIdentityError::MissingPort)?;

    let (host, host_start, host_end) = if origin.starts_with('[') {
        let close = origin.find(']').ok_or(ClientIdentityError::MissingBracket)?;
        let after = close + 1;
        if after == origin.len() {
            return Err(ClientIdentityError::MissingPort);
        }
        if after != colon {
            return Err(if origin.as_bytes()[after] == b':' {
                ClientIdentityError::TooManyColons
            } else {
                ClientIdentityError::MissingPort
            });
        }
        (&origin[1..close], 1, after)
    } else {
        let host = &origin[..colon];
        if host.contains(':') {
            return Err(ClientIdentityError::TooManyColons);
        }
        (host, 0, 0)
    };

    if origin[host_start..].contains('[') || origin[host_end..].contains(']') {
        return Err(ClientIdentityError::UnexpectedBracket);
    }

    Ok(host)
}

/// How the client key is derived from a request.
#[derive(Clone, Default)]
pub enum KeyExtractor {
    /// Host of the transport origin.
    #[default]
    RemoteAddr,

    /// First hop of `X-Forwarded-For`, falling back to the transport origin.
    ///
    /// Only appropriate behind a proxy that overwrites the header.
    ForwardedFor,

    /// A caller-supplied function; `None` means the client is unidentifiable.
    Custom(Arc<dyn Fn(&Request) -> Option<String> + Send + Sync>),
}

impl KeyExtractor {
    /// Derives the client key for a request.
    pub fn extract(&self, request: &Request) -> Result<String, ClientIdentityError> {
        match self {
            Self::RemoteAddr => remote_host(request),
            Self::ForwardedFor => {
                let forwarded = request
                    .headers()
                    .get(FORWARDED_FOR_HEADER)
                    .and_then(|v| v.to_str().ok())
                    .and_then(|v| v.split(',').next())
                    .map(str::trim)
                    .filter(|hop| !hop.is_empty());

                match forwarded {
                    Some(hop) => Ok(hop.to_string()),
                    None => remote_host(request),
                }
            }
            Self::Custom(f) => f(request).ok_or(ClientIdentityError::Unidentified),
        }
    }
}

fn remote_host(request: &Request) -> Result<String, ClientIdentityError> {
    let origin = request
        .extensions()
        .get::<ClientOrigin>()
        .ok_or(ClientIdentityError::MissingOrigin)?;
    split_host(origin.as_str()).map(str::to_string)
}

impl fmt::Debug for KeyExtractor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RemoteAddr => write!(f, "KeyExtractor::RemoteAddr"),
            Self::ForwardedFor => write!(f, "KeyExtractor::ForwardedFor"),
            Self::Custom(_) => write!(f, "KeyExtractor::Custom(<fn>)"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use http::Request as HttpRequest;
    use http_body_util::Full;

    fn request_from(origin: Option<&str>, forwarded: Option<&str>) -> Request {
        let mut builder = HttpRequest::builder().uri("/");
        if let Some(value) = forwarded {
            builder = builder.header(FORWARDED_FOR_HEADER, value);
        }
        let mut request = builder.body(Full::new(Bytes::new())).unwrap();
        if let Some(origin) = origin {
            request.extensions_mut().insert(ClientOrigin::new(origin));
        }
        request
    }

    #[test]
    fn test_split_host_accepts() {
        assert_eq!(split_host("1.2.3.4:80"), Ok("1.2.3.4"));
        assert_eq!(split_host("example.com:443"), Ok("example.com"));
        assert_eq!(split_host("[::1]:80"), Ok("::1"));
        assert_eq!(split_host("[fe80::1%eth0]:80"), Ok("fe80::1%eth0"));
        assert_eq!(split_host(":80"), Ok(""));
        assert_eq!(split_host("1.2.3.4:"), Ok("1.2.3.4"));
    }

    #[test]
    fn test_split_host_rejects() {
        assert_eq!(split_host("1.2.3.4"), Err(ClientIdentityError::MissingPort));
        assert_eq!(split_host(""), Err(ClientIdentityError::MissingPort));
        assert_eq!(split_host("::1:80"), Err(ClientIdentityError::TooManyColons));
        assert_eq!(split_host("[::1]"), Err(ClientIdentityError::MissingPort));
        assert_eq!(split_host("[::1:80"), Err(ClientIdentityError::MissingBracket));
        assert_eq!(
            split_host("[::1]::80"),
            Err(ClientIdentityError::TooManyColons)
        );
        assert_eq!(split_host("[::1]x:80"), Err(ClientIdentityError::MissingPort));
        assert_eq!(
            split_host("a]b:80"),
            Err(ClientIdentityError::UnexpectedBracket)
        );
        assert_eq!(
            split_host("[a[b]:80"),
            Err(ClientIdentityError::UnexpectedBracket)
        );
    }

    #[test]
    fn test_remote_addr_extractor() {
        let extractor = KeyExtractor::RemoteAddr;
        let request = request_from(Some("10.1.2.3:55000"), None);
        assert_eq!(extractor.extract(&request).unwrap(), "10.1.2.3");
    }

    #[test]
    fn test_remote_addr_ignores_port() {
        let extractor = KeyExtractor::RemoteAddr;
        let a = extractor.extract(&request_from(Some("10.1.2.3:1"), None));
        let b = extractor.extract(&request_from(Some("10.1.2.3:2"), None));
        assert_eq!(a, b);
    }

    #[test]
    fn test_remote_addr_missing_origin() {
        let extractor = KeyExtractor::RemoteAddr;
        assert_eq!(
            extractor.extract(&request_from(None, None)),
            Err(ClientIdentityError::MissingOrigin)
        );
    }

    #[test]
    fn test_forwarded_for_uses_first_hop() {
        let extractor = KeyExtractor::ForwardedFor;
        let request = request_from(Some("10.0.0.1:80"), Some(" 203.0.113.7 , 10.0.0.1"));
        assert_eq!(extractor.extract(&request).unwrap(), "203.0.113.7");
    }

    #[test]
    fn test_forwarded_for_falls_back_to_origin() {
        let extractor = KeyExtractor::ForwardedFor;
        let request = request_from(Some("10.0.0.1:80"), Some(""));
        assert_eq!(extractor.extract(&request).unwrap(), "10.0.0.1");
    }

    #[test]
    fn test_custom_extractor() {
        let extractor = KeyExtractor::Custom(Arc::new(|req: &Request| {
            req.headers()
                .get("x-api-key")
                .and_then(|v| v.to_str().ok())
                .map(String::from)
        }));

        let mut request = request_from(None, None);
        assert_eq!(
            extractor.extract(&request),
            Err(ClientIdentityError::Unidentified)
        );

        request
            .headers_mut()
            .insert("x-api-key", http::HeaderValue::from_static("key-1"));
        assert_eq!(extractor.extract(&request).unwrap(), "key-1");
    }

    #[test]
    fn test_extractor_debug() {
        let custom = KeyExtractor::Custom(Arc::new(|_req: &Request| None));
        assert_eq!(format!("{custom:?}"), "KeyExtractor::Custom(<fn>)");
        assert_eq!(
            format!("{:?}", KeyExtractor::default()),
            "KeyExtractor::RemoteAddr"
        );
    }
}
