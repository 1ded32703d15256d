//! Transport-level request origin.

use std::fmt;
use std::net::SocketAddr;

/// The peer address a request arrived from, as the transport reported it.
///
/// The server inserts this into every request's extensions. It is kept as a
/// raw string (`host:port`, `[v6]:port`) so that consumers parse it under
/// their own rules; a malformed value is a client-identity problem, not a
/// transport one.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ClientOrigin(String);

impl ClientOrigin {
    /// Wraps a raw origin string.
    pub fn new(origin: impl Into<String>) -> Self {
        Self(origin.into())
    }

    /// Returns the raw origin string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<SocketAddr> for ClientOrigin {
    fn from(addr: SocketAddr) -> Self {
        Self(addr.to_string())
    }
}

impl fmt::Display for ClientOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_socket_addr_v4() {
        let addr: SocketAddr = "10.0.0.1:5000".parse().unwrap();
        assert_eq!(ClientOrigin::from(addr).as_str(), "10.0.0.1:5000");
    }

    #[test]
    fn test_from_socket_addr_v6_is_bracketed() {
        let addr: SocketAddr = "[::1]:8080".parse().unwrap();
        assert_eq!(ClientOrigin::from(addr).as_str(), "[::1]:8080");
    }
}
