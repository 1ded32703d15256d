//! Server configuration.
//!
//! Timeouts are whole seconds so the section reads naturally from JSON or
//! TOML files.
//!
//! # Example
//!
//! ```rust
//! use bfweb_server::ServerConfig;
//! use std::time::Duration;
//!
//! let config = ServerConfig::default().with_host("127.0.0.1").with_port(3000);
//!
//! assert_eq!(config.bind_addr(), "127.0.0.1:3000");
//! assert_eq!(config.read_timeout(), Duration::from_secs(30));
//! ```

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default bind host.
pub const DEFAULT_HOST: &str = "0.0.0.0";

/// Default port.
pub const DEFAULT_PORT: u16 = 8080;

/// Default read, write and shutdown timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// HTTP server settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Interface to bind.
    pub host: String,

    /// TCP port; 0 asks the OS for a free one.
    pub port: u16,

    /// Seconds allowed for reading request headers and body.
    pub read_timeout: u64,

    /// Seconds allowed for the pipeline and handler to produce a response.
    pub write_timeout: u64,

    /// Seconds to wait for open connections on shutdown.
    pub shutdown_timeout: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            read_timeout: DEFAULT_TIMEOUT_SECS,
            write_timeout: DEFAULT_TIMEOUT_SECS,
            shutdown_timeout: DEFAULT_TIMEOUT_SECS,
        }
    }
}

impl ServerConfig {
    /// Sets the bind host.
    #[must_use]
    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }

    /// Sets the port.
    #[must_use]
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Sets the shutdown timeout in seconds.
    #[must_use]
    pub fn with_shutdown_timeout(mut self, secs: u64) -> Self {
        self.shutdown_timeout = secs;
        self
    }

    /// Sets the write timeout in seconds.
    #[must_use]
    pub fn with_write_timeout(mut self, secs: u64) -> Self {
        self.write_timeout = secs;
        self
    }

    /// Returns `host:port`, bracketing IPv6 literals.
    #[must_use]
    pub fn bind_addr(&self) -> String {
        if self.host.contains(':') && !self.host.starts_with('[') {
            format!("[{}]:{}", self.host, self.port)
        } else {
            format!("{}:{}", self.host, self.port)
        }
    }

    /// Read timeout as a [`Duration`].
    #[must_use]
    pub fn read_timeout(&self) -> Duration {
        Duration::from_secs(self.read_timeout)
    }

    /// Write timeout as a [`Duration`].
    #[must_use]
    pub fn write_timeout(&self) -> Duration {
        Duration::from_secs(self.write_timeout)
    }

    /// Shutdown timeout as a [`Duration`].
    #[must_use]
    pub fn shutdown_timeout(&self) -> Duration {
        Duration::from_secs(self.shutdown_timeout)
    }
}
