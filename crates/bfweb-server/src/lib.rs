//! # bfweb Server
//!
//! HTTP/1 server for bfweb services, built on hyper and tokio.
//!
//! - One tokio task per connection
//! - Every request runs through a [`bfweb_middleware::Pipeline`]
//! - Read and write timeouts from [`ServerConfig`]
//! - Graceful shutdown on SIGTERM/SIGINT or a [`ShutdownSignal`]
//!
//! ## Example
//!
//! ```rust,ignore
//! use bfweb_middleware::{Pipeline, Response, ResponseExt};
//! use bfweb_server::{Server, ServerConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), bfweb_server::ServerError> {
//!     Server::new(ServerConfig::default(), Pipeline::default(), |_ctx, _req| {
//!         Box::pin(async { Response::text(http::StatusCode::OK, "hello") })
//!     })
//!     .run()
//!     .await
//! }
//! ```

#![doc(html_root_url = "https://docs.rs/bfweb-server/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod config;
pub mod server;
pub mod shutdown;

pub use config::ServerConfig;
pub use server::{Handler, Server};
pub use shutdown::{ConnectionTracker, ShutdownSignal};

/// Server errors.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    /// The configured address could not be bound.
    #[error("failed to bind {addr}: {source}")]
    Bind {
        /// The `host:port` that was requested.
        addr: String,
        /// The underlying error.
        #[source]
        source: std::io::Error,
    },

    /// I/O error on the listening socket.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for server operations.
pub type ServerResult<T> = Result<T, ServerError>;
