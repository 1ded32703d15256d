//! HTTP server implementation.
//!
//! Accepts TCP connections, serves each one with hyper's HTTP/1 connection
//! driver on its own tokio task, and runs every request through a
//! [`Pipeline`] into the application handler.
//!
//! # Request Flow
//!
//! 1. The request body is collected within `read_timeout`
//! 2. The peer address is attached as a [`ClientOrigin`] extension
//! 3. Pipeline and handler run within `write_timeout`; expiry answers 504
//!
//! # Example
//!
//! ```rust,ignore
//! use bfweb_middleware::{Pipeline, Response, ResponseExt};
//! use bfweb_server::{Server, ServerConfig};
//! use http::StatusCode;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let server = Server::new(ServerConfig::default(), Pipeline::default(), |_ctx, _req| {
//!         Box::pin(async { Response::text(StatusCode::OK, "hello") })
//!     });
//!     server.run().await?;
//!     Ok(())
//! }
//! ```

use std::convert::Infallible;
use std::fmt;
use std::net::SocketAddr;
use std::sync::Arc;

use http::StatusCode;
use http_body_util::{BodyExt, Full};
use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::{TokioIo, TokioTimer};
use tokio::net::{TcpListener, TcpStream};

use bfweb_core::{ClientOrigin, ErrorPage};
use bfweb_middleware::render::{default_renderer, SharedRenderer};
use bfweb_middleware::{BoxFuture, MiddlewareContext, Pipeline, Request, Response};

use crate::config::ServerConfig;
use crate::shutdown::{ConnectionTracker, ShutdownSignal};
use crate::{ServerError, ServerResult};

/// The application handler the pipeline wraps.
pub type Handler =
    Arc<dyn Fn(&mut MiddlewareContext, Request) -> BoxFuture<'static, Response> + Send + Sync>;

/// The bfweb HTTP server.
pub struct Server {
    config: ServerConfig,
    pipeline: Pipeline,
    handler: Handler,
    renderer: SharedRenderer,
}

impl Server {
    /// Creates a server that runs requests through `pipeline` into `handler`.
    pub fn new<F>(config: ServerConfig, pipeline: Pipeline, handler: F) -> Self
    where
        F: Fn(&mut MiddlewareContext, Request) -> BoxFuture<'static, Response>
            + Send
            + Sync
            + 'static,
    {
        Self {
            config,
            pipeline,
            handler: Arc::new(handler),
            renderer: default_renderer(),
        }
    }

    /// Sets the renderer for errors the server itself produces (400, 408,
    /// 504).
    #[must_use]
    pub fn with_renderer(mut self, renderer: SharedRenderer) -> Self {
        self.renderer = renderer;
        self
    }

    /// Returns the server configuration.
    #[must_use]
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Returns the pipeline requests flow through.
    #[must_use]
    pub fn pipeline(&self) -> &Pipeline {
        &self.pipeline
    }

    /// Binds the configured address and serves until SIGTERM or SIGINT.
    ///
    /// # Errors
    ///
    /// Returns an error if the address cannot be bound.
    pub async fn run(self) -> ServerResult<()> {
        let shutdown = ShutdownSignal::with_os_signals();
        self.run_with_shutdown(shutdown).await
    }

    /// Binds the configured address and serves until `shutdown` triggers.
    ///
    /// # Errors
    ///
    /// Returns an error if the address cannot be bound.
    pub async fn run_with_shutdown(self, shutdown: ShutdownSignal) -> ServerResult<()> {
        let addr = self.config.bind_addr();
        let listener = TcpListener::bind(&addr)
            .await
            .map_err(|source| ServerError::Bind {
                addr: addr.clone(),
                source,
            })?;

        self.run_with_listener(listener, shutdown).await
    }

    /// Serves connections from an already bound listener until `shutdown`
    /// triggers, then waits up to `shutdown_timeout` for open connections.
    ///
    /// # Errors
    ///
    /// Returns an error if the listener's local address cannot be read.
    pub async fn run_with_listener(
        self,
        listener: TcpListener,
        shutdown: ShutdownSignal,
    ) -> ServerResult<()> {
        let local_addr = listener.local_addr().map_err(ServerError::Io)?;
        tracing::info!(
            addr = %local_addr,
            stages = ?self.pipeline.stage_names(),
            "Server listening on {}",
            local_addr
        );

        let server = Arc::new(self);
        let tracker = ConnectionTracker::new();

        loop {
            tokio::select! {
                result = listener.accept() => {
                    match result {
                        Ok((stream, remote_addr)) => {
                            let server = Arc::clone(&server);
                            let token = tracker.acquire();
                            let shutdown = shutdown.clone();

                            tokio::spawn(async move {
                                if let Err(e) = server.handle_connection(stream, remote_addr, shutdown).await {
                                    tracing::debug!(peer = %remote_addr, error = %e, "Connection error");
                                }
                                drop(token);
                            });
                        }
                        Err(e) => {
                            tracing::error!(error = %e, "Failed to accept connection");
                        }
                    }
                }

                () = shutdown.recv() => {
                    tracing::info!("Shutdown signal received, stopping server");
                    break;
                }
            }
        }

        drop(listener);

        let shutdown_timeout = server.config.shutdown_timeout();
        tracing::info!(
            "Waiting up to {:?} for {} connections to close",
            shutdown_timeout,
            tracker.active_connections()
        );

        tokio::select! {
            () = tracker.wait_for_shutdown() => {
                tracing::info!("All connections closed");
            }
            () = tokio::time::sleep(shutdown_timeout) => {
                tracing::warn!(
                    "Shutdown timeout reached, {} connections still active",
                    tracker.active_connections()
                );
            }
        }

        tracing::info!("Server stopped");
        Ok(())
    }

    /// Serves one connection; on shutdown, finishes the in-flight request
    /// and closes.
    async fn handle_connection(
        self: &Arc<Self>,
        stream: TcpStream,
        remote_addr: SocketAddr,
        shutdown: ShutdownSignal,
    ) -> Result<(), hyper::Error> {
        let io = TokioIo::new(stream);
        let server = Arc::clone(self);

        let service = service_fn(move |request: http::Request<Incoming>| {
            let server = Arc::clone(&server);
            async move { Ok::<_, Infallible>(server.handle_request(request, remote_addr).await) }
        });

        let mut builder = http1::Builder::new();
        builder
            .timer(TokioTimer::new())
            .header_read_timeout(self.config.read_timeout());

        let conn = builder.serve_connection(io, service);
        tokio::pin!(conn);

        tokio::select! {
            result = conn.as_mut() => result,
            () = shutdown.recv() => {
                tracing::debug!(peer = %remote_addr, "Closing connection for shutdown");
                conn.as_mut().graceful_shutdown();
                conn.await
            }
        }
    }

    /// Handles a single HTTP request.
    async fn handle_request(
        &self,
        request: http::Request<Incoming>,
        remote_addr: SocketAddr,
    ) -> Response {
        let path = request.uri().path().to_string();
        let (mut parts, body) = request.into_parts();

        let body = match tokio::time::timeout(self.config.read_timeout(), body.collect()).await {
            Ok(Ok(collected)) => collected.to_bytes(),
            Ok(Err(e)) => {
                tracing::warn!(peer = %remote_addr, error = %e, "Failed to read request body");
                return self.renderer.render(&ErrorPage::bad_request(path));
            }
            Err(_) => {
                tracing::warn!(peer = %remote_addr, path = %path, "Request body read timed out");
                return self.renderer.render(&ErrorPage::new(
                    StatusCode::REQUEST_TIMEOUT,
                    "Request Timeout",
                    "The request body was not received in time.",
                    path,
                ));
            }
        };

        parts.extensions.insert(ClientOrigin::from(remote_addr));
        let request = Request::from_parts(parts, Full::new(body));

        let handler = Arc::clone(&self.handler);
        let processed = self
            .pipeline
            .handle(request, move |ctx, request| handler(ctx, request));

        match tokio::time::timeout(self.config.write_timeout(), processed).await {
            Ok(response) => response,
            Err(_) => {
                tracing::warn!(peer = %remote_addr, path = %path, "Request handling timed out");
                self.renderer.render(&ErrorPage::gateway_timeout(path))
            }
        }
    }
}

impl fmt::Debug for Server {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Server")
            .field("config", &self.config)
            .field("pipeline", &self.pipeline)
            .finish_non_exhaustive()
    }
}
