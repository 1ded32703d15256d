//! Ordered middleware pipeline.
//!
//! A [`Pipeline`] is an immutable list of stages that every request flows
//! through before it reaches the handler. Stages run in the order they were
//! added: the first stage added is the outermost wrapper and sees the request
//! first and the response last.
//!
//! ## Standard Chain
//!
//! ```text
//! Request → Cors → RateLimit → Recovery → RequestId → Logging → Handler
//! ```
//!
//! Cors sits outside the rate limiter so that 429 responses still carry CORS
//! headers. Recovery sits inside the rate limiter, so a panic never skews
//! admission accounting.

use crate::admission::RateLimitPolicy;
use crate::context::MiddlewareContext;
use crate::middleware::{BoxFuture, Middleware, Next};
use crate::render::SharedRenderer;
use crate::stages::{
    CorsConfig, CorsMiddleware, LoggingMiddleware, RateLimitMiddleware, RecoveryMiddleware,
    RequestIdMiddleware,
};
use crate::types::{Request, Response};
use std::fmt;
use std::sync::Arc;

/// A type-erased middleware that can be stored in a vector.
pub type BoxedMiddleware = Arc<dyn Middleware>;

/// An ordered, immutable middleware pipeline.
///
/// Cloning is cheap and clones share their stages, including any rate
/// limiter state.
///
/// # Example
///
/// ```ignore
/// use bfweb_middleware::pipeline::Pipeline;
/// use bfweb_middleware::stages::{LoggingMiddleware, RequestIdMiddleware};
///
/// let pipeline = Pipeline::builder()
///     .add_stage(RequestIdMiddleware::new())
///     .add_stage(LoggingMiddleware::new())
///     .build();
///
/// let response = pipeline.handle(request, |_ctx, _req| {
///     Box::pin(async { Response::text(StatusCode::OK, "hello") })
/// }).await;
/// ```
#[derive(Clone, Default)]
pub struct Pipeline {
    stages: Vec<BoxedMiddleware>,
}

impl Pipeline {
    /// Creates a new pipeline builder.
    #[must_use]
    pub fn builder() -> PipelineBuilder {
        PipelineBuilder::new()
    }

    /// Builds the standard chain: Cors, RateLimit, Recovery, RequestId,
    /// Logging.
    ///
    /// `policy` of `None` uses the default rate limit policy. The renderer is
    /// shared by the rate limiter and the recovery stage.
    pub fn standard(
        cors: CorsConfig,
        policy: Option<RateLimitPolicy>,
        renderer: SharedRenderer,
    ) -> Self {
        let rate_limit = RateLimitMiddleware::builder()
            .policy(policy.unwrap_or_default())
            .renderer(Arc::clone(&renderer))
            .build();

        Self::builder()
            .add_stage(CorsMiddleware::new(cors))
            .add_stage(rate_limit)
            .add_stage(RecoveryMiddleware::new(renderer))
            .add_stage(RequestIdMiddleware::new())
            .add_stage(LoggingMiddleware::new())
            .build()
    }

    /// Processes a request through every stage, then the handler.
    pub async fn process<'a, H>(
        &'a self,
        mut ctx: MiddlewareContext,
        request: Request,
        handler: H,
    ) -> Response
    where
        H: FnOnce(&mut MiddlewareContext, Request) -> BoxFuture<'static, Response> + Send + 'a,
    {
        let next = self.build_chain(handler);
        next.run(&mut ctx, request).await
    }

    /// Processes a request with a fresh context.
    pub async fn handle<'a, H>(&'a self, request: Request, handler: H) -> Response
    where
        H: FnOnce(&mut MiddlewareContext, Request) -> BoxFuture<'static, Response> + Send + 'a,
    {
        self.process(MiddlewareContext::new(), request, handler)
            .await
    }

    fn build_chain<'a, H>(&'a self, handler: H) -> Next<'a>
    where
        H: FnOnce(&mut MiddlewareContext, Request) -> BoxFuture<'static, Response> + Send + 'a,
    {
        self.stages
            .iter()
            .rev()
            .fold(Next::handler(handler), |next, stage| {
                Next::new(stage.as_ref(), next)
            })
    }

    /// Returns the names of all stages in order.
    #[must_use]
    pub fn stage_names(&self) -> Vec<&'static str> {
        self.stages.iter().map(|stage| stage.name()).collect()
    }

    /// Returns the number of stages.
    #[must_use]
    pub fn stage_count(&self) -> usize {
        self.stages.len()
    }
}

impl fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pipeline")
            .field("stages", &self.stage_names())
            .finish()
    }
}

/// Builder for constructing a [`Pipeline`].
#[derive(Default)]
pub struct PipelineBuilder {
    stages: Vec<BoxedMiddleware>,
}

impl PipelineBuilder {
    /// Creates an empty builder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a stage. Earlier stages wrap later ones.
    #[must_use]
    pub fn add_stage<M: Middleware>(mut self, middleware: M) -> Self {
        self.stages.push(Arc::new(middleware));
        self
    }

    /// Appends an already shared stage.
    #[must_use]
    pub fn add_shared_stage(mut self, middleware: BoxedMiddleware) -> Self {
        self.stages.push(middleware);
        self
    }

    /// Builds the pipeline.
    #[must_use]
    pub fn build(self) -> Pipeline {
        Pipeline {
            stages: self.stages,
        }
    }
}
