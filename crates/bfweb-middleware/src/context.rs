//! Middleware context types.
//!
//! The [`MiddlewareContext`] carries per-request state through the pipeline:
//! the correlation ID, the start time, and typed extensions that one stage
//! can leave for a later stage or the handler.

use bfweb_core::RequestId;
use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::time::{Duration, Instant};

/// Context that flows through the middleware pipeline.
///
/// # Example
///
/// ```
/// use bfweb_middleware::context::MiddlewareContext;
/// use bfweb_core::RequestId;
///
/// let mut ctx = MiddlewareContext::new();
/// assert!(ctx.request_id().is_none());
///
/// let id: RequestId = "req-1".parse().unwrap();
/// assert!(ctx.set_request_id(id));
///
/// // The first ID wins.
/// assert!(!ctx.set_request_id(RequestId::generate()));
/// assert_eq!(ctx.request_id().unwrap().as_str(), "req-1");
/// ```
#[derive(Debug)]
pub struct MiddlewareContext {
    /// Correlation ID, once assigned.
    request_id: Option<RequestId>,

    /// When the request entered the pipeline.
    started_at: Instant,

    /// Type-erased extension data.
    extensions: HashMap<TypeId, Box<dyn Any + Send + Sync>>,
}

impl MiddlewareContext {
    /// Creates an empty context.
    #[must_use]
    pub fn new() -> Self {
        Self {
            request_id: None,
            started_at: Instant::now(),
            extensions: HashMap::new(),
        }
    }

    /// Creates a context that already carries a request ID.
    ///
    /// Useful when an outer layer (a proxy adapter, a test) has assigned the
    /// ID before the pipeline runs.
    #[must_use]
    pub fn with_request_id(request_id: RequestId) -> Self {
        Self {
            request_id: Some(request_id),
            ..Self::new()
        }
    }

    /// Returns the request ID, if one has been assigned.
    #[must_use]
    pub fn request_id(&self) -> Option<&RequestId> {
        self.request_id.as_ref()
    }

    /// Assigns the request ID unless one is already present.
    ///
    /// Returns `true` if the ID was stored.
    pub fn set_request_id(&mut self, request_id: RequestId) -> bool {
        if self.request_id.is_some() {
            return false;
        }
        self.request_id = Some(request_id);
        true
    }

    /// Returns when the request entered the pipeline.
    #[must_use]
    pub fn started_at(&self) -> Instant {
        self.started_at
    }

    /// Returns the elapsed time since the request entered the pipeline.
    #[must_use]
    pub fn elapsed(&self) -> Duration {
        self.started_at.elapsed()
    }

    /// Stores a typed extension value, replacing any previous value of the
    /// same type.
    pub fn set_extension<T: Send + Sync + 'static>(&mut self, value: T) {
        self.extensions.insert(TypeId::of::<T>(), Box::new(value));
    }

    /// Retrieves a typed extension value.
    #[must_use]
    pub fn get_extension<T: Send + Sync + 'static>(&self) -> Option<&T> {
        self.extensions
            .get(&TypeId::of::<T>())
            .and_then(|v| v.downcast_ref())
    }

    /// Removes and returns a typed extension value.
    pub fn remove_extension<T: Send + Sync + 'static>(&mut self) -> Option<T> {
        self.extensions
            .remove(&TypeId::of::<T>())
            .and_then(|v| v.downcast().ok())
            .map(|b| *b)
    }

    /// Checks if an extension of the given type exists.
    #[must_use]
    pub fn has_extension<T: Send + Sync + 'static>(&self) -> bool {
        self.extensions.contains_key(&TypeId::of::<T>())
    }
}

impl Default for MiddlewareContext {
    fn default() -> Self {
        Self::new()
    }
}
