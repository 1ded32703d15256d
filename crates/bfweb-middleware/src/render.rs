//! Error page rendering.
//!
//! Stages that terminate a request with an error (rate limiting, recovery)
//! never build the response themselves: they hand an [`ErrorPage`] to the
//! configured [`ErrorRenderer`].
//!
//! All renderers share one rule: requests for static assets (scripts,
//! stylesheets, images, fonts, ...) get a bare status with no body, so a
//! broken asset never receives an HTML error page in its place.
//!
//! | Renderer               | Body                                        |
//! |------------------------|---------------------------------------------|
//! | [`StatusOnlyRenderer`] | none                                        |
//! | [`JsonErrorRenderer`]  | `{"error":{"code","title","message","path"}}`, `code` numeric |
//! | [`HtmlErrorRenderer`]  | output of a user-supplied render function   |

use crate::types::{Response, ResponseExt};
use bfweb_core::ErrorPage;
use std::fmt;
use std::sync::Arc;

/// File extensions treated as static assets.
pub const STATIC_ASSET_EXTENSIONS: &[&str] = &[
    "js", "css", "map", "ico", "png", "svg", "jpg", "jpeg", "webp", "woff", "woff2", "ttf", "eot",
    "gif", "pdf", "json", "xml",
];

/// Error type returned by HTML render functions.
pub type RenderError = Box<dyn std::error::Error + Send + Sync>;

/// A renderer shared between stages.
pub type SharedRenderer = Arc<dyn ErrorRenderer>;

/// Turns an [`ErrorPage`] into a response.
pub trait ErrorRenderer: Send + Sync + 'static {
    /// Renders the page body. Only called for non-asset paths.
    fn render_page(&self, page: &ErrorPage) -> Response;

    /// Renders the page, suppressing the body for static asset paths.
    fn render(&self, page: &ErrorPage) -> Response {
        if is_static_asset(&page.path) {
            return Response::status_only(page.status());
        }
        self.render_page(page)
    }
}

/// Returns the renderer used when none is configured.
#[must_use]
pub fn default_renderer() -> SharedRenderer {
    Arc::new(StatusOnlyRenderer)
}

/// Returns `true` if the path's final segment has a static asset extension.
///
/// The comparison is case-insensitive.
///
/// ```
/// use bfweb_middleware::render::is_static_asset;
///
/// assert!(is_static_asset("/static/app.JS"));
/// assert!(!is_static_asset("/api/items"));
/// assert!(!is_static_asset("/assets.css/index"));
/// ```
#[must_use]
pub fn is_static_asset(path: &str) -> bool {
    let name = path.rsplit('/').next().unwrap_or(path);
    match name.rfind('.') {
        Some(dot) => {
            let ext = &name[dot + 1..];
            STATIC_ASSET_EXTENSIONS
                .iter()
                .any(|candidate| candidate.eq_ignore_ascii_case(ext))
        }
        None => false,
    }
}

/// Emits the status code only.
#[derive(Debug, Clone, Copy, Default)]
pub struct StatusOnlyRenderer;

impl ErrorRenderer for StatusOnlyRenderer {
    fn render_page(&self, page: &ErrorPage) -> Response {
        Response::status_only(page.status())
    }
}

/// Emits a JSON error envelope.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonErrorRenderer;

impl ErrorRenderer for JsonErrorRenderer {
    fn render_page(&self, page: &ErrorPage) -> Response {
        let body = serde_json::json!({
            "error": {
                "code": page.code,
                "title": page.title,
                "message": page.message,
                "path": page.path,
            }
        });
        Response::json(page.status(), &body)
    }
}

/// Emits HTML produced by a render function.
///
/// If the function fails, the page message is sent as plain text with the
/// page's status.
///
/// # Example
///
/// ```
/// use bfweb_middleware::render::{ErrorRenderer, HtmlErrorRenderer};
/// use bfweb_core::ErrorPage;
///
/// let renderer = HtmlErrorRenderer::new(|page: &ErrorPage| {
///     Ok(format!("<h1>{} {}</h1><p>{}</p>", page.code, page.title, page.message))
/// });
///
/// let response = renderer.render(&ErrorPage::not_found("/missing"));
/// assert_eq!(response.status(), 404);
/// ```
pub struct HtmlErrorRenderer {
    render_fn: Box<dyn Fn(&ErrorPage) -> Result<String, RenderError> + Send + Sync>,
}

impl HtmlErrorRenderer {
    /// Creates a renderer from a render function.
    pub fn new<F>(render_fn: F) -> Self
    where
        F: Fn(&ErrorPage) -> Result<String, RenderError> + Send + Sync + 'static,
    {
        Self {
            render_fn: Box::new(render_fn),
        }
    }
}

impl fmt::Debug for HtmlErrorRenderer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HtmlErrorRenderer").finish_non_exhaustive()
    }
}

impl ErrorRenderer for HtmlErrorRenderer {
    fn render_page(&self, page: &ErrorPage) -> Response {
        match (self.render_fn)(page) {
            Ok(body) => Response::html(page.status(), body),
            Err(e) => {
                tracing::warn!(error = %e, status = page.code, "Error page template failed");
                Response::text(page.status(), &page.message)
            }
        }
    }
}
