//! HTML error page templates.
//!
//! A template is an HTML document with `{{code}}`, `{{title}}`,
//! `{{message}}` and `{{path}}` placeholders. Values are HTML-escaped;
//! anything else between braces is left as written.

use std::fs;
use std::path::Path;

use bfweb_config::ConfigError;
use bfweb_core::ErrorPage;
use bfweb_middleware::render::HtmlErrorRenderer;

/// An error page template loaded once at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorTemplate {
    source: String,
}

impl ErrorTemplate {
    /// Wraps template text.
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
        }
    }

    /// Reads a template file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::FileNotFound`] or [`ConfigError::ReadError`].
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let source = fs::read_to_string(path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => ConfigError::file_not_found(path),
            _ => ConfigError::read_error(path, e),
        })?;
        Ok(Self::new(source))
    }

    /// Fills the placeholders from `page`.
    #[must_use]
    pub fn render(&self, page: &ErrorPage) -> String {
        let mut out = String::with_capacity(self.source.len() + 64);
        let mut rest = self.source.as_str();

        while let Some(start) = rest.find("{{") {
            out.push_str(&rest[..start]);
            let after = &rest[start + 2..];
            let Some(end) = after.find("}}") else {
                rest = &rest[start..];
                break;
            };

            match after[..end].trim() {
                "code" => out.push_str(&page.code.to_string()),
                "title" => push_escaped(&mut out, &page.title),
                "message" => push_escaped(&mut out, &page.message),
                "path" => push_escaped(&mut out, &page.path),
                _ => out.push_str(&rest[start..start + 2 + end + 2]),
            }
            rest = &after[end + 2..];
        }

        out.push_str(rest);
        out
    }

    /// Turns the template into an error renderer.
    #[must_use]
    pub fn into_renderer(self) -> HtmlErrorRenderer {
        HtmlErrorRenderer::new(move |page: &ErrorPage| Ok(self.render(page)))
    }
}

fn push_escaped(out: &mut String, value: &str) {
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
}
