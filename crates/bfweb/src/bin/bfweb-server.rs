//! bfweb demo server.
//!
//! Serves a static HTML greeting on every path and a JSON greeting under
//! `/api/`, the latter through the standard middleware pipeline.
//!
//! Configuration comes from the file named by `BFWEB_CONFIG` (default
//! `config.json`, skipped if missing), a `.env` file, and `BFWEB_*`
//! environment overrides.

use std::env;
use std::time::{SystemTime, UNIX_EPOCH};

use anyhow::Context;
use bfweb::prelude::*;
use bfweb::telemetry::{init_logging, init_metrics};

const CONFIG_ENV: &str = "BFWEB_CONFIG";
const DEFAULT_CONFIG_FILE: &str = "config.json";

const HELLO_HTML: &str = r#"<!doctype html>
<html lang="en">
<head><meta charset="utf-8"><title>Hello</title></head>
<body>
  <h1>Hello (HTML)</h1>
  <p>This is a test handler.</p>
</body>
</html>"#;

fn hello_html(_ctx: &mut MiddlewareContext, _request: Request) -> BoxFuture<'static, Response> {
    Box::pin(async { Response::html(StatusCode::OK, HELLO_HTML.to_string()) })
}

fn hello_json(ctx: &mut MiddlewareContext, request: Request) -> BoxFuture<'static, Response> {
    let timestamp = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default();

    let body = serde_json::json!({
        "ok": true,
        "message": "Hello (JSON)",
        "path": request.uri().to_string(),
        "method": request.method().as_str(),
        "timestamp": timestamp,
        "request_id": ctx.request_id().map(RequestId::as_str),
    });

    Box::pin(async move { Response::json(StatusCode::OK, &body) })
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config_file = env::var(CONFIG_ENV).unwrap_or_else(|_| DEFAULT_CONFIG_FILE.to_string());

    let config = ConfigLoader::new()
        .with_dotenv()
        .with_optional_file(&config_file)
        .with_context(|| format!("failed to read config {config_file}"))?
        .with_env_prefix(bfweb::config::DEFAULT_ENV_PREFIX)
        .load()
        .context("invalid configuration")?;

    init_logging(&config.logging).context("failed to init logging")?;
    init_metrics(&config.metrics).context("failed to init metrics")?;

    let renderer = bfweb::error_renderer(&config).context("failed to load error template")?;
    let api = bfweb::standard_pipeline(&config, renderer.clone());

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        config = %config_file,
        "Starting bfweb demo server"
    );

    let server = Server::new(config.server, Pipeline::default(), move |ctx, request| {
        if request.uri().path().starts_with("/api/") {
            let api = api.clone();
            Box::pin(async move { api.handle(request, hello_json).await })
        } else {
            hello_html(ctx, request)
        }
    })
    .with_renderer(renderer);

    server.run().await?;
    Ok(())
}
