//! End-to-end tests of the standard middleware chain.

use bfweb_core::ClientOrigin;
use bfweb_middleware::admission::{ManualClock, RateLimitPolicy};
use bfweb_middleware::render::{default_renderer, JsonErrorRenderer};
use bfweb_middleware::stages::{
    CorsConfig, CorsMiddleware, LoggingMiddleware, RateLimitMiddleware, RecoveryMiddleware,
    RequestIdMiddleware,
};
use bfweb_middleware::{BoxFuture, MiddlewareContext, Pipeline, Request, Response, ResponseExt};
use bytes::Bytes;
use http::{Method, StatusCode};
use http_body_util::{BodyExt, Full};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

fn request(method: Method, path: &str, origin: Option<&str>) -> Request {
    let mut request = http::Request::builder()
        .method(method)
        .uri(path)
        .header("origin", "https://app.example")
        .body(Full::new(Bytes::new()))
        .unwrap();
    if let Some(origin) = origin {
        request.extensions_mut().insert(ClientOrigin::new(origin));
    }
    request
}

fn get(origin: &str) -> Request {
    request(Method::GET, "/api/items", Some(origin))
}

fn counting_handler(
    calls: &Arc<AtomicUsize>,
) -> impl FnOnce(&mut MiddlewareContext, Request) -> BoxFuture<'static, Response> + Send + 'static
{
    let calls = Arc::clone(calls);
    move |_ctx, _req| {
        calls.fetch_add(1, Ordering::SeqCst);
        Box::pin(async { Response::text(StatusCode::OK, "ok") })
    }
}

async fn explode() -> Response {
    panic!("handler blew up")
}

/// The standard chain with a manual clock and the given limits.
fn limited_pipeline(max_requests: u64, max_clients: usize, clock: &ManualClock) -> Pipeline {
    let renderer = Arc::new(JsonErrorRenderer);
    let policy = RateLimitPolicy::new(max_requests, max_clients, Duration::from_secs(1)).unwrap();
    Pipeline::builder()
        .add_stage(CorsMiddleware::new(CorsConfig::default()))
        .add_stage(
            RateLimitMiddleware::builder()
                .policy(policy)
                .clock(Arc::new(clock.clone()))
                .renderer(renderer.clone())
                .build(),
        )
        .add_stage(RecoveryMiddleware::new(renderer))
        .add_stage(RequestIdMiddleware::new())
        .add_stage(LoggingMiddleware::new())
        .build()
}

#[tokio::test]
async fn test_allowed_request_reaches_handler_with_headers() {
    let pipeline = Pipeline::standard(CorsConfig::default(), None, default_renderer());
    let calls = Arc::new(AtomicUsize::new(0));

    let response = pipeline
        .handle(get("10.0.0.1:5000"), counting_handler(&calls))
        .await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert!(response.headers().contains_key("x-request-id"));
    assert_eq!(
        response.headers().get("access-control-allow-origin").unwrap(),
        "*"
    );
}

#[tokio::test]
async fn test_limit_scenario_over_one_window() {
    let clock = ManualClock::default();
    let pipeline = limited_pipeline(2, 1, &clock);
    let calls = Arc::new(AtomicUsize::new(0));

    for _ in 0..2 {
        let response = pipeline
            .handle(get("10.0.0.1:5000"), counting_handler(&calls))
            .await;
        assert_eq!(response.status(), StatusCode::OK);
    }

    let third = pipeline
        .handle(get("10.0.0.1:5001"), counting_handler(&calls))
        .await;
    assert_eq!(third.status(), StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(third.headers().get("retry-after").unwrap(), "1");
    assert_eq!(
        third.headers().get("access-control-allow-origin").unwrap(),
        "*"
    );
    assert!(!third.headers().contains_key("x-request-id"));

    let other = pipeline
        .handle(get("10.0.0.2:5000"), counting_handler(&calls))
        .await;
    assert_eq!(other.status(), StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(calls.load(Ordering::SeqCst), 2);

    clock.advance(Duration::from_millis(1001));
    let after_reset = pipeline
        .handle(get("10.0.0.2:5000"), counting_handler(&calls))
        .await;
    assert_eq!(after_reset.status(), StatusCode::OK);
    assert_eq!(calls.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn test_rejection_body_comes_from_renderer() {
    let clock = ManualClock::default();
    let pipeline = limited_pipeline(1, 10, &clock);
    let calls = Arc::new(AtomicUsize::new(0));

    pipeline
        .handle(get("10.0.0.1:5000"), counting_handler(&calls))
        .await;
    let rejected = pipeline
        .handle(get("10.0.0.1:5000"), counting_handler(&calls))
        .await;

    let body = rejected.into_body().collect().await.unwrap().to_bytes();
    let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["error"]["code"], 429);
    assert_eq!(json["error"]["path"], "/api/items");
}

#[tokio::test]
async fn test_malformed_origin_is_bad_request() {
    let clock = ManualClock::default();
    let pipeline = limited_pipeline(5, 1, &clock);
    let calls = Arc::new(AtomicUsize::new(0));

    let response = pipeline
        .handle(
            request(Method::GET, "/api/items", Some("no-port")),
            counting_handler(&calls),
        )
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let missing = pipeline
        .handle(request(Method::GET, "/api/items", None), counting_handler(&calls))
        .await;
    assert_eq!(missing.status(), StatusCode::BAD_REQUEST);
    assert_eq!(calls.load(Ordering::SeqCst), 0);

    // The malformed requests did not take the only client slot.
    let valid = pipeline
        .handle(get("10.0.0.9:1"), counting_handler(&calls))
        .await;
    assert_eq!(valid.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_options_answered_before_rate_limit() {
    let clock = ManualClock::default();
    let pipeline = limited_pipeline(1, 1, &clock);
    let calls = Arc::new(AtomicUsize::new(0));

    for _ in 0..3 {
        let response = pipeline
            .handle(
                request(Method::OPTIONS, "/api/items", Some("10.0.0.1:5000")),
                counting_handler(&calls),
            )
            .await;
        assert_eq!(response.status(), StatusCode::NO_CONTENT);
    }
    assert_eq!(calls.load(Ordering::SeqCst), 0);

    let response = pipeline
        .handle(get("10.0.0.1:5000"), counting_handler(&calls))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_handler_panic_becomes_500() {
    let pipeline = Pipeline::standard(CorsConfig::default(), None, Arc::new(JsonErrorRenderer));

    let response = pipeline
        .handle(get("10.0.0.1:5000"), |_ctx, _req| Box::pin(explode()))
        .await;

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert!(response
        .headers()
        .contains_key("access-control-allow-origin"));

    let next = pipeline
        .handle(get("10.0.0.1:5000"), |_ctx, _req| {
            Box::pin(async { Response::status_only(StatusCode::OK) })
        })
        .await;
    assert_eq!(next.status(), StatusCode::OK);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_requests_share_one_budget() {
    let clock = ManualClock::default();
    let pipeline = Arc::new(limited_pipeline(15, 1, &clock));
    let calls = Arc::new(AtomicUsize::new(0));

    let tasks: Vec<_> = (0..16)
        .map(|_| {
            let pipeline = Arc::clone(&pipeline);
            let calls = Arc::clone(&calls);
            tokio::spawn(async move {
                pipeline
                    .handle(get("10.0.0.1:5000"), counting_handler(&calls))
                    .await
                    .status()
            })
        })
        .collect();

    let mut rejected = 0;
    for task in tasks {
        if task.await.unwrap() == StatusCode::TOO_MANY_REQUESTS {
            rejected += 1;
        }
    }

    assert_eq!(rejected, 1);
    assert_eq!(calls.load(Ordering::SeqCst), 15);
}
