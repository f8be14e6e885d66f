//! Fixed-window limiter exercised through a minimal router so the
//! counters in the shared store are the only moving part.

mod common;

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    middleware::from_fn_with_state,
    routing::get,
    Router,
};
use tower::ServiceExt;

use portal_service::{build_router, middleware::rate_limit};

fn limited_app() -> Router {
    let ctx = common::test_context();
    Router::new()
        .route("/limited", get(|| async { "ok" }))
        .layer(from_fn_with_state(ctx.state.clone(), rate_limit))
        .with_state(ctx.state)
}

async fn hit(app: &Router, ip: &str) -> axum::http::Response<axum::body::Body> {
    app.clone()
        .oneshot(
            Request::builder()
                .uri("/limited")
                .header("x-forwarded-for", ip)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap()
}

#[tokio::test]
async fn test_requests_within_limit_pass() {
    let app = limited_app();

    // Test config allows 3 per window
    for _ in 0..3 {
        let response = hit(&app, "10.0.0.1").await;
        assert_eq!(response.status(), StatusCode::OK);
    }
}

#[tokio::test]
async fn test_request_over_limit_is_rejected_with_retry_after() {
    let app = limited_app();

    for _ in 0..3 {
        assert_eq!(hit(&app, "10.0.0.2").await.status(), StatusCode::OK);
    }

    let response = hit(&app, "10.0.0.2").await;
    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);

    let retry_after = response
        .headers()
        .get(header::RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<u64>().ok())
        .expect("Retry-After header");
    assert!(retry_after >= 1 && retry_after <= 60);
}

#[tokio::test]
async fn test_counters_are_per_identity() {
    let app = limited_app();

    for _ in 0..3 {
        assert_eq!(hit(&app, "10.0.0.3").await.status(), StatusCode::OK);
    }
    assert_eq!(
        hit(&app, "10.0.0.3").await.status(),
        StatusCode::TOO_MANY_REQUESTS
    );

    // A different caller still has a fresh window
    assert_eq!(hit(&app, "10.0.0.4").await.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_anonymous_feedback_submission_is_limited_by_ip() {
    // Feedback takes no token, so the limiter keys on the client IP
    let ctx = common::test_context();
    let app = build_router(ctx.state);

    let post = |ip: &'static str| {
        let app = app.clone();
        async move {
            app.oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/v1/branches/feedback")
                    .header("x-forwarded-for", ip)
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(r#"{"branch_id":1,"rating":5}"#))
                    .unwrap(),
            )
            .await
            .unwrap()
        }
    };

    // Test config allows 3 per window; the limiter counts the attempt
    // whether or not the handler succeeds
    for _ in 0..3 {
        let response = post("10.1.0.1").await;
        assert_ne!(response.status(), StatusCode::TOO_MANY_REQUESTS);
    }

    let response = post("10.1.0.1").await;
    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);

    // A different IP still has a fresh window
    let response = post("10.1.0.2").await;
    assert_ne!(response.status(), StatusCode::TOO_MANY_REQUESTS);
}
