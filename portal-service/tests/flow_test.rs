//! End-to-end account flow against a real Postgres instance.
//!
//! Run with TEST_DATABASE_URL pointing at a scratch database:
//!   TEST_DATABASE_URL=postgres://... cargo test -- --ignored

mod common;

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use http_body_util::BodyExt;
use serde_json::Value;
use tower::ServiceExt;

use portal_service::build_router;

async fn send_json(app: &Router, method: &str, uri: &str, token: Option<&str>, body: Value) -> (StatusCode, Value) {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }

    let response = app
        .clone()
        .oneshot(builder.body(Body::from(body.to_string())).unwrap())
        .await
        .unwrap();

    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, json)
}

#[tokio::test]
#[ignore = "requires TEST_DATABASE_URL"]
async fn test_register_verify_login_post_flow() {
    let ctx = common::test_context();

    sqlx::migrate!("./migrations")
        .run(ctx.state.db.pool())
        .await
        .expect("migrations");

    let pool = ctx.state.db.pool().clone();
    let app = build_router(ctx.state);

    // Unique phone per run
    let phone = format!(
        "9989{}",
        chrono::Utc::now().timestamp_micros() % 100_000_000
    );

    let (status, body) = send_json(
        &app,
        "POST",
        "/api/v1/auth/register",
        None,
        serde_json::json!({
            // Names are unique among live accounts
            "name": format!("T {}", &phone[4..]),
            "phone_number": phone,
            "password": "pass123"
        }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{}", body);

    // Dev verifier pins the code; verify logs the account straight in
    let (status, body) = send_json(
        &app,
        "POST",
        "/api/v1/auth/verify",
        None,
        serde_json::json!({ "phone_number": phone, "code": "12345" }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{}", body);
    assert!(body["access_token"].is_string());
    assert!(body["refresh_token"].is_string());

    let (status, tokens) = send_json(
        &app,
        "POST",
        "/api/v1/auth/login",
        None,
        serde_json::json!({ "phone_number": phone, "password": "pass123" }),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{}", tokens);
    let access = tokens["access_token"].as_str().expect("access token");
    let refresh = tokens["refresh_token"].as_str().expect("refresh token");

    // Wrong password stays out
    let (status, _) = send_json(
        &app,
        "POST",
        "/api/v1/auth/login",
        None,
        serde_json::json!({ "phone_number": phone, "password": "wrong12" }),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, me) = send_json(&app, "GET", "/api/v1/users/me", Some(access), Value::Null).await;
    assert_eq!(status, StatusCode::OK, "{}", me);
    assert_eq!(me["phone_number"], phone.as_str());

    let (status, post) = send_json(
        &app,
        "POST",
        "/api/v1/posts",
        Some(access),
        serde_json::json!({ "title": "First post", "text": "Hello" }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{}", post);
    let post_id = post["id"].as_i64().expect("post id");

    let (status, page) = send_json(&app, "GET", "/api/v1/posts", Some(access), Value::Null).await;
    assert_eq!(status, StatusCode::OK);
    assert!(page["total"].as_i64().unwrap() >= 1);

    // Account names are unique among live accounts
    let (status, _) = send_json(
        &app,
        "POST",
        "/api/v1/auth/register",
        None,
        serde_json::json!({
            "name": format!("T {}", &phone[4..]),
            "phone_number": format!("9987{}", &phone[4..]),
            "password": "pass123"
        }),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    // A second account sees only its own (empty) post list
    let phone2 = format!("9988{}", &phone[4..]);
    let (status, _) = send_json(
        &app,
        "POST",
        "/api/v1/auth/register",
        None,
        serde_json::json!({
            "name": format!("T2 {}", &phone2[4..]),
            "phone_number": phone2,
            "password": "pass123"
        }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, tokens2) = send_json(
        &app,
        "POST",
        "/api/v1/auth/verify",
        None,
        serde_json::json!({ "phone_number": phone2, "code": "12345" }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{}", tokens2);
    let access2 = tokens2["access_token"].as_str().expect("access token");

    let (status, page2) = send_json(&app, "GET", "/api/v1/posts", Some(access2), Value::Null).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(page2["total"].as_i64().unwrap(), 0, "{}", page2);

    let (status, me2) = send_json(&app, "GET", "/api/v1/users/me", Some(access2), Value::Null).await;
    assert_eq!(status, StatusCode::OK);
    let user2_id = me2["id"].as_i64().expect("user id");

    // Soft delete tombstones the phone number, freeing it for re-use
    let (status, _) = send_json(&app, "DELETE", "/api/v1/users/me", Some(access2), Value::Null).await;
    assert_eq!(status, StatusCode::OK);

    let (tombstone, is_verified): (String, bool) =
        sqlx::query_as("SELECT phone_number, is_verified FROM users WHERE id = $1")
            .bind(user2_id)
            .fetch_one(&pool)
            .await
            .expect("deleted row");
    assert_eq!(tombstone, format!("del:{}", user2_id));
    assert!(!is_verified);

    // Deleted rows are invisible to the auth lookup
    let (status, _) = send_json(&app, "GET", "/api/v1/users/me", Some(access2), Value::Null).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = send_json(
        &app,
        "POST",
        "/api/v1/auth/register",
        None,
        serde_json::json!({
            "name": format!("T2 {}", &phone2[4..]),
            "phone_number": phone2,
            "password": "pass123"
        }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, _) = send_json(
        &app,
        "DELETE",
        &format!("/api/v1/posts/{}", post_id),
        Some(access),
        Value::Null,
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    // Refresh works until the token is revoked
    let (status, refreshed) = send_json(
        &app,
        "POST",
        "/api/v1/auth/refresh",
        None,
        serde_json::json!({ "refresh_token": refresh }),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{}", refreshed);
    assert!(refreshed["access_token"].is_string());
    assert!(refreshed["refresh_token"].is_null());

    // Logout requires a live session and returns no body
    let (status, _) = send_json(
        &app,
        "POST",
        "/api/v1/auth/logout",
        Some(access),
        serde_json::json!({ "refresh_token": refresh }),
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    // Logout is idempotent
    let (status, _) = send_json(
        &app,
        "POST",
        "/api/v1/auth/logout",
        Some(access),
        serde_json::json!({ "refresh_token": refresh }),
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = send_json(
        &app,
        "POST",
        "/api/v1/auth/refresh",
        None,
        serde_json::json!({ "refresh_token": refresh }),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}
