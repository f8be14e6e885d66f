mod common;

use axum::{
    body::Body,
    http::{Request, StatusCode},
    middleware::from_fn,
    routing::get,
    Router,
};
use chrono::Utc;
use tower::ServiceExt;

use portal_service::build_router;
use portal_service::middleware::require_superuser;
use portal_service::models::User;

fn user(is_superuser: bool) -> User {
    User {
        id: 1,
        name: "Admin".to_string(),
        email: None,
        phone_number: "998991234567".to_string(),
        hashed_password: "$argon2id$test".to_string(),
        image_url: None,
        is_active: true,
        is_verified: true,
        is_superuser,
        tier_id: None,
        created_at: Utc::now(),
        updated_at: None,
        deleted_at: None,
        is_deleted: false,
    }
}

fn guarded_app() -> Router {
    Router::new()
        .route("/guarded", get(|| async { "ok" }))
        .layer(from_fn(require_superuser))
}

#[tokio::test]
async fn test_superuser_passes_guard() {
    let mut request = Request::builder()
        .uri("/guarded")
        .body(Body::empty())
        .unwrap();
    request.extensions_mut().insert(user(true));

    let response = guarded_app().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_regular_user_is_forbidden() {
    let mut request = Request::builder()
        .uri("/guarded")
        .body(Body::empty())
        .unwrap();
    request.extensions_mut().insert(user(false));

    let response = guarded_app().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_unresolved_account_is_unauthorized() {
    let request = Request::builder()
        .uri("/guarded")
        .body(Body::empty())
        .unwrap();

    let response = guarded_app().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_admin_routes_require_a_token() {
    let ctx = common::test_context();
    let app = build_router(ctx.state);

    for uri in [
        "/api/v1/superuser/users",
        "/api/v1/superuser/users/1",
        "/api/v1/superuser/tiers",
        "/api/v1/superuser/tiers/default",
        "/api/v1/superuser/rate_limits",
    ] {
        let response = app
            .clone()
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED, "{}", uri);
    }
}
