pub mod config;
pub mod dtos;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod services;
pub mod utils;
pub mod workers;

use axum::{
    extract::DefaultBodyLimit,
    http::{header, HeaderValue, Method},
    middleware::{from_fn, from_fn_with_state},
    routing::{delete, get, patch, post},
    Json, Router,
};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, services::ServeDir, trace::TraceLayer};
use utoipa::{openapi::security::SecurityScheme, Modify, OpenApi};
use utoipa_swagger_ui::SwaggerUi;

use crate::config::AppConfig;
use crate::error::AppError;
use crate::services::{AuthService, Database, JwtService, KeyValueStore, ResponseCache};
use crate::workers::JobQueue;

#[derive(OpenApi)]
#[openapi(
    paths(
        health_check,
        handlers::auth::register,
        handlers::auth::verify,
        handlers::auth::login,
        handlers::auth::logout,
        handlers::auth::refresh,
        handlers::users::me,
        handlers::users::delete_me,
        handlers::posts::list,
        handlers::posts::create,
        handlers::posts::update,
        handlers::posts::delete,
        handlers::roles::create,
        handlers::roles::list,
        handlers::departments::create,
        handlers::departments::list,
        handlers::departments::update,
        handlers::departments::delete,
        handlers::persons::create,
        handlers::persons::get_by_id,
        handlers::persons::list,
        handlers::persons::update,
        handlers::persons::delete,
        handlers::persons::export,
        handlers::branches::create,
        handlers::branches::delete,
        handlers::branches::list,
        handlers::branches::add_feedback,
        handlers::superuser::list_users,
        handlers::superuser::get_user,
        handlers::superuser::delete_user,
        handlers::superuser::assign_tier,
        handlers::superuser::list_posts,
        handlers::superuser::delete_post,
        handlers::superuser::create_tier,
        handlers::superuser::list_tiers,
        handlers::superuser::get_tier,
        handlers::superuser::update_tier,
        handlers::superuser::delete_tier,
        handlers::superuser::create_rate_limit,
        handlers::superuser::list_rate_limits,
        handlers::superuser::update_rate_limit,
        handlers::superuser::delete_rate_limit,
    ),
    components(
        schemas(
            dtos::ErrorResponse,
            dtos::MessageResponse,
            dtos::auth::RegisterRequest,
            dtos::auth::RegisterResponse,
            dtos::auth::VerifyRequest,
            dtos::auth::LoginRequest,
            dtos::auth::LogoutRequest,
            dtos::auth::RefreshRequest,
            dtos::auth::TokenResponse,
            dtos::users::UserResponse,
            dtos::posts::CreatePostRequest,
            dtos::posts::UpdatePostRequest,
            dtos::posts::PostResponse,
            dtos::PaginatedPosts,
            dtos::PaginatedUsers,
            dtos::PaginatedPersons,
            dtos::PaginatedDepartments,
            dtos::org::CreateRoleRequest,
            dtos::org::RoleResponse,
            dtos::org::RoleListResponse,
            dtos::org::CreateDepartmentRequest,
            dtos::org::UpdateDepartmentRequest,
            dtos::org::DepartmentResponse,
            dtos::org::UpdatePersonRequest,
            dtos::org::PersonResponse,
            dtos::org::ExportQueuedResponse,
            dtos::branches::CreateBranchRequest,
            dtos::branches::FeedbackRequest,
            dtos::branches::BranchResponse,
            dtos::branches::BranchListResponse,
            dtos::admin::CreateTierRequest,
            dtos::admin::UpdateTierRequest,
            dtos::admin::TierResponse,
            dtos::admin::TierListResponse,
            dtos::admin::AssignTierRequest,
            dtos::admin::CreateRateLimitRequest,
            dtos::admin::UpdateRateLimitRequest,
            dtos::admin::RateLimitResponse,
            dtos::admin::RateLimitListResponse,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Authentication", description = "Phone-verified registration and token management"),
        (name = "Users", description = "Account self-service"),
        (name = "Posts", description = "User posts"),
        (name = "Directory", description = "Roles, departments and persons"),
        (name = "Feedback", description = "Branch ratings"),
        (name = "Admin", description = "Superuser operations"),
        (name = "Observability", description = "Service health"),
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    utoipa::openapi::security::HttpBuilder::new()
                        .scheme(utoipa::openapi::security::HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

#[derive(Clone)]
pub struct AppState {
    pub config: AppConfig,
    pub db: Database,
    pub jwt: JwtService,
    pub kv: Arc<dyn KeyValueStore>,
    pub cache: ResponseCache,
    pub auth: AuthService,
    pub jobs: JobQueue,
}

pub fn build_router(state: AppState) -> Router {
    // Open endpoints
    let auth_routes = Router::new()
        .route("/auth/register", post(handlers::auth::register))
        .route("/auth/verify", post(handlers::auth::verify))
        .route("/auth/login", post(handlers::auth::login))
        .route("/auth/refresh", post(handlers::auth::refresh));

    // Branch listing and feedback serve anonymous callers; submission
    // is rate limited, keyed by account when a token is presented and
    // by client IP otherwise
    let feedback_routes = Router::new()
        .route("/branches", get(handlers::branches::list))
        .merge(
            Router::new()
                .route("/branches/feedback", post(handlers::branches::add_feedback))
                .layer(from_fn_with_state(state.clone(), middleware::rate_limit))
                .layer(from_fn_with_state(state.clone(), middleware::optional_auth)),
        );

    // Post creation carries the tier rate limit on top of auth
    let post_create_route = Router::new()
        .route("/posts", post(handlers::posts::create))
        .layer(from_fn_with_state(state.clone(), middleware::rate_limit))
        .layer(from_fn_with_state(state.clone(), middleware::require_auth));

    // Everything a verified account may do
    let user_routes = Router::new()
        .route(
            "/users/me",
            get(handlers::users::me).delete(handlers::users::delete_me),
        )
        .route("/auth/logout", post(handlers::auth::logout))
        .route("/posts", get(handlers::posts::list))
        .route(
            "/posts/:id",
            patch(handlers::posts::update).delete(handlers::posts::delete),
        )
        .route("/roles", get(handlers::roles::list))
        .route("/departments", get(handlers::departments::list))
        .route("/persons", get(handlers::persons::list))
        .route("/persons/:id", get(handlers::persons::get_by_id))
        .layer(from_fn_with_state(state.clone(), middleware::require_auth));

    // Directory management and the admin surface
    let superuser_routes = Router::new()
        .route("/roles", post(handlers::roles::create))
        .route("/departments", post(handlers::departments::create))
        .route(
            "/departments/:id",
            patch(handlers::departments::update).delete(handlers::departments::delete),
        )
        .route("/persons", post(handlers::persons::create))
        .route("/persons/export", get(handlers::persons::export))
        .route(
            "/persons/:id",
            patch(handlers::persons::update).delete(handlers::persons::delete),
        )
        .route("/branches", post(handlers::branches::create))
        .route("/branches/:id", delete(handlers::branches::delete))
        .route("/superuser/users", get(handlers::superuser::list_users))
        .route(
            "/superuser/users/:id",
            get(handlers::superuser::get_user).delete(handlers::superuser::delete_user),
        )
        .route(
            "/superuser/users/:id/tier",
            patch(handlers::superuser::assign_tier),
        )
        .route("/superuser/posts", get(handlers::superuser::list_posts))
        .route(
            "/superuser/posts/:id",
            delete(handlers::superuser::delete_post),
        )
        .route(
            "/superuser/tiers",
            post(handlers::superuser::create_tier).get(handlers::superuser::list_tiers),
        )
        // GET looks the tier up by name; PATCH and DELETE take the id
        .route(
            "/superuser/tiers/:key",
            get(handlers::superuser::get_tier)
                .patch(handlers::superuser::update_tier)
                .delete(handlers::superuser::delete_tier),
        )
        .route(
            "/superuser/tiers/:tier_id/rate_limits",
            post(handlers::superuser::create_rate_limit),
        )
        .route(
            "/superuser/rate_limits",
            get(handlers::superuser::list_rate_limits),
        )
        .route(
            "/superuser/rate_limits/:id",
            patch(handlers::superuser::update_rate_limit)
                .delete(handlers::superuser::delete_rate_limit),
        )
        .layer(DefaultBodyLimit::max(
            state.config.media.upload_max_bytes + 64 * 1024,
        ))
        .layer(from_fn(middleware::require_superuser))
        .layer(from_fn_with_state(state.clone(), middleware::require_auth));

    let api = Router::new()
        .merge(auth_routes)
        .merge(feedback_routes)
        .merge(post_create_route)
        .merge(user_routes)
        .merge(superuser_routes);

    let mut app = Router::new()
        .route("/health", get(health_check))
        .nest("/api/v1", api)
        .nest_service("/storage", ServeDir::new(&state.config.media.root));

    if state.config.is_dev() {
        app = app.merge(SwaggerUi::new("/docs").url("/api-docs/openapi.json", ApiDoc::openapi()));
    } else {
        app = app.route(
            "/api-docs/openapi.json",
            get(|| async { Json(ApiDoc::openapi()) }),
        );
    }

    let allowed_origins: Vec<HeaderValue> = state
        .config
        .allowed_origins
        .iter()
        .filter_map(|o| match o.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::error!("Invalid CORS origin '{}': {}, skipping", o, e);
                None
            }
        })
        .collect();

    app.with_state(state)
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &axum::http::Request<_>| {
                let request_id = request
                    .headers()
                    .get("x-request-id")
                    .and_then(|value| value.to_str().ok())
                    .unwrap_or("-");

                tracing::info_span!(
                    "http_request",
                    request_id = %request_id,
                    method = %request.method(),
                    uri = %request.uri(),
                )
            }),
        )
        .layer(
            CorsLayer::new()
                .allow_origin(allowed_origins)
                .allow_methods([
                    Method::GET,
                    Method::POST,
                    Method::PATCH,
                    Method::DELETE,
                    Method::OPTIONS,
                ])
                .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE]),
        )
}

/// Service health check
#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Service is healthy"),
        (status = 500, description = "A dependency is unreachable")
    ),
    tag = "Observability"
)]
pub async fn health_check(
    axum::extract::State(state): axum::extract::State<AppState>,
) -> Result<Json<serde_json::Value>, AppError> {
    state.db.health_check().await.map_err(|e| {
        tracing::error!(error = %e, "Database health check failed");
        e
    })?;

    state.kv.ping().await.map_err(|e| {
        tracing::error!(error = %e, "Key-value store health check failed");
        AppError::InternalError(e)
    })?;

    Ok(Json(serde_json::json!({
        "status": "healthy",
        "service": state.config.service_name,
    })))
}
