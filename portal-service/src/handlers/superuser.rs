//! Administrative endpoints. Every route here sits behind the
//! superuser middleware.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use utoipa::IntoParams;

use crate::dtos::{
    admin::{
        AssignTierRequest, CreateRateLimitRequest, CreateTierRequest, RateLimitListResponse,
        RateLimitResponse, TierListResponse, TierResponse, UpdateRateLimitRequest,
        UpdateTierRequest,
    },
    posts::PostResponse,
    users::UserResponse,
    MessageResponse, PageParams, Paginated,
};
use crate::error::AppError;
use crate::models::RateLimitRule;
use crate::utils::ValidatedJson;
use crate::AppState;

// Users

/// List all accounts
#[utoipa::path(
    get,
    path = "/api/v1/superuser/users",
    params(PageParams),
    responses(
        (status = 200, description = "Page of users", body = PaginatedUsers),
        (status = 403, description = "Superuser privileges required", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn list_users(
    State(state): State<AppState>,
    Query(params): Query<PageParams>,
) -> Result<impl IntoResponse, AppError> {
    let (page, page_size) = params.normalized();
    let users = state.db.list_users(page_size, params.offset()).await?;
    let total = state.db.count_users().await?;

    let data: Vec<UserResponse> = users.into_iter().map(UserResponse::from).collect();
    Ok(Json(Paginated::new(data, page, page_size, total)))
}

/// Get any account by ID
#[utoipa::path(
    get,
    path = "/api/v1/superuser/users/{id}",
    params(("id" = i64, Path, description = "User ID")),
    responses(
        (status = 200, description = "The account", body = UserResponse),
        (status = 404, description = "User not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn get_user(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let user = state
        .db
        .find_user_by_id(id)
        .await?
        .ok_or(AppError::NotFound("User not found".to_string()))?;
    Ok(Json(UserResponse::from(user)))
}

/// Soft delete any account
#[utoipa::path(
    delete,
    path = "/api/v1/superuser/users/{id}",
    params(("id" = i64, Path, description = "User ID")),
    responses(
        (status = 200, description = "User deleted", body = MessageResponse),
        (status = 404, description = "User not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn delete_user(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    state.db.soft_delete_user(id).await?;
    tracing::info!(user_id = id, "User soft deleted by admin");
    Ok(Json(MessageResponse::new("User deleted")))
}

/// Assign a tier to an account
#[utoipa::path(
    patch,
    path = "/api/v1/superuser/users/{id}/tier",
    params(("id" = i64, Path, description = "User ID")),
    request_body = AssignTierRequest,
    responses(
        (status = 200, description = "Tier assigned", body = UserResponse),
        (status = 404, description = "User or tier not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn assign_tier(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(req): Json<AssignTierRequest>,
) -> Result<impl IntoResponse, AppError> {
    state
        .db
        .find_tier(req.tier_id)
        .await?
        .ok_or(AppError::NotFound("Tier not found".to_string()))?;

    let user = state.db.update_user_tier(id, req.tier_id).await?;
    Ok(Json(UserResponse::from(user)))
}

// Posts

/// List every post regardless of owner
#[utoipa::path(
    get,
    path = "/api/v1/superuser/posts",
    params(PageParams),
    responses(
        (status = 200, description = "Page of posts", body = PaginatedPosts),
        (status = 403, description = "Superuser privileges required", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn list_posts(
    State(state): State<AppState>,
    Query(params): Query<PageParams>,
) -> Result<impl IntoResponse, AppError> {
    let (page, page_size) = params.normalized();
    let posts = state.db.list_posts(page_size, params.offset()).await?;
    let total = state.db.count_posts().await?;

    let data: Vec<PostResponse> = posts.into_iter().map(PostResponse::from).collect();
    Ok(Json(Paginated::new(data, page, page_size, total)))
}

/// Soft delete any post
#[utoipa::path(
    delete,
    path = "/api/v1/superuser/posts/{id}",
    params(("id" = i64, Path, description = "Post ID")),
    responses(
        (status = 200, description = "Post deleted", body = MessageResponse),
        (status = 404, description = "Post not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn delete_post(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    state.db.soft_delete_post(id).await?;
    Ok(Json(MessageResponse::new("Post deleted")))
}

// Tiers

/// Create a tier
#[utoipa::path(
    post,
    path = "/api/v1/superuser/tiers",
    request_body = CreateTierRequest,
    responses(
        (status = 201, description = "Tier created", body = TierResponse),
        (status = 409, description = "Tier name already exists", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn create_tier(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<CreateTierRequest>,
) -> Result<impl IntoResponse, AppError> {
    let tier = state.db.insert_tier(&req.name).await?;
    Ok((StatusCode::CREATED, Json(TierResponse::from(tier))))
}

/// List tiers
#[utoipa::path(
    get,
    path = "/api/v1/superuser/tiers",
    responses(
        (status = 200, description = "All tiers", body = TierListResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn list_tiers(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let tiers = state.db.list_tiers().await?;
    let total = tiers.len() as i64;
    let data: Vec<TierResponse> = tiers.into_iter().map(TierResponse::from).collect();
    Ok(Json(TierListResponse { data, total }))
}

/// Get a tier by name
#[utoipa::path(
    get,
    path = "/api/v1/superuser/tiers/{name}",
    params(("name" = String, Path, description = "Tier name")),
    responses(
        (status = 200, description = "The tier", body = TierResponse),
        (status = 404, description = "Tier not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn get_tier(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let tier = state
        .db
        .find_tier_by_name(&name)
        .await?
        .ok_or(AppError::NotFound("Tier not found".to_string()))?;
    Ok(Json(TierResponse::from(tier)))
}

/// Rename a tier
#[utoipa::path(
    patch,
    path = "/api/v1/superuser/tiers/{id}",
    params(("id" = i64, Path, description = "Tier ID")),
    request_body = UpdateTierRequest,
    responses(
        (status = 200, description = "Tier updated", body = TierResponse),
        (status = 404, description = "Tier not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn update_tier(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    ValidatedJson(req): ValidatedJson<UpdateTierRequest>,
) -> Result<impl IntoResponse, AppError> {
    let tier = state.db.update_tier(id, &req.name).await?;
    Ok(Json(TierResponse::from(tier)))
}

/// Delete a tier
#[utoipa::path(
    delete,
    path = "/api/v1/superuser/tiers/{id}",
    params(("id" = i64, Path, description = "Tier ID")),
    responses(
        (status = 200, description = "Tier deleted", body = MessageResponse),
        (status = 404, description = "Tier not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn delete_tier(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    state.db.delete_tier(id).await?;
    Ok(Json(MessageResponse::new("Tier deleted")))
}

// Rate-limit rules

/// Create a rate-limit rule for a tier
#[utoipa::path(
    post,
    path = "/api/v1/superuser/tiers/{tier_id}/rate_limits",
    params(("tier_id" = i64, Path, description = "Tier ID")),
    request_body = CreateRateLimitRequest,
    responses(
        (status = 201, description = "Rule created", body = RateLimitResponse),
        (status = 404, description = "Tier not found", body = ErrorResponse),
        (status = 409, description = "Equivalent rule already exists", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn create_rate_limit(
    State(state): State<AppState>,
    Path(tier_id): Path<i64>,
    ValidatedJson(req): ValidatedJson<CreateRateLimitRequest>,
) -> Result<impl IntoResponse, AppError> {
    state
        .db
        .find_tier(tier_id)
        .await?
        .ok_or(AppError::NotFound("Tier not found".to_string()))?;

    let name = RateLimitRule::derive_name(&req.path, req.limit, req.period);
    let rule = state
        .db
        .insert_rate_limit(tier_id, &name, &req.path, req.limit, req.period)
        .await?;
    Ok((StatusCode::CREATED, Json(RateLimitResponse::from(rule))))
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct RateLimitListParams {
    pub tier_id: Option<i64>,
}

/// List rate-limit rules, optionally for one tier
#[utoipa::path(
    get,
    path = "/api/v1/superuser/rate_limits",
    params(RateLimitListParams),
    responses(
        (status = 200, description = "Matching rules", body = RateLimitListResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn list_rate_limits(
    State(state): State<AppState>,
    Query(params): Query<RateLimitListParams>,
) -> Result<impl IntoResponse, AppError> {
    let rules = state.db.list_rate_limits(params.tier_id).await?;
    let total = rules.len() as i64;
    let data: Vec<RateLimitResponse> = rules.into_iter().map(RateLimitResponse::from).collect();
    Ok(Json(RateLimitListResponse { data, total }))
}

/// Update a rate-limit rule. The rule name is re-derived from the new
/// values.
#[utoipa::path(
    patch,
    path = "/api/v1/superuser/rate_limits/{id}",
    params(("id" = i64, Path, description = "Rule ID")),
    request_body = UpdateRateLimitRequest,
    responses(
        (status = 200, description = "Rule updated", body = RateLimitResponse),
        (status = 404, description = "Rule not found", body = ErrorResponse),
        (status = 409, description = "Equivalent rule already exists", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn update_rate_limit(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    ValidatedJson(req): ValidatedJson<UpdateRateLimitRequest>,
) -> Result<impl IntoResponse, AppError> {
    let name = RateLimitRule::derive_name(&req.path, req.limit, req.period);
    let rule = state
        .db
        .update_rate_limit(id, &name, Some(&req.path), Some(req.limit), Some(req.period))
        .await?;
    Ok(Json(RateLimitResponse::from(rule)))
}

/// Delete a rate-limit rule
#[utoipa::path(
    delete,
    path = "/api/v1/superuser/rate_limits/{id}",
    params(("id" = i64, Path, description = "Rule ID")),
    responses(
        (status = 200, description = "Rule deleted", body = MessageResponse),
        (status = 404, description = "Rule not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn delete_rate_limit(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    state.db.delete_rate_limit(id).await?;
    Ok(Json(MessageResponse::new("Rate limit rule deleted")))
}
