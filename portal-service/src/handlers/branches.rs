use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};

use crate::dtos::{
    branches::{BranchListResponse, BranchResponse, CreateBranchRequest, FeedbackRequest},
    MessageResponse,
};
use crate::error::AppError;
use crate::services::cache::keys;
use crate::utils::ValidatedJson;
use crate::AppState;

/// Create a branch
#[utoipa::path(
    post,
    path = "/api/v1/branches",
    request_body = CreateBranchRequest,
    responses(
        (status = 201, description = "Branch created", body = BranchResponse),
        (status = 403, description = "Superuser privileges required", body = ErrorResponse),
        (status = 409, description = "Branch name already exists", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Feedback"
)]
pub async fn create(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<CreateBranchRequest>,
) -> Result<impl IntoResponse, AppError> {
    let branch = state.db.insert_branch(&req.name).await?;
    state.cache.invalidate(&[keys::branches()], &[]).await;
    Ok((StatusCode::CREATED, Json(BranchResponse::from(branch))))
}

/// Delete a branch
#[utoipa::path(
    delete,
    path = "/api/v1/branches/{id}",
    params(("id" = i64, Path, description = "Branch ID")),
    responses(
        (status = 200, description = "Branch deleted", body = MessageResponse),
        (status = 403, description = "Superuser privileges required", body = ErrorResponse),
        (status = 404, description = "Branch not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Feedback"
)]
pub async fn delete(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    state.db.delete_branch(id).await?;
    state.cache.invalidate(&[keys::branches()], &[]).await;
    Ok(Json(MessageResponse::new("Branch deleted")))
}

/// List all branches with their ratings (cached, no auth required)
#[utoipa::path(
    get,
    path = "/api/v1/branches",
    responses(
        (status = 200, description = "All branches", body = BranchListResponse)
    ),
    tag = "Feedback"
)]
pub async fn list(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let cache_key = keys::branches();
    if let Some(body) = state.cache.get(&cache_key).await {
        return Ok(json_body(body));
    }

    let branches = state.db.list_branches().await?;
    let total = branches.len() as i64;
    let data: Vec<BranchResponse> = branches.into_iter().map(BranchResponse::from).collect();

    let body = serde_json::to_string(&BranchListResponse { data, total })
        .map_err(|e| AppError::InternalError(anyhow::anyhow!("Serialization failed: {}", e)))?;
    state.cache.put(&cache_key, &body).await;

    Ok(json_body(body))
}

/// Record a 1-5 star rating for a branch. Open to anonymous callers;
/// submissions are rate limited per account or per client IP.
#[utoipa::path(
    post,
    path = "/api/v1/branches/feedback",
    request_body = FeedbackRequest,
    responses(
        (status = 200, description = "Feedback recorded", body = BranchResponse),
        (status = 404, description = "Branch not found", body = ErrorResponse),
        (status = 422, description = "Rating out of range", body = ErrorResponse),
        (status = 429, description = "Rate limit exceeded", body = ErrorResponse)
    ),
    tag = "Feedback"
)]
pub async fn add_feedback(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<FeedbackRequest>,
) -> Result<impl IntoResponse, AppError> {
    let branch = state
        .db
        .add_branch_feedback(req.branch_id, req.rating as u8)
        .await?;
    state.cache.invalidate(&[keys::branches()], &[]).await;
    Ok(Json(BranchResponse::from(branch)))
}

fn json_body(body: String) -> axum::response::Response {
    ([(header::CONTENT_TYPE, "application/json")], body).into_response()
}
