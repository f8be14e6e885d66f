use axum::{extract::State, response::IntoResponse, Json};

use crate::dtos::{users::UserResponse, MessageResponse};
use crate::error::AppError;
use crate::middleware::CurrentUser;
use crate::AppState;

/// Get the authenticated account
#[utoipa::path(
    get,
    path = "/api/v1/users/me",
    responses(
        (status = 200, description = "Current account", body = UserResponse),
        (status = 401, description = "Not authenticated", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Users"
)]
pub async fn me(CurrentUser(user): CurrentUser) -> impl IntoResponse {
    Json(UserResponse::from(user))
}

/// Soft delete the authenticated account
#[utoipa::path(
    delete,
    path = "/api/v1/users/me",
    responses(
        (status = 200, description = "Account deleted", body = MessageResponse),
        (status = 401, description = "Not authenticated", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Users"
)]
pub async fn delete_me(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<impl IntoResponse, AppError> {
    state.db.soft_delete_user(user.id).await?;
    tracing::info!(user_id = user.id, "Account soft deleted");
    Ok(Json(MessageResponse::new("Account deleted")))
}
