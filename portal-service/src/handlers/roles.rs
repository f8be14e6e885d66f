use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};

use crate::dtos::org::{CreateRoleRequest, RoleListResponse, RoleResponse};
use crate::error::AppError;
use crate::utils::ValidatedJson;
use crate::AppState;

/// Create a directory role
#[utoipa::path(
    post,
    path = "/api/v1/roles",
    request_body = CreateRoleRequest,
    responses(
        (status = 201, description = "Role created", body = RoleResponse),
        (status = 403, description = "Superuser privileges required", body = ErrorResponse),
        (status = 409, description = "Role name already exists", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Directory"
)]
pub async fn create(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<CreateRoleRequest>,
) -> Result<impl IntoResponse, AppError> {
    let role = state.db.insert_role(&req.name).await?;
    Ok((StatusCode::CREATED, Json(RoleResponse::from(role))))
}

/// List directory roles
#[utoipa::path(
    get,
    path = "/api/v1/roles",
    responses(
        (status = 200, description = "All roles", body = RoleListResponse),
        (status = 401, description = "Not authenticated", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Directory"
)]
pub async fn list(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let roles = state.db.list_roles().await?;
    let total = roles.len() as i64;
    let data: Vec<RoleResponse> = roles.into_iter().map(RoleResponse::from).collect();
    Ok(Json(RoleListResponse { data, total }))
}
