use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};

use crate::dtos::{
    org::{
        CreateDepartmentRequest, DepartmentListParams, DepartmentResponse, UpdateDepartmentRequest,
    },
    MessageResponse, Paginated,
};
use crate::error::AppError;
use crate::services::cache::keys;
use crate::utils::ValidatedJson;
use crate::AppState;

/// Create a department under a role
#[utoipa::path(
    post,
    path = "/api/v1/departments",
    request_body = CreateDepartmentRequest,
    responses(
        (status = 201, description = "Department created", body = DepartmentResponse),
        (status = 403, description = "Superuser privileges required", body = ErrorResponse),
        (status = 404, description = "Role not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Directory"
)]
pub async fn create(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<CreateDepartmentRequest>,
) -> Result<impl IntoResponse, AppError> {
    state
        .db
        .find_role(req.role_id)
        .await?
        .ok_or(AppError::NotFound("Role not found".to_string()))?;

    let department = state.db.insert_department(&req.name, req.role_id).await?;
    Ok((StatusCode::CREATED, Json(DepartmentResponse::from(department))))
}

/// List departments with person counts, optionally filtered by role
#[utoipa::path(
    get,
    path = "/api/v1/departments",
    params(DepartmentListParams),
    responses(
        (status = 200, description = "Page of departments", body = PaginatedDepartments),
        (status = 401, description = "Not authenticated", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Directory"
)]
pub async fn list(
    State(state): State<AppState>,
    Query(params): Query<DepartmentListParams>,
) -> Result<impl IntoResponse, AppError> {
    let page = params.page.unwrap_or(1).max(1);
    let page_size = params.page_size.unwrap_or(10).clamp(1, 100);
    let offset = (page - 1) * page_size;

    let departments = state
        .db
        .list_departments_with_counts(params.role_id, page_size, offset)
        .await?;
    let total = state.db.count_departments(params.role_id).await?;

    let data: Vec<DepartmentResponse> = departments
        .into_iter()
        .map(DepartmentResponse::from)
        .collect();
    Ok(Json(Paginated::new(data, page, page_size, total)))
}

/// Update a department
#[utoipa::path(
    patch,
    path = "/api/v1/departments/{id}",
    params(("id" = i64, Path, description = "Department ID")),
    request_body = UpdateDepartmentRequest,
    responses(
        (status = 200, description = "Department updated", body = DepartmentResponse),
        (status = 403, description = "Superuser privileges required", body = ErrorResponse),
        (status = 404, description = "Department not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Directory"
)]
pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    ValidatedJson(req): ValidatedJson<UpdateDepartmentRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Some(role_id) = req.role_id {
        state
            .db
            .find_role(role_id)
            .await?
            .ok_or(AppError::NotFound("Role not found".to_string()))?;
    }

    let department = state
        .db
        .update_department(id, req.name.as_deref(), req.role_id)
        .await?;
    // Cached person bodies embed the department name
    state.cache.invalidate(&[], &[keys::person_pattern()]).await;
    Ok(Json(DepartmentResponse::from(department)))
}

/// Delete a department
#[utoipa::path(
    delete,
    path = "/api/v1/departments/{id}",
    params(("id" = i64, Path, description = "Department ID")),
    responses(
        (status = 200, description = "Department deleted", body = MessageResponse),
        (status = 403, description = "Superuser privileges required", body = ErrorResponse),
        (status = 404, description = "Department not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Directory"
)]
pub async fn delete(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    state.db.delete_department(id).await?;
    state.cache.invalidate(&[], &[keys::person_pattern()]).await;
    Ok(Json(MessageResponse::new("Department deleted")))
}
