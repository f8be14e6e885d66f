use axum::{
    extract::{Multipart, Path, Query, State},
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use uuid::Uuid;
use validator::Validate;

use crate::dtos::{
    org::{ExportQueuedResponse, PersonListParams, PersonResponse, UpdatePersonRequest},
    MessageResponse, Paginated,
};
use crate::error::AppError;
use crate::services::cache::keys;
use crate::workers::Job;
use crate::AppState;

/// Create a person with a photo (multipart form)
#[utoipa::path(
    post,
    path = "/api/v1/persons",
    request_body(content = String, content_type = "multipart/form-data"),
    responses(
        (status = 201, description = "Person created", body = PersonResponse),
        (status = 400, description = "Missing or invalid form fields", body = ErrorResponse),
        (status = 403, description = "Superuser privileges required", body = ErrorResponse),
        (status = 413, description = "Photo too large", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Directory"
)]
pub async fn create(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, AppError> {
    let mut first_name: Option<String> = None;
    let mut last_name: Option<String> = None;
    let mut department_id: Option<i64> = None;
    let mut image: Option<(String, Vec<u8>)> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(format!("Invalid multipart body: {}", e)))?
    {
        match field.name().unwrap_or_default() {
            "first_name" => {
                first_name = Some(read_text(field).await?);
            }
            "last_name" => {
                last_name = Some(read_text(field).await?);
            }
            "department_id" => {
                let raw = read_text(field).await?;
                department_id = Some(raw.parse().map_err(|_| {
                    AppError::BadRequest("department_id must be an integer".to_string())
                })?);
            }
            "image" => {
                let content_type = field.content_type().unwrap_or_default().to_string();
                if !content_type.starts_with("image/") {
                    return Err(AppError::BadRequest(
                        "Uploaded file must be an image".to_string(),
                    ));
                }
                let file_name = field.file_name().unwrap_or("upload").to_string();
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::BadRequest(format!("Failed to read upload: {}", e)))?;
                if bytes.len() > state.config.media.upload_max_bytes {
                    return Err(AppError::PayloadTooLarge("Photo too large".to_string()));
                }
                image = Some((file_name, bytes.to_vec()));
            }
            _ => {}
        }
    }

    let first_name =
        first_name.ok_or(AppError::BadRequest("first_name is required".to_string()))?;
    let last_name = last_name.ok_or(AppError::BadRequest("last_name is required".to_string()))?;
    let department_id =
        department_id.ok_or(AppError::BadRequest("department_id is required".to_string()))?;
    let (file_name, bytes) = image.ok_or(AppError::BadRequest("image is required".to_string()))?;

    if first_name.is_empty() || last_name.is_empty() {
        return Err(AppError::BadRequest(
            "first_name and last_name must be non-empty".to_string(),
        ));
    }

    state
        .db
        .find_department(department_id)
        .await?
        .ok_or(AppError::NotFound("Department not found".to_string()))?;

    let image_url = store_photo(&state, &file_name, &bytes).await?;
    let person = state
        .db
        .insert_person(&first_name, &last_name, &image_url, department_id)
        .await?;

    tracing::info!(person_id = person.id, "Person created");
    Ok((StatusCode::CREATED, Json(PersonResponse::from(person))))
}

/// Get a person by ID (cached)
#[utoipa::path(
    get,
    path = "/api/v1/persons/{id}",
    params(("id" = i64, Path, description = "Person ID")),
    responses(
        (status = 200, description = "Person with department", body = PersonResponse),
        (status = 404, description = "Person not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Directory"
)]
pub async fn get_by_id(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let cache_key = keys::person(id);
    if let Some(body) = state.cache.get(&cache_key).await {
        return Ok(json_body(body));
    }

    let person = state
        .db
        .find_person_with_department(id)
        .await?
        .ok_or(AppError::NotFound("Person not found".to_string()))?;

    let body = serde_json::to_string(&PersonResponse::from(person))
        .map_err(|e| AppError::InternalError(anyhow::anyhow!("Serialization failed: {}", e)))?;
    state.cache.put(&cache_key, &body).await;

    Ok(json_body(body))
}

/// List persons, optionally filtered by department
#[utoipa::path(
    get,
    path = "/api/v1/persons",
    params(PersonListParams),
    responses(
        (status = 200, description = "Page of persons", body = PaginatedPersons),
        (status = 401, description = "Not authenticated", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Directory"
)]
pub async fn list(
    State(state): State<AppState>,
    Query(params): Query<PersonListParams>,
) -> Result<impl IntoResponse, AppError> {
    let page = params.page.unwrap_or(1).max(1);
    let page_size = params.page_size.unwrap_or(10).clamp(1, 100);
    let offset = (page - 1) * page_size;

    let persons = state
        .db
        .list_persons(params.department_id, page_size, offset)
        .await?;
    let total = state.db.count_persons(params.department_id).await?;

    let data: Vec<PersonResponse> = persons.into_iter().map(PersonResponse::from).collect();
    Ok(Json(Paginated::new(data, page, page_size, total)))
}

/// Update a person's fields (photo is immutable here)
#[utoipa::path(
    patch,
    path = "/api/v1/persons/{id}",
    params(("id" = i64, Path, description = "Person ID")),
    request_body = UpdatePersonRequest,
    responses(
        (status = 200, description = "Person updated", body = PersonResponse),
        (status = 403, description = "Superuser privileges required", body = ErrorResponse),
        (status = 404, description = "Person not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Directory"
)]
pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(req): Json<UpdatePersonRequest>,
) -> Result<impl IntoResponse, AppError> {
    req.validate()?;

    if let Some(department_id) = req.department_id {
        state
            .db
            .find_department(department_id)
            .await?
            .ok_or(AppError::NotFound("Department not found".to_string()))?;
    }

    let person = state
        .db
        .update_person(
            id,
            req.first_name.as_deref(),
            req.last_name.as_deref(),
            req.department_id,
        )
        .await?;

    state.cache.invalidate(&[keys::person(id)], &[]).await;
    Ok(Json(PersonResponse::from(person)))
}

/// Delete a person and their stored photo
#[utoipa::path(
    delete,
    path = "/api/v1/persons/{id}",
    params(("id" = i64, Path, description = "Person ID")),
    responses(
        (status = 200, description = "Person deleted", body = MessageResponse),
        (status = 403, description = "Superuser privileges required", body = ErrorResponse),
        (status = 404, description = "Person not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Directory"
)]
pub async fn delete(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let person = state.db.delete_person(id).await?;

    let photo = crate::workers::export::image_fs_path(
        std::path::Path::new(&state.config.media.root),
        &person.image_url,
    );
    if let Err(e) = tokio::fs::remove_file(&photo).await {
        tracing::warn!(person_id = id, path = ?photo, "Failed to remove photo: {}", e);
    }

    state.cache.invalidate(&[keys::person(id)], &[]).await;
    Ok(Json(MessageResponse::new("Person deleted")))
}

/// Queue the person directory export
#[utoipa::path(
    get,
    path = "/api/v1/persons/export",
    responses(
        (status = 202, description = "Export job queued", body = ExportQueuedResponse),
        (status = 403, description = "Superuser privileges required", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Directory"
)]
pub async fn export(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    state.jobs.enqueue(Job::ExportPersons)?;
    Ok((
        StatusCode::ACCEPTED,
        Json(ExportQueuedResponse {
            message: "Export job queued".to_string(),
        }),
    ))
}

async fn read_text(field: axum::extract::multipart::Field<'_>) -> Result<String, AppError> {
    field
        .text()
        .await
        .map_err(|e| AppError::BadRequest(format!("Failed to read field: {}", e)))
}

async fn store_photo(
    state: &AppState,
    original_name: &str,
    bytes: &[u8],
) -> Result<String, AppError> {
    let extension = original_name.rsplit('.').next().unwrap_or("bin");
    let file_name = format!("{}.{}", Uuid::new_v4(), extension);

    let images_dir = std::path::Path::new(&state.config.media.root).join("images");
    tokio::fs::create_dir_all(&images_dir).await?;
    tokio::fs::write(images_dir.join(&file_name), bytes).await?;

    Ok(format!("/storage/images/{}", file_name))
}

fn json_body(body: String) -> axum::response::Response {
    (
        [(header::CONTENT_TYPE, "application/json")],
        body,
    )
        .into_response()
}
