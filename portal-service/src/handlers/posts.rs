use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};

use crate::dtos::{
    posts::{CreatePostRequest, PostResponse, UpdatePostRequest},
    MessageResponse, PageParams, Paginated,
};
use crate::error::AppError;
use crate::middleware::CurrentUser;
use crate::models::User;
use crate::utils::ValidatedJson;
use crate::AppState;

/// List the caller's posts, newest first
#[utoipa::path(
    get,
    path = "/api/v1/posts",
    params(PageParams),
    responses(
        (status = 200, description = "Page of the caller's posts", body = PaginatedPosts),
        (status = 401, description = "Not authenticated", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Posts"
)]
pub async fn list(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Query(params): Query<PageParams>,
) -> Result<impl IntoResponse, AppError> {
    let (page, page_size) = params.normalized();
    let posts = state
        .db
        .list_posts_for_user(user.id, page_size, params.offset())
        .await?;
    let total = state.db.count_posts_for_user(user.id).await?;

    let data: Vec<PostResponse> = posts.into_iter().map(PostResponse::from).collect();
    Ok(Json(Paginated::new(data, page, page_size, total)))
}

/// Create a post
#[utoipa::path(
    post,
    path = "/api/v1/posts",
    request_body = CreatePostRequest,
    responses(
        (status = 201, description = "Post created", body = PostResponse),
        (status = 401, description = "Not authenticated", body = ErrorResponse),
        (status = 422, description = "Validation error", body = ErrorResponse),
        (status = 429, description = "Rate limit exceeded", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Posts"
)]
pub async fn create(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    ValidatedJson(req): ValidatedJson<CreatePostRequest>,
) -> Result<impl IntoResponse, AppError> {
    let post = state
        .db
        .insert_post(user.id, &req.title, &req.text, req.image_url.as_deref())
        .await?;
    Ok((StatusCode::CREATED, Json(PostResponse::from(post))))
}

/// Update an owned post
#[utoipa::path(
    patch,
    path = "/api/v1/posts/{id}",
    params(("id" = i64, Path, description = "Post ID")),
    request_body = UpdatePostRequest,
    responses(
        (status = 200, description = "Post updated", body = PostResponse),
        (status = 403, description = "Not the post owner", body = ErrorResponse),
        (status = 404, description = "Post not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Posts"
)]
pub async fn update(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<i64>,
    ValidatedJson(req): ValidatedJson<UpdatePostRequest>,
) -> Result<impl IntoResponse, AppError> {
    authorize_owner(&state, &user, id).await?;

    let post = state
        .db
        .update_post(
            id,
            req.title.as_deref(),
            req.text.as_deref(),
            req.image_url.as_deref(),
        )
        .await?;
    Ok(Json(PostResponse::from(post)))
}

/// Soft delete an owned post
#[utoipa::path(
    delete,
    path = "/api/v1/posts/{id}",
    params(("id" = i64, Path, description = "Post ID")),
    responses(
        (status = 200, description = "Post deleted", body = MessageResponse),
        (status = 403, description = "Not the post owner", body = ErrorResponse),
        (status = 404, description = "Post not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Posts"
)]
pub async fn delete(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    authorize_owner(&state, &user, id).await?;

    state.db.soft_delete_post(id).await?;
    Ok(Json(MessageResponse::new("Post deleted")))
}

/// Owner or superuser may touch a post; everyone else gets 403.
async fn authorize_owner(state: &AppState, user: &User, post_id: i64) -> Result<(), AppError> {
    let post = state
        .db
        .find_post(post_id)
        .await?
        .ok_or(AppError::NotFound("Post not found".to_string()))?;

    if post.user_id != user.id && !user.is_superuser {
        return Err(AppError::Forbidden(
            "You can only modify your own posts".to_string(),
        ));
    }
    Ok(())
}
