use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::models::Post;

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreatePostRequest {
    #[validate(length(min = 2, max = 30, message = "Title must be 2-30 characters"))]
    #[schema(example = "This is my post")]
    pub title: String,

    #[validate(length(min = 1, max = 63206, message = "Text must be 1-63206 characters"))]
    #[schema(example = "This is the content of my post.")]
    pub text: String,

    #[validate(url(message = "Invalid image URL"))]
    pub image_url: Option<String>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdatePostRequest {
    #[validate(length(min = 2, max = 30, message = "Title must be 2-30 characters"))]
    pub title: Option<String>,

    #[validate(length(min = 1, max = 63206, message = "Text must be 1-63206 characters"))]
    pub text: Option<String>,

    #[validate(url(message = "Invalid image URL"))]
    pub image_url: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PostResponse {
    pub id: i64,
    pub user_id: i64,
    pub title: String,
    pub text: String,
    pub image_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<Post> for PostResponse {
    fn from(p: Post) -> Self {
        Self {
            id: p.id,
            user_id: p.user_id,
            title: p.title,
            text: p.text,
            image_url: p.image_url,
            created_at: p.created_at,
        }
    }
}
