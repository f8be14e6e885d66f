use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::models::Branch;

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateBranchRequest {
    #[validate(length(min = 1, max = 255, message = "Name is required"))]
    #[schema(example = "Central")]
    pub name: String,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct FeedbackRequest {
    pub branch_id: i64,

    #[validate(range(min = 1, max = 5, message = "Rating must be between 1 and 5"))]
    #[schema(example = 5, minimum = 1, maximum = 5)]
    pub rating: i32,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct BranchResponse {
    pub id: i64,
    pub name: String,
    pub rating_1_count: i32,
    pub rating_2_count: i32,
    pub rating_3_count: i32,
    pub rating_4_count: i32,
    pub rating_5_count: i32,
    #[schema(example = 4.5)]
    pub rating: f64,
}

impl From<Branch> for BranchResponse {
    fn from(b: Branch) -> Self {
        let rating = b.rating();
        Self {
            id: b.id,
            name: b.name,
            rating_1_count: b.rating_1_count,
            rating_2_count: b.rating_2_count,
            rating_3_count: b.rating_3_count,
            rating_4_count: b.rating_4_count,
            rating_5_count: b.rating_5_count,
            rating,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct BranchListResponse {
    pub data: Vec<BranchResponse>,
    pub total: i64,
}
