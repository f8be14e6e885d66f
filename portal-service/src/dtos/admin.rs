use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::models::{RateLimitRule, Tier};

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateTierRequest {
    #[validate(length(min = 1, max = 255, message = "Name is required"))]
    #[schema(example = "premium")]
    pub name: String,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateTierRequest {
    #[validate(length(min = 1, max = 255, message = "Name is required"))]
    pub name: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct TierResponse {
    pub id: i64,
    pub name: String,
}

impl From<Tier> for TierResponse {
    fn from(t: Tier) -> Self {
        Self {
            id: t.id,
            name: t.name,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct TierListResponse {
    pub data: Vec<TierResponse>,
    pub total: i64,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct AssignTierRequest {
    pub tier_id: i64,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateRateLimitRequest {
    #[validate(length(min = 1, max = 255, message = "Path is required"))]
    #[schema(example = "api_v1_posts")]
    pub path: String,

    #[validate(range(min = 1, message = "Limit must be positive"))]
    #[schema(example = 20)]
    pub limit: i64,

    #[validate(range(min = 1, message = "Period must be positive"))]
    #[schema(example = 60)]
    pub period: i64,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateRateLimitRequest {
    #[validate(length(min = 1, max = 255, message = "Path is required"))]
    pub path: String,

    #[validate(range(min = 1, message = "Limit must be positive"))]
    pub limit: i64,

    #[validate(range(min = 1, message = "Period must be positive"))]
    pub period: i64,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct RateLimitResponse {
    pub id: i64,
    pub name: String,
    pub path: String,
    pub limit: i64,
    pub period: i64,
    pub tier_id: i64,
}

impl From<RateLimitRule> for RateLimitResponse {
    fn from(r: RateLimitRule) -> Self {
        Self {
            id: r.id,
            name: r.name,
            path: r.path,
            limit: r.limit,
            period: r.period,
            tier_id: r.tier_id,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct RateLimitListResponse {
    pub data: Vec<RateLimitResponse>,
    pub total: i64,
}
