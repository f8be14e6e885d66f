use chrono::{DateTime, Utc};
use sqlx::FromRow;

/// Rate-limit rule binding (tier, normalized path) to (limit, period).
#[derive(Debug, Clone, FromRow)]
pub struct RateLimitRule {
    pub id: i64,
    pub name: String,
    pub path: String,
    pub limit: i64,
    pub period: i64,
    pub tier_id: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl RateLimitRule {
    /// Rule names are derived deterministically from path, limit and
    /// period, and must be unique.
    pub fn derive_name(path: &str, limit: i64, period: i64) -> String {
        format!("{}:{}:{}", path, limit, period)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_derive_name() {
        assert_eq!(
            RateLimitRule::derive_name("api_v1_posts", 20, 60),
            "api_v1_posts:20:60"
        );
    }
}
