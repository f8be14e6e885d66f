use chrono::{DateTime, Utc};
use sqlx::FromRow;

/// Named subscription/permission class governing applicable rate limits.
#[derive(Debug, Clone, FromRow)]
pub struct Tier {
    pub id: i64,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}
