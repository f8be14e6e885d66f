use chrono::{DateTime, Utc};
use sqlx::FromRow;

/// Directory role, referenced by departments.
#[derive(Debug, Clone, FromRow)]
pub struct Role {
    pub id: i64,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}
