use chrono::{DateTime, Utc};
use sqlx::FromRow;

/// Directory department, referencing a role.
#[derive(Debug, Clone, FromRow)]
pub struct Department {
    pub id: i64,
    pub name: String,
    pub role_id: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// Department row joined with its person count.
#[derive(Debug, Clone, FromRow)]
pub struct DepartmentWithCount {
    pub id: i64,
    pub name: String,
    pub role_id: i64,
    pub person_count: i64,
}
