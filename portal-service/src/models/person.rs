use chrono::{DateTime, Utc};
use sqlx::FromRow;

/// Directory person with a stored photo, referencing a department.
#[derive(Debug, Clone, FromRow)]
pub struct Person {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
    pub image_url: String,
    pub department_id: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// Person joined with its department name.
#[derive(Debug, Clone, FromRow)]
pub struct PersonWithDepartment {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
    pub image_url: String,
    pub department_id: i64,
    pub department_name: String,
}

/// Row shape consumed by the spreadsheet export job.
#[derive(Debug, Clone, FromRow, serde::Serialize, serde::Deserialize)]
pub struct PersonExportRow {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
    pub image_url: String,
    pub department_name: String,
    pub created_at: DateTime<Utc>,
}
