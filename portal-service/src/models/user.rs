//! User model - phone-verified accounts.

use chrono::{DateTime, Utc};
use sqlx::FromRow;

/// User entity.
///
/// Lifecycle: created unverified on registration, activated on SMS
/// verification, soft-deleted (phone anonymized, flags cleared) on
/// account deletion.
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: i64,
    pub name: String,
    pub email: Option<String>,
    pub phone_number: String,
    pub hashed_password: String,
    pub image_url: Option<String>,
    pub is_active: bool,
    pub is_verified: bool,
    pub is_superuser: bool,
    pub tier_id: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
    pub deleted_at: Option<DateTime<Utc>>,
    pub is_deleted: bool,
}

impl User {
    /// Whether the account may authenticate.
    pub fn can_login(&self) -> bool {
        self.is_active && self.is_verified && !self.is_deleted
    }
}
