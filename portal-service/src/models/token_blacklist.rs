use chrono::{DateTime, Utc};
use sqlx::FromRow;

/// Revocation ledger entry for an invalidated refresh token.
#[derive(Debug, Clone, FromRow)]
pub struct BlacklistedToken {
    pub id: i64,
    pub jti: String,
    pub expires_at: DateTime<Utc>,
    pub is_blacklisted: bool,
    pub created_at: DateTime<Utc>,
}
