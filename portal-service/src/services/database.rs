//! Postgres access layer.
//!
//! All queries live here so handlers stay thin. Soft-deletable
//! entities (users, posts) are filtered with `is_deleted = FALSE` in
//! every read; directory entities delete hard.

use std::time::Duration;

use chrono::{DateTime, Utc};
use sqlx::postgres::{PgPool, PgPoolOptions};

use crate::config::DatabaseConfig;
use crate::error::AppError;
use crate::models::{
    BlacklistedToken, Branch, Department, DepartmentWithCount, Person, PersonExportRow,
    PersonWithDepartment, Post, RateLimitRule, Role, Tier, User,
};

const USER_COLUMNS: &str = "id, name, email, phone_number, hashed_password, image_url, \
     is_active, is_verified, is_superuser, tier_id, created_at, updated_at, deleted_at, is_deleted";

const POST_COLUMNS: &str =
    "id, user_id, title, text, image_url, created_at, updated_at, deleted_at, is_deleted";

#[derive(Clone)]
pub struct Database {
    pool: PgPool,
}

impl Database {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Open a connection pool against the configured Postgres instance.
    pub async fn connect(config: &DatabaseConfig) -> Result<Self, AppError> {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .acquire_timeout(Duration::from_secs(30))
            .idle_timeout(Duration::from_secs(600))
            .max_lifetime(Duration::from_secs(1800))
            .connect(&config.url)
            .await?;

        tracing::info!("Connected to PostgreSQL");
        Ok(Self::new(pool))
    }

    pub async fn migrate(&self) -> Result<(), AppError> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        tracing::info!("Database migrations applied");
        Ok(())
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    pub async fn health_check(&self) -> Result<(), AppError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    // Users

    pub async fn find_user_by_id(&self, id: i64) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {} FROM users WHERE id = $1 AND is_deleted = FALSE",
            USER_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    pub async fn find_user_by_phone(&self, phone_number: &str) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {} FROM users WHERE phone_number = $1 AND is_deleted = FALSE",
            USER_COLUMNS
        ))
        .bind(phone_number)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    /// Create an unverified account. A prior unverified registration
    /// for the same phone is replaced; a verified one trips the unique
    /// constraint and surfaces as a conflict.
    pub async fn register_user(
        &self,
        name: &str,
        email: Option<&str>,
        phone_number: &str,
        hashed_password: &str,
    ) -> Result<User, AppError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM users WHERE phone_number = $1 AND is_verified = FALSE")
            .bind(phone_number)
            .execute(&mut *tx)
            .await?;

        let user = sqlx::query_as::<_, User>(&format!(
            "INSERT INTO users (name, email, phone_number, hashed_password) \
             VALUES ($1, $2, $3, $4) RETURNING {}",
            USER_COLUMNS
        ))
        .bind(name)
        .bind(email)
        .bind(phone_number)
        .bind(hashed_password)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(user)
    }

    /// Flip the account verified and active after a successful code check.
    pub async fn activate_user(&self, phone_number: &str) -> Result<User, AppError> {
        let user = sqlx::query_as::<_, User>(&format!(
            "UPDATE users SET is_active = TRUE, is_verified = TRUE, updated_at = NOW() \
             WHERE phone_number = $1 AND is_deleted = FALSE RETURNING {}",
            USER_COLUMNS
        ))
        .bind(phone_number)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(AppError::NotFound("User not found".to_string()))?;
        Ok(user)
    }

    pub async fn list_users(&self, limit: i64, offset: i64) -> Result<Vec<User>, AppError> {
        let users = sqlx::query_as::<_, User>(&format!(
            "SELECT {} FROM users WHERE is_deleted = FALSE \
             ORDER BY created_at DESC LIMIT $1 OFFSET $2",
            USER_COLUMNS
        ))
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;
        Ok(users)
    }

    pub async fn count_users(&self) -> Result<i64, AppError> {
        let (count,): (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM users WHERE is_deleted = FALSE")
                .fetch_one(&self.pool)
                .await?;
        Ok(count)
    }

    /// Soft delete an account: the phone number is replaced with a
    /// tombstone so no PII remains, and the status flags are cleared.
    pub async fn soft_delete_user(&self, id: i64) -> Result<(), AppError> {
        let result = sqlx::query(
            "UPDATE users SET is_deleted = TRUE, is_active = FALSE, is_verified = FALSE, \
             phone_number = 'del:' || id::TEXT, deleted_at = NOW() \
             WHERE id = $1 AND is_deleted = FALSE",
        )
        .bind(id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("User not found".to_string()));
        }
        Ok(())
    }

    pub async fn update_user_tier(&self, user_id: i64, tier_id: i64) -> Result<User, AppError> {
        let user = sqlx::query_as::<_, User>(&format!(
            "UPDATE users SET tier_id = $2, updated_at = NOW() \
             WHERE id = $1 AND is_deleted = FALSE RETURNING {}",
            USER_COLUMNS
        ))
        .bind(user_id)
        .bind(tier_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(AppError::NotFound("User not found".to_string()))?;
        Ok(user)
    }

    // Posts

    pub async fn insert_post(
        &self,
        user_id: i64,
        title: &str,
        text: &str,
        image_url: Option<&str>,
    ) -> Result<Post, AppError> {
        let post = sqlx::query_as::<_, Post>(&format!(
            "INSERT INTO posts (user_id, title, text, image_url) \
             VALUES ($1, $2, $3, $4) RETURNING {}",
            POST_COLUMNS
        ))
        .bind(user_id)
        .bind(title)
        .bind(text)
        .bind(image_url)
        .fetch_one(&self.pool)
        .await?;
        Ok(post)
    }

    pub async fn find_post(&self, id: i64) -> Result<Option<Post>, AppError> {
        let post = sqlx::query_as::<_, Post>(&format!(
            "SELECT {} FROM posts WHERE id = $1 AND is_deleted = FALSE",
            POST_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(post)
    }

    /// Posts belonging to one user. The unscoped variant below is for
    /// the admin surface only.
    pub async fn list_posts_for_user(
        &self,
        user_id: i64,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Post>, AppError> {
        let posts = sqlx::query_as::<_, Post>(&format!(
            "SELECT {} FROM posts WHERE user_id = $1 AND is_deleted = FALSE \
             ORDER BY created_at DESC LIMIT $2 OFFSET $3",
            POST_COLUMNS
        ))
        .bind(user_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;
        Ok(posts)
    }

    pub async fn count_posts_for_user(&self, user_id: i64) -> Result<i64, AppError> {
        let (count,): (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM posts WHERE user_id = $1 AND is_deleted = FALSE",
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(count)
    }

    pub async fn list_posts(&self, limit: i64, offset: i64) -> Result<Vec<Post>, AppError> {
        let posts = sqlx::query_as::<_, Post>(&format!(
            "SELECT {} FROM posts WHERE is_deleted = FALSE \
             ORDER BY created_at DESC LIMIT $1 OFFSET $2",
            POST_COLUMNS
        ))
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;
        Ok(posts)
    }

    pub async fn count_posts(&self) -> Result<i64, AppError> {
        let (count,): (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM posts WHERE is_deleted = FALSE")
                .fetch_one(&self.pool)
                .await?;
        Ok(count)
    }

    pub async fn update_post(
        &self,
        id: i64,
        title: Option<&str>,
        text: Option<&str>,
        image_url: Option<&str>,
    ) -> Result<Post, AppError> {
        let post = sqlx::query_as::<_, Post>(&format!(
            "UPDATE posts SET title = COALESCE($2, title), text = COALESCE($3, text), \
             image_url = COALESCE($4, image_url), updated_at = NOW() \
             WHERE id = $1 AND is_deleted = FALSE RETURNING {}",
            POST_COLUMNS
        ))
        .bind(id)
        .bind(title)
        .bind(text)
        .bind(image_url)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(AppError::NotFound("Post not found".to_string()))?;
        Ok(post)
    }

    pub async fn soft_delete_post(&self, id: i64) -> Result<(), AppError> {
        let result = sqlx::query(
            "UPDATE posts SET is_deleted = TRUE, deleted_at = NOW() \
             WHERE id = $1 AND is_deleted = FALSE",
        )
        .bind(id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Post not found".to_string()));
        }
        Ok(())
    }

    // Roles

    pub async fn insert_role(&self, name: &str) -> Result<Role, AppError> {
        let role = sqlx::query_as::<_, Role>(
            "INSERT INTO roles (name) VALUES ($1) \
             RETURNING id, name, created_at, updated_at",
        )
        .bind(name)
        .fetch_one(&self.pool)
        .await?;
        Ok(role)
    }

    pub async fn find_role(&self, id: i64) -> Result<Option<Role>, AppError> {
        let role = sqlx::query_as::<_, Role>(
            "SELECT id, name, created_at, updated_at FROM roles WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(role)
    }

    pub async fn list_roles(&self) -> Result<Vec<Role>, AppError> {
        let roles = sqlx::query_as::<_, Role>(
            "SELECT id, name, created_at, updated_at FROM roles ORDER BY id",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(roles)
    }

    // Departments

    pub async fn insert_department(
        &self,
        name: &str,
        role_id: i64,
    ) -> Result<Department, AppError> {
        let department = sqlx::query_as::<_, Department>(
            "INSERT INTO departments (name, role_id) VALUES ($1, $2) \
             RETURNING id, name, role_id, created_at, updated_at",
        )
        .bind(name)
        .bind(role_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(department)
    }

    pub async fn find_department(&self, id: i64) -> Result<Option<Department>, AppError> {
        let department = sqlx::query_as::<_, Department>(
            "SELECT id, name, role_id, created_at, updated_at FROM departments WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(department)
    }

    pub async fn list_departments_with_counts(
        &self,
        role_id: Option<i64>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<DepartmentWithCount>, AppError> {
        let departments = sqlx::query_as::<_, DepartmentWithCount>(
            "SELECT d.id, d.name, d.role_id, COUNT(p.id) AS person_count \
             FROM departments d \
             LEFT JOIN persons p ON p.department_id = d.id \
             WHERE ($1::BIGINT IS NULL OR d.role_id = $1) \
             GROUP BY d.id, d.name, d.role_id \
             ORDER BY d.id LIMIT $2 OFFSET $3",
        )
        .bind(role_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;
        Ok(departments)
    }

    pub async fn count_departments(&self, role_id: Option<i64>) -> Result<i64, AppError> {
        let (count,): (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM departments WHERE ($1::BIGINT IS NULL OR role_id = $1)",
        )
        .bind(role_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(count)
    }

    pub async fn update_department(
        &self,
        id: i64,
        name: Option<&str>,
        role_id: Option<i64>,
    ) -> Result<Department, AppError> {
        let department = sqlx::query_as::<_, Department>(
            "UPDATE departments SET name = COALESCE($2, name), \
             role_id = COALESCE($3, role_id), updated_at = NOW() WHERE id = $1 \
             RETURNING id, name, role_id, created_at, updated_at",
        )
        .bind(id)
        .bind(name)
        .bind(role_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(AppError::NotFound("Department not found".to_string()))?;
        Ok(department)
    }

    pub async fn delete_department(&self, id: i64) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM departments WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Department not found".to_string()));
        }
        Ok(())
    }

    // Persons

    pub async fn insert_person(
        &self,
        first_name: &str,
        last_name: &str,
        image_url: &str,
        department_id: i64,
    ) -> Result<Person, AppError> {
        let person = sqlx::query_as::<_, Person>(
            "INSERT INTO persons (first_name, last_name, image_url, department_id) \
             VALUES ($1, $2, $3, $4) \
             RETURNING id, first_name, last_name, image_url, department_id, created_at, updated_at",
        )
        .bind(first_name)
        .bind(last_name)
        .bind(image_url)
        .bind(department_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(person)
    }

    pub async fn find_person_with_department(
        &self,
        id: i64,
    ) -> Result<Option<PersonWithDepartment>, AppError> {
        let person = sqlx::query_as::<_, PersonWithDepartment>(
            "SELECT p.id, p.first_name, p.last_name, p.image_url, p.department_id, \
             d.name AS department_name \
             FROM persons p JOIN departments d ON d.id = p.department_id \
             WHERE p.id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(person)
    }

    pub async fn list_persons(
        &self,
        department_id: Option<i64>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<PersonWithDepartment>, AppError> {
        let persons = sqlx::query_as::<_, PersonWithDepartment>(
            "SELECT p.id, p.first_name, p.last_name, p.image_url, p.department_id, \
             d.name AS department_name \
             FROM persons p JOIN departments d ON d.id = p.department_id \
             WHERE ($1::BIGINT IS NULL OR p.department_id = $1) \
             ORDER BY p.id LIMIT $2 OFFSET $3",
        )
        .bind(department_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;
        Ok(persons)
    }

    pub async fn count_persons(&self, department_id: Option<i64>) -> Result<i64, AppError> {
        let (count,): (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM persons WHERE ($1::BIGINT IS NULL OR department_id = $1)",
        )
        .bind(department_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(count)
    }

    pub async fn update_person(
        &self,
        id: i64,
        first_name: Option<&str>,
        last_name: Option<&str>,
        department_id: Option<i64>,
    ) -> Result<Person, AppError> {
        let person = sqlx::query_as::<_, Person>(
            "UPDATE persons SET first_name = COALESCE($2, first_name), \
             last_name = COALESCE($3, last_name), \
             department_id = COALESCE($4, department_id), updated_at = NOW() \
             WHERE id = $1 \
             RETURNING id, first_name, last_name, image_url, department_id, created_at, updated_at",
        )
        .bind(id)
        .bind(first_name)
        .bind(last_name)
        .bind(department_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(AppError::NotFound("Person not found".to_string()))?;
        Ok(person)
    }

    /// Remove a person, returning the deleted row so the caller can
    /// clean up the stored photo.
    pub async fn delete_person(&self, id: i64) -> Result<Person, AppError> {
        let person = sqlx::query_as::<_, Person>(
            "DELETE FROM persons WHERE id = $1 \
             RETURNING id, first_name, last_name, image_url, department_id, created_at, updated_at",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(AppError::NotFound("Person not found".to_string()))?;
        Ok(person)
    }

    pub async fn person_export_rows(&self) -> Result<Vec<PersonExportRow>, AppError> {
        let rows = sqlx::query_as::<_, PersonExportRow>(
            "SELECT p.id, p.first_name, p.last_name, p.image_url, \
             d.name AS department_name, p.created_at \
             FROM persons p JOIN departments d ON d.id = p.department_id \
             ORDER BY p.id",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    // Branches

    pub async fn insert_branch(&self, name: &str) -> Result<Branch, AppError> {
        let branch = sqlx::query_as::<_, Branch>(
            "INSERT INTO branches (name) VALUES ($1) \
             RETURNING id, name, rating_1_count, rating_2_count, rating_3_count, \
             rating_4_count, rating_5_count, created_at, updated_at",
        )
        .bind(name)
        .fetch_one(&self.pool)
        .await?;
        Ok(branch)
    }

    pub async fn delete_branch(&self, id: i64) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM branches WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Branch not found".to_string()));
        }
        Ok(())
    }

    pub async fn list_branches(&self) -> Result<Vec<Branch>, AppError> {
        let branches = sqlx::query_as::<_, Branch>(
            "SELECT id, name, rating_1_count, rating_2_count, rating_3_count, \
             rating_4_count, rating_5_count, created_at, updated_at \
             FROM branches ORDER BY id",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(branches)
    }

    /// Increment the counter for one star value atomically.
    pub async fn add_branch_feedback(
        &self,
        branch_id: i64,
        rating: u8,
    ) -> Result<Branch, AppError> {
        // Column picked from a fixed set, never interpolated from input
        let column = match rating {
            1 => "rating_1_count",
            2 => "rating_2_count",
            3 => "rating_3_count",
            4 => "rating_4_count",
            5 => "rating_5_count",
            _ => {
                return Err(AppError::BadRequest(
                    "Rating must be between 1 and 5".to_string(),
                ))
            }
        };

        let branch = sqlx::query_as::<_, Branch>(&format!(
            "UPDATE branches SET {col} = {col} + 1, updated_at = NOW() WHERE id = $1 \
             RETURNING id, name, rating_1_count, rating_2_count, rating_3_count, \
             rating_4_count, rating_5_count, created_at, updated_at",
            col = column
        ))
        .bind(branch_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(AppError::NotFound("Branch not found".to_string()))?;
        Ok(branch)
    }

    // Tiers

    pub async fn insert_tier(&self, name: &str) -> Result<Tier, AppError> {
        let tier = sqlx::query_as::<_, Tier>(
            "INSERT INTO tiers (name) VALUES ($1) \
             RETURNING id, name, created_at, updated_at",
        )
        .bind(name)
        .fetch_one(&self.pool)
        .await?;
        Ok(tier)
    }

    pub async fn find_tier(&self, id: i64) -> Result<Option<Tier>, AppError> {
        let tier = sqlx::query_as::<_, Tier>(
            "SELECT id, name, created_at, updated_at FROM tiers WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(tier)
    }

    pub async fn find_tier_by_name(&self, name: &str) -> Result<Option<Tier>, AppError> {
        let tier = sqlx::query_as::<_, Tier>(
            "SELECT id, name, created_at, updated_at FROM tiers WHERE name = $1",
        )
        .bind(name)
        .fetch_optional(&self.pool)
        .await?;
        Ok(tier)
    }

    pub async fn list_tiers(&self) -> Result<Vec<Tier>, AppError> {
        let tiers = sqlx::query_as::<_, Tier>(
            "SELECT id, name, created_at, updated_at FROM tiers ORDER BY id",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(tiers)
    }

    pub async fn update_tier(&self, id: i64, name: &str) -> Result<Tier, AppError> {
        let tier = sqlx::query_as::<_, Tier>(
            "UPDATE tiers SET name = $2, updated_at = NOW() WHERE id = $1 \
             RETURNING id, name, created_at, updated_at",
        )
        .bind(id)
        .bind(name)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(AppError::NotFound("Tier not found".to_string()))?;
        Ok(tier)
    }

    pub async fn delete_tier(&self, id: i64) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM tiers WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Tier not found".to_string()));
        }
        Ok(())
    }

    // Rate-limit rules

    pub async fn insert_rate_limit(
        &self,
        tier_id: i64,
        name: &str,
        path: &str,
        limit: i64,
        period: i64,
    ) -> Result<RateLimitRule, AppError> {
        let rule = sqlx::query_as::<_, RateLimitRule>(
            "INSERT INTO rate_limits (tier_id, name, path, \"limit\", period) \
             VALUES ($1, $2, $3, $4, $5) \
             RETURNING id, name, path, \"limit\", period, tier_id, created_at, updated_at",
        )
        .bind(tier_id)
        .bind(name)
        .bind(path)
        .bind(limit)
        .bind(period)
        .fetch_one(&self.pool)
        .await?;
        Ok(rule)
    }

    pub async fn list_rate_limits(
        &self,
        tier_id: Option<i64>,
    ) -> Result<Vec<RateLimitRule>, AppError> {
        let rules = sqlx::query_as::<_, RateLimitRule>(
            "SELECT id, name, path, \"limit\", period, tier_id, created_at, updated_at \
             FROM rate_limits WHERE ($1::BIGINT IS NULL OR tier_id = $1) ORDER BY id",
        )
        .bind(tier_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rules)
    }

    pub async fn update_rate_limit(
        &self,
        id: i64,
        name: &str,
        path: Option<&str>,
        limit: Option<i64>,
        period: Option<i64>,
    ) -> Result<RateLimitRule, AppError> {
        let rule = sqlx::query_as::<_, RateLimitRule>(
            "UPDATE rate_limits SET name = $2, path = COALESCE($3, path), \
             \"limit\" = COALESCE($4, \"limit\"), period = COALESCE($5, period), \
             updated_at = NOW() WHERE id = $1 \
             RETURNING id, name, path, \"limit\", period, tier_id, created_at, updated_at",
        )
        .bind(id)
        .bind(name)
        .bind(path)
        .bind(limit)
        .bind(period)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(AppError::NotFound("Rate limit rule not found".to_string()))?;
        Ok(rule)
    }

    pub async fn delete_rate_limit(&self, id: i64) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM rate_limits WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Rate limit rule not found".to_string()));
        }
        Ok(())
    }

    /// Rule lookup for the limiter, keyed by tier and normalized path.
    pub async fn find_rate_limit_rule(
        &self,
        tier_id: i64,
        path: &str,
    ) -> Result<Option<RateLimitRule>, AppError> {
        let rule = sqlx::query_as::<_, RateLimitRule>(
            "SELECT id, name, path, \"limit\", period, tier_id, created_at, updated_at \
             FROM rate_limits WHERE tier_id = $1 AND path = $2",
        )
        .bind(tier_id)
        .bind(path)
        .fetch_optional(&self.pool)
        .await?;
        Ok(rule)
    }

    // Token revocation ledger

    /// Record an issued refresh token so it can later be revoked.
    /// Re-recording the same jti is a no-op.
    pub async fn record_refresh_token(
        &self,
        jti: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<(), AppError> {
        sqlx::query(
            "INSERT INTO token_blacklist (jti, expires_at) VALUES ($1, $2) \
             ON CONFLICT (jti) DO NOTHING",
        )
        .bind(jti)
        .bind(expires_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Mark a token revoked. Idempotent; unknown jtis are inserted
    /// already revoked so logout cannot miss.
    pub async fn blacklist_token(
        &self,
        jti: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<(), AppError> {
        sqlx::query(
            "INSERT INTO token_blacklist (jti, expires_at, is_blacklisted) \
             VALUES ($1, $2, TRUE) \
             ON CONFLICT (jti) DO UPDATE SET is_blacklisted = TRUE",
        )
        .bind(jti)
        .bind(expires_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn is_token_blacklisted(&self, jti: &str) -> Result<bool, AppError> {
        let entry = sqlx::query_as::<_, BlacklistedToken>(
            "SELECT id, jti, expires_at, is_blacklisted, created_at \
             FROM token_blacklist WHERE jti = $1",
        )
        .bind(jti)
        .fetch_optional(&self.pool)
        .await?;
        Ok(entry.map(|e| e.is_blacklisted).unwrap_or(false))
    }

    /// Drop ledger rows whose tokens have expired anyway.
    pub async fn purge_expired_tokens(&self) -> Result<u64, AppError> {
        let result = sqlx::query("DELETE FROM token_blacklist WHERE expires_at < NOW()")
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}
