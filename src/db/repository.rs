//! User repository for finchat.

use chrono::Utc;
use tracing::info;

use super::user::User;
use super::DbPool;
use crate::{ChatError, Result};

/// Repository for user operations.
pub struct UserRepository<'a> {
    pool: &'a DbPool,
}

impl<'a> UserRepository<'a> {
    /// Create a new UserRepository with the given database pool reference.
    pub fn new(pool: &'a DbPool) -> Self {
        Self { pool }
    }

    /// Create a new user.
    ///
    /// Fails with a database error if the username is taken.
    pub async fn create(&self, username: &str, email: Option<&str>) -> Result<User> {
        let result = sqlx::query("INSERT INTO users (username, email, created_at) VALUES (?, ?, ?)")
            .bind(username)
            .bind(email)
            .bind(Utc::now())
            .execute(self.pool)
            .await?;

        self.get_by_id(result.last_insert_rowid())
            .await?
            .ok_or_else(|| ChatError::NotFound("user".to_string()))
    }

    /// Get a user by ID.
    pub async fn get_by_id(&self, id: i64) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            "SELECT id, username, email, created_at FROM users WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await?;
        Ok(user)
    }

    /// Get a user by username (case-insensitive).
    pub async fn get_by_username(&self, username: &str) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            "SELECT id, username, email, created_at FROM users WHERE username = ? COLLATE NOCASE",
        )
        .bind(username)
        .fetch_optional(self.pool)
        .await?;
        Ok(user)
    }

    /// Return the user with this username, creating it first if needed.
    ///
    /// Safe to call concurrently for the same name: the insert is a no-op
    /// when another caller created the row first.
    pub async fn find_or_create(&self, username: &str, email: Option<&str>) -> Result<User> {
        if let Some(user) = self.get_by_username(username).await? {
            return Ok(user);
        }

        let result = sqlx::query(
            "INSERT INTO users (username, email, created_at) VALUES (?, ?, ?)
             ON CONFLICT(username) DO NOTHING",
        )
        .bind(username)
        .bind(email)
        .bind(Utc::now())
        .execute(self.pool)
        .await?;

        if result.rows_affected() > 0 {
            info!(username, "Created user");
        }

        self.get_by_username(username)
            .await?
            .ok_or_else(|| ChatError::NotFound("user".to_string()))
    }

    /// Count all users.
    pub async fn count(&self) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
            .fetch_one(self.pool)
            .await?;
        Ok(count)
    }
}
