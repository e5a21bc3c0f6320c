//! User model for finchat.

use chrono::{DateTime, Utc};

/// A chat user. The stock bot is stored as an ordinary user.
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct User {
    /// User ID.
    pub id: i64,
    /// Unique username (case-insensitive).
    pub username: String,
    /// Optional contact email.
    pub email: Option<String>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}
