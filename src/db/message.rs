//! Chat message storage.

use chrono::{DateTime, Utc};

use super::DbPool;
use crate::{ChatError, Result};

/// Default number of messages returned by [`MessageRepository::list_recent`].
pub const DEFAULT_RECENT_MESSAGE_COUNT: i64 = 50;

const SELECT_MESSAGE: &str = "SELECT m.id, m.room_id, m.user_id, u.username, m.text, m.created_at
     FROM messages m JOIN users u ON u.id = m.user_id";

/// A persisted message joined with its author's username.
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct StoredMessage {
    /// Message ID.
    pub id: i64,
    /// Room the message was posted in.
    pub room_id: i64,
    /// Author's user ID.
    pub user_id: i64,
    /// Author's username at read time.
    pub username: String,
    /// Message body.
    pub text: String,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

/// Repository for chat messages.
pub struct MessageRepository<'a> {
    pool: &'a DbPool,
}

impl<'a> MessageRepository<'a> {
    /// Create a new MessageRepository.
    pub fn new(pool: &'a DbPool) -> Self {
        Self { pool }
    }

    /// Store a message and return it with its assigned ID and timestamp.
    ///
    /// Fails if the room or the author does not exist.
    pub async fn create(&self, room_id: i64, user_id: i64, text: &str) -> Result<StoredMessage> {
        let result = sqlx::query(
            "INSERT INTO messages (room_id, user_id, text, created_at) VALUES (?, ?, ?, ?)",
        )
        .bind(room_id)
        .bind(user_id)
        .bind(text)
        .bind(Utc::now())
        .execute(self.pool)
        .await?;

        self.get_by_id(result.last_insert_rowid())
            .await?
            .ok_or_else(|| ChatError::NotFound("message".to_string()))
    }

    /// Get a message by ID.
    pub async fn get_by_id(&self, id: i64) -> Result<Option<StoredMessage>> {
        let sql = format!("{SELECT_MESSAGE} WHERE m.id = ?");
        let message = sqlx::query_as::<_, StoredMessage>(&sql)
            .bind(id)
            .fetch_optional(self.pool)
            .await?;
        Ok(message)
    }

    /// List the most recent `limit` messages of a room, oldest first.
    pub async fn list_recent(&self, room_id: i64, limit: i64) -> Result<Vec<StoredMessage>> {
        let mut messages = sqlx::query_as::<_, StoredMessage>(&format!(
            "{SELECT_MESSAGE} WHERE m.room_id = ? ORDER BY m.id DESC LIMIT ?"
        ))
        .bind(room_id)
        .bind(limit)
        .fetch_all(self.pool)
        .await?;

        messages.reverse();
        Ok(messages)
    }
}
