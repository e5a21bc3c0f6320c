//! Chat rooms.

use chrono::{DateTime, Utc};

use super::DbPool;
use crate::{ChatError, Result};

/// A chat room.
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct Room {
    /// Room ID.
    pub id: i64,
    /// Display name.
    pub name: String,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

/// Repository for room operations.
pub struct RoomRepository<'a> {
    pool: &'a DbPool,
}

impl<'a> RoomRepository<'a> {
    /// Create a new RoomRepository.
    pub fn new(pool: &'a DbPool) -> Self {
        Self { pool }
    }

    /// Create a room.
    pub async fn create(&self, name: &str) -> Result<Room> {
        let result = sqlx::query("INSERT INTO rooms (name, created_at) VALUES (?, ?)")
            .bind(name)
            .bind(Utc::now())
            .execute(self.pool)
            .await?;

        self.get_by_id(result.last_insert_rowid())
            .await?
            .ok_or_else(|| ChatError::NotFound("room".to_string()))
    }

    /// Get a room by ID.
    pub async fn get_by_id(&self, id: i64) -> Result<Option<Room>> {
        let room = sqlx::query_as::<_, Room>("SELECT id, name, created_at FROM rooms WHERE id = ?")
            .bind(id)
            .fetch_optional(self.pool)
            .await?;
        Ok(room)
    }

    /// List all rooms ordered by ID.
    pub async fn list(&self) -> Result<Vec<Room>> {
        let rooms = sqlx::query_as::<_, Room>("SELECT id, name, created_at FROM rooms ORDER BY id")
            .fetch_all(self.pool)
            .await?;
        Ok(rooms)
    }

    /// Delete a room and, through the cascade, its messages.
    ///
    /// Returns true if a room was deleted.
    pub async fn delete(&self, id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM rooms WHERE id = ?")
            .bind(id)
            .execute(self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
