//! Response DTOs.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::db::{Room, StoredMessage};

/// Success wrapper: `{"data": ...}`.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub data: T,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn new(data: T) -> Self {
        Self { data }
    }
}

/// A chat room.
#[derive(Debug, Serialize)]
pub struct RoomResponse {
    pub id: i64,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

impl From<Room> for RoomResponse {
    fn from(room: Room) -> Self {
        Self {
            id: room.id,
            name: room.name,
            created_at: room.created_at,
        }
    }
}

/// A chat message, in the same shape live clients receive.
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub id: i64,
    pub text: String,
    pub username: String,
    pub created_at: DateTime<Utc>,
    pub room_id: i64,
}

impl From<StoredMessage> for MessageResponse {
    fn from(m: StoredMessage) -> Self {
        Self {
            id: m.id,
            text: m.text,
            username: m.username,
            created_at: m.created_at,
            room_id: m.room_id,
        }
    }
}

/// GET /health body.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    /// Subscribers currently registered with the hub.
    pub subscribers: usize,
}
