//! The message value fanned out by the hub.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::db::StoredMessage;

/// A chat message as delivered to subscribers.
///
/// Each subscriber receives its own copy. Serialized to live clients as
/// `{id, text, username, created_at, room_id}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BroadcastMessage {
    /// Message ID assigned by the store.
    pub id: i64,
    /// Message body.
    pub text: String,
    /// Author's display name.
    pub username: String,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Room the message belongs to.
    pub room_id: i64,
}

impl From<StoredMessage> for BroadcastMessage {
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_shape() {
        let msg = BroadcastMessage {
            id: 3,
            text: "hi".to_string(),
            username: "alice".to_string(),
            created_at: Utc::now(),
            room_id: 5,
        };

        let value = serde_json::to_value(&msg).unwrap();
        let object = value.as_object().unwrap();
        let mut keys: Vec<&str> = object.keys().map(String::as_str).collect();
        keys.sort_unstable();
        assert_eq!(keys, vec!["created_at", "id", "room_id", "text", "username"]);
        assert_eq!(value["room_id"], 5);
        assert_eq!(value["text"], "hi");
    }

    #[test]
    fn test_from_stored_message() {
        let now = Utc::now();
        let stored = StoredMessage {
            id: 1,
            room_id: 2,
            user_id: 3,
            username: "Bot".to_string(),
            text: "AAPL quote is $1 per share".to_string(),
            created_at: now,
        };

        let msg = BroadcastMessage::from(stored);
        assert_eq!(msg.id, 1);
        assert_eq!(msg.room_id, 2);
        assert_eq!(msg.username, "Bot");
        assert_eq!(msg.created_at, now);
    }
}
