//! Request DTOs.

use serde::Deserialize;
use validator::Validate;

use super::validation::{no_control_chars, not_blank};

/// Maximum length of a room name.
pub const MAX_ROOM_NAME_LENGTH: u64 = 64;

/// Maximum length of a chat message.
pub const MAX_MESSAGE_LENGTH: u64 = 2000;

/// POST /api/rooms body.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateRoomRequest {
    #[validate(
        length(min = 1, max = 64, message = "Room name must be 1-64 characters"),
        custom(function = "not_blank"),
        custom(function = "no_control_chars")
    )]
    pub name: String,
}

/// POST /api/rooms/{id}/messages body.
#[derive(Debug, Deserialize, Validate)]
pub struct PostMessageRequest {
    /// Author; created on first post.
    #[validate(
        length(min = 1, max = 32, message = "Username must be 1-32 characters"),
        custom(function = "not_blank"),
        custom(function = "no_control_chars")
    )]
    pub username: String,
    #[validate(
        length(min = 1, max = 2000, message = "Message must be 1-2000 characters"),
        custom(function = "not_blank"),
        custom(function = "no_control_chars")
    )]
    pub text: String,
}

/// Query for GET /api/rooms/{id}/messages.
#[derive(Debug, Default, Deserialize)]
pub struct RecentMessagesQuery {
    /// Number of messages to return, newest last.
    pub limit: Option<i64>,
}
