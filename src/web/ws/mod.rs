//! WebSocket endpoint for live clients.

mod chat;

pub use chat::{chat_ws_handler, WsQuery};
