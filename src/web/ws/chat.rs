//! Chat WebSocket handler.
//!
//! Each connection becomes a [`LiveClientHandler`] registered with the hub.
//! The server only pushes; frames sent by the client are read and discarded
//! so that a close or a broken connection is noticed.

use std::sync::Arc;

use axum::{
    extract::{
        ws::{Message, WebSocket},
        Query, State, WebSocketUpgrade,
    },
    response::Response,
};
use futures::StreamExt;
use serde::Deserialize;

use crate::hub::{LiveClientHandler, Subscriber};
use crate::web::handlers::AppState;

/// Query parameters for the WebSocket connection.
#[derive(Debug, Default, Deserialize)]
pub struct WsQuery {
    /// Only receive messages for this room.
    pub room_id: Option<i64>,
}

/// GET /ws?room_id={id}
pub async fn chat_ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
    Query(query): Query<WsQuery>,
) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, state, query.room_id))
}

async fn handle_socket(socket: WebSocket, state: Arc<AppState>, room_filter: Option<i64>) {
    let (sender, mut receiver) = socket.split();
    let client = Arc::new(LiveClientHandler::new(sender, room_filter));
    let client_id = client.id().to_string();

    tracing::info!(client = %client_id, ?room_filter, "Live client connected");
    state.hub.add_subscriber(client);

    while let Some(frame) = receiver.next().await {
        match frame {
            Ok(Message::Close(_)) => break,
            Ok(_) => {}
            Err(e) => {
                tracing::debug!(client = %client_id, error = %e, "WebSocket read failed");
                break;
            }
        }
    }

    state.hub.remove_subscriber(&client_id);
    tracing::info!(client = %client_id, "Live client disconnected");
}
