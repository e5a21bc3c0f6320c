//! Live client subscriber.

use std::fmt::Display;

use async_trait::async_trait;
use axum::extract::ws::Message;
use futures::{Sink, SinkExt};
use tokio::sync::Mutex;
use uuid::Uuid;

use super::message::BroadcastMessage;
use super::subscriber::Subscriber;
use crate::{ChatError, Result};

/// Subscriber writing each broadcast as one JSON text frame to a client.
///
/// With a room filter set, messages for other rooms are skipped.
pub struct LiveClientHandler<S> {
    id: String,
    room_filter: Option<i64>,
    sink: Mutex<S>,
}

impl<S> LiveClientHandler<S> {
    /// Wrap the write half of a client connection under a fresh `ws-` ID.
    pub fn new(sink: S, room_filter: Option<i64>) -> Self {
        Self::with_id(format!("ws-{}", Uuid::new_v4()), sink, room_filter)
    }

    pub fn with_id(id: impl Into<String>, sink: S, room_filter: Option<i64>) -> Self {
        Self {
            id: id.into(),
            room_filter,
            sink: Mutex::new(sink),
        }
    }

    pub fn room_filter(&self) -> Option<i64> {
        self.room_filter
    }
}

#[async_trait]
impl<S> Subscriber for LiveClientHandler<S>
where
    S: Sink<Message> + Unpin + Send + 'static,
    S::Error: Display,
{
    fn id(&self) -> &str {
        &self.id
    }

    async fn deliver(&self, message: &BroadcastMessage) -> Result<()> {
        if self.room_filter.is_some_and(|room| room != message.room_id) {
            return Ok(());
        }

        let json = serde_json::to_string(message)?;
        let mut sink = self.sink.lock().await;
        sink.send(Message::Text(json.into()))
            .await
            .map_err(|e| ChatError::Delivery(format!("{}: {e}", self.id)))
    }
}
