//! Test doubles shared by the hub tests.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::Utc;

use super::message::BroadcastMessage;
use super::subscriber::Subscriber;
use crate::{ChatError, Result};

/// Subscriber that records what it receives and can be told to fail.
pub struct RecordingSubscriber {
    id: String,
    received: Mutex<Vec<BroadcastMessage>>,
    failing: AtomicBool,
}

impl RecordingSubscriber {
    pub fn new(id: &str) -> Arc<Self> {
        Arc::new(Self {
            id: id.to_string(),
            received: Mutex::new(Vec::new()),
            failing: AtomicBool::new(false),
        })
    }

    pub fn fail_from_now(&self) {
        self.failing.store(true, Ordering::SeqCst);
    }

    pub fn received(&self) -> Vec<BroadcastMessage> {
        self.received.lock().unwrap().clone()
    }
}

#[async_trait]
impl Subscriber for RecordingSubscriber {
    fn id(&self) -> &str {
        &self.id
    }

    async fn deliver(&self, message: &BroadcastMessage) -> Result<()> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(ChatError::Delivery("connection closed".to_string()));
        }
        self.received.lock().unwrap().push(message.clone());
        Ok(())
    }
}

pub fn message(text: &str, room_id: i64) -> BroadcastMessage {
    BroadcastMessage {
        id: 1,
        text: text.to_string(),
        username: "alice".to_string(),
        created_at: Utc::now(),
        room_id,
    }
}
