//! Shared helpers for integration tests.

#![allow(dead_code)]

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum_test::TestServer;

use finchat::config::HubConfig;
use finchat::web::{create_router, AppState};
use finchat::{BroadcastMessage, ChatError, Database, Hub, HubHandle, Result, Subscriber};

/// Default timeout for waiting on asynchronous effects.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

/// Subscriber that records every message it receives.
pub struct Recorder {
    id: String,
    received: Mutex<Vec<BroadcastMessage>>,
}

impl Recorder {
    pub fn new(id: &str) -> Arc<Self> {
        Arc::new(Self {
            id: id.to_string(),
            received: Mutex::new(Vec::new()),
        })
    }

    pub fn received(&self) -> Vec<BroadcastMessage> {
        self.received.lock().unwrap().clone()
    }

    /// Wait until at least `count` messages have arrived.
    pub async fn wait_for(&self, count: usize) -> Vec<BroadcastMessage> {
        let waited = tokio::time::timeout(DEFAULT_TIMEOUT, async {
            loop {
                let received = self.received();
                if received.len() >= count {
                    return received;
                }
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        })
        .await;
        waited.unwrap_or_else(|_| panic!("timed out waiting for {count} messages"))
    }
}

#[async_trait]
impl Subscriber for Recorder {
    fn id(&self) -> &str {
        &self.id
    }

    async fn deliver(&self, message: &BroadcastMessage) -> Result<()> {
        self.received.lock().unwrap().push(message.clone());
        Ok(())
    }
}

/// Subscriber whose deliveries always fail.
pub struct Broken(pub &'static str);

#[async_trait]
impl Subscriber for Broken {
    fn id(&self) -> &str {
        self.0
    }

    async fn deliver(&self, _message: &BroadcastMessage) -> Result<()> {
        Err(ChatError::Delivery("broken pipe".to_string()))
    }
}

/// Test server over an in-memory database and a fresh hub.
pub async fn create_test_server() -> (TestServer, Database, HubHandle) {
    let db = Database::open_in_memory()
        .await
        .expect("Failed to create test database");
    let (hub, _task) = Hub::spawn(&HubConfig::default());

    let app_state = Arc::new(AppState::new(db.clone(), hub.clone()));
    let router = create_router(app_state, &[]);
    let server = TestServer::new(router).expect("Failed to create test server");

    (server, db, hub)
}
