//! Broadcast hub.
//!
//! A single task owns the subscriber registry. Callers talk to it through a
//! [`HubHandle`], which enqueues commands on one unbounded channel and returns
//! immediately. Because adds, removes and broadcasts share that channel, the
//! control loop applies them in exactly the order they were issued.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::message::BroadcastMessage;
use super::subscriber::Subscriber;
use crate::config::HubConfig;

/// Commands processed by the control loop.
enum HubCommand {
    Add(Arc<dyn Subscriber>),
    Remove(String),
    Broadcast(BroadcastMessage),
    Snapshot(oneshot::Sender<Vec<String>>),
    Shutdown,
}

/// Cloneable handle used to talk to a running [`Hub`].
#[derive(Clone)]
pub struct HubHandle {
    commands: mpsc::UnboundedSender<HubCommand>,
}

impl HubHandle {
    /// Register a subscriber, replacing any subscriber with the same ID.
    pub fn add_subscriber(&self, subscriber: Arc<dyn Subscriber>) {
        self.send(HubCommand::Add(subscriber));
    }

    /// Deregister a subscriber by ID. Removing an unknown ID is a no-op.
    pub fn remove_subscriber(&self, id: &str) {
        self.send(HubCommand::Remove(id.to_string()));
    }

    /// Deliver a message to every subscriber registered when the hub
    /// processes it.
    pub fn broadcast(&self, message: BroadcastMessage) {
        self.send(HubCommand::Broadcast(message));
    }

    /// IDs of the registered subscribers, sorted.
    ///
    /// The snapshot is taken after every command issued before this call has
    /// been applied. Returns an empty list if the hub has stopped.
    pub async fn subscriber_ids(&self) -> Vec<String> {
        let (tx, rx) = oneshot::channel();
        self.send(HubCommand::Snapshot(tx));
        rx.await.unwrap_or_default()
    }

    /// Stop the control loop after the commands already queued.
    pub fn shutdown(&self) {
        self.send(HubCommand::Shutdown);
    }

    /// Whether the control loop is still accepting commands.
    pub fn is_running(&self) -> bool {
        !self.commands.is_closed()
    }

    fn send(&self, command: HubCommand) {
        if self.commands.send(command).is_err() {
            warn!("Hub is not running; command dropped");
        }
    }
}

/// The broadcast hub control loop.
pub struct Hub {
    subscribers: HashMap<String, Arc<dyn Subscriber>>,
    commands: mpsc::UnboundedReceiver<HubCommand>,
    delivery_timeout: Duration,
}

impl Hub {
    /// Create a hub and the handle that feeds it.
    pub fn new(config: &HubConfig) -> (Self, HubHandle) {
        let (tx, rx) = mpsc::unbounded_channel();
        let hub = Self {
            subscribers: HashMap::new(),
            commands: rx,
            delivery_timeout: Duration::from_millis(config.delivery_timeout_ms),
        };
        (hub, HubHandle { commands: tx })
    }

    /// Create a hub and run its control loop on a new task.
    pub fn spawn(config: &HubConfig) -> (HubHandle, JoinHandle<()>) {
        let (hub, handle) = Self::new(config);
        let task = tokio::spawn(hub.run());
        (handle, task)
    }

    /// Run the control loop until shutdown or until every handle is dropped.
    pub async fn run(mut self) {
        info!("Hub started");

        while let Some(command) = self.commands.recv().await {
            match command {
                HubCommand::Add(subscriber) => self.add(subscriber),
                HubCommand::Remove(id) => self.remove(&id),
                HubCommand::Broadcast(message) => self.broadcast(message).await,
                HubCommand::Snapshot(reply) => {
                    let mut ids: Vec<String> = self.subscribers.keys().cloned().collect();
                    ids.sort();
                    let _ = reply.send(ids);
                }
                HubCommand::Shutdown => break,
            }
        }

        info!(subscribers = self.subscribers.len(), "Hub stopped");
    }

    fn add(&mut self, subscriber: Arc<dyn Subscriber>) {
        let id = subscriber.id().to_string();
        debug!(subscriber = %id, "Adding subscriber");
        if self.subscribers.insert(id.clone(), subscriber).is_some() {
            debug!(subscriber = %id, "Replaced existing subscriber");
        }
    }

    fn remove(&mut self, id: &str) {
        if self.subscribers.remove(id).is_some() {
            debug!(subscriber = %id, "Removed subscriber");
        }
    }

    /// Deliver to the current snapshot concurrently, then evict failures.
    async fn broadcast(&mut self, message: BroadcastMessage) {
        debug!(
            room_id = message.room_id,
            subscribers = self.subscribers.len(),
            "Broadcasting message"
        );

        let timeout = self.delivery_timeout;
        let deliveries: Vec<_> = self
            .subscribers
            .iter()
            .map(|(id, subscriber)| {
                let id = id.clone();
                let subscriber = Arc::clone(subscriber);
                let message = message.clone();
                async move {
                    let outcome = tokio::time::timeout(timeout, subscriber.deliver(&message)).await;
                    (id, outcome)
                }
            })
            .collect();

        for (id, outcome) in join_all(deliveries).await {
            match outcome {
                Ok(Ok(())) => {}
                Ok(Err(e)) => {
                    warn!(subscriber = %id, error = %e, "Delivery failed; removing subscriber");
                    self.subscribers.remove(&id);
                }
                Err(_) => {
                    warn!(subscriber = %id, ?timeout, "Delivery timed out; removing subscriber");
                    self.subscribers.remove(&id);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hub::testing::{message, RecordingSubscriber};
    use crate::Result;
    use async_trait::async_trait;

    struct StalledSubscriber;

    #[async_trait]
    impl Subscriber for StalledSubscriber {
        fn id(&self) -> &str {
            "stalled"
        }

        async fn deliver(&self, _message: &BroadcastMessage) -> Result<()> {
            tokio::time::sleep(Duration::from_secs(30)).await;
            Ok(())
        }
    }

    fn spawn_hub() -> HubHandle {
        Hub::spawn(&HubConfig::default()).0
    }

    #[tokio::test]
    async fn test_add_same_id_twice_keeps_one_entry() {
        let hub = spawn_hub();
        let first = RecordingSubscriber::new("x");
        let second = RecordingSubscriber::new("x");

        hub.add_subscriber(first.clone());
        hub.add_subscriber(second.clone());
        assert_eq!(hub.subscriber_ids().await, vec!["x".to_string()]);

        hub.broadcast(message("hello", 1));
        hub.subscriber_ids().await;
        assert!(first.received().is_empty());
        assert_eq!(second.received().len(), 1);
    }

    #[tokio::test]
    async fn test_remove_is_idempotent() {
        let hub = spawn_hub();
        hub.add_subscriber(RecordingSubscriber::new("a"));
        hub.add_subscriber(RecordingSubscriber::new("b"));

        hub.remove_subscriber("a");
        assert_eq!(hub.subscriber_ids().await, vec!["b".to_string()]);

        hub.remove_subscriber("a");
        hub.remove_subscriber("never-added");
        assert_eq!(hub.subscriber_ids().await, vec!["b".to_string()]);
    }

    #[tokio::test]
    async fn test_broadcast_reaches_every_subscriber_once() {
        let hub = spawn_hub();
        let subscribers: Vec<_> = (0..25)
            .map(|i| RecordingSubscriber::new(&format!("sub-{i}")))
            .collect();
        for s in &subscribers {
            hub.add_subscriber(s.clone());
        }

        let msg = message("fan-out", 3);
        hub.broadcast(msg.clone());
        hub.subscriber_ids().await;

        for s in &subscribers {
            assert_eq!(s.received(), vec![msg.clone()]);
        }
    }

    #[tokio::test]
    async fn test_broadcast_to_no_subscribers() {
        let hub = spawn_hub();
        hub.broadcast(message("nobody", 1));
        assert!(hub.subscriber_ids().await.is_empty());
        assert!(hub.is_running());
    }

    #[tokio::test]
    async fn test_failing_subscriber_is_evicted() {
        let hub = spawn_hub();
        let healthy = RecordingSubscriber::new("healthy");
        let broken = RecordingSubscriber::new("broken");
        hub.add_subscriber(healthy.clone());
        hub.add_subscriber(broken.clone());

        broken.fail_from_now();
        hub.broadcast(message("first", 1));
        assert_eq!(hub.subscriber_ids().await, vec!["healthy".to_string()]);

        hub.broadcast(message("second", 1));
        hub.subscriber_ids().await;

        let texts: Vec<String> = healthy.received().into_iter().map(|m| m.text).collect();
        assert_eq!(texts, vec!["first".to_string(), "second".to_string()]);
        assert!(broken.received().is_empty());
    }

    #[tokio::test]
    async fn test_ordering_remove_then_broadcast() {
        let hub = spawn_hub();
        let sub = RecordingSubscriber::new("leaving");
        hub.add_subscriber(sub.clone());

        hub.remove_subscriber("leaving");
        hub.broadcast(message("after remove", 1));
        hub.subscriber_ids().await;

        assert!(sub.received().is_empty());
    }

    #[tokio::test]
    async fn test_late_subscriber_misses_earlier_broadcast() {
        let hub = spawn_hub();
        hub.broadcast(message("early", 1));
        let late = RecordingSubscriber::new("late");
        hub.add_subscriber(late.clone());
        hub.subscriber_ids().await;

        assert!(late.received().is_empty());
    }

    #[tokio::test]
    async fn test_slow_subscriber_times_out_and_is_evicted() {
        let config = HubConfig {
            delivery_timeout_ms: 20,
        };
        let (hub, _task) = Hub::spawn(&config);
        let healthy = RecordingSubscriber::new("healthy");
        hub.add_subscriber(Arc::new(StalledSubscriber));
        hub.add_subscriber(healthy.clone());

        hub.broadcast(message("tick", 1));
        assert_eq!(hub.subscriber_ids().await, vec!["healthy".to_string()]);
        assert_eq!(healthy.received().len(), 1);
    }

    #[tokio::test]
    async fn test_shutdown_stops_loop() {
        let (hub, task) = Hub::spawn(&HubConfig::default());
        hub.add_subscriber(RecordingSubscriber::new("a"));
        hub.shutdown();
        task.await.unwrap();

        assert!(!hub.is_running());
        assert!(hub.subscriber_ids().await.is_empty());
    }

    #[tokio::test]
    async fn test_loop_ends_when_handles_dropped() {
        let (hub, task) = Hub::spawn(&HubConfig::default());
        drop(hub);
        task.await.unwrap();
    }
}
