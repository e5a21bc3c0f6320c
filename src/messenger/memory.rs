//! In-process queue transport.
//!
//! Queues are created on first use. Each queue has a single consumer; a
//! second `consume` on the same destination fails. Closing a queue ends its
//! delivery stream, which is how a broker disconnect looks to consumers.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use futures::StreamExt;
use tokio::sync::mpsc;

use super::transport::{Delivery, DeliveryStream, Envelope, QueueTransport};
use crate::{ChatError, Result};

struct Queue {
    sender: Option<mpsc::UnboundedSender<Envelope>>,
    receiver: Option<mpsc::UnboundedReceiver<Envelope>>,
}

impl Queue {
    fn new() -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            sender: Some(tx),
            receiver: Some(rx),
        }
    }
}

/// Transport backed by in-memory channels.
#[derive(Default)]
pub struct MemoryTransport {
    queues: Mutex<HashMap<String, Queue>>,
}

impl MemoryTransport {
    /// Create an empty transport.
    pub fn new() -> Self {
        Self::default()
    }

    /// Close a queue: its consumer's stream ends and later publishes fail.
    pub fn close(&self, destination: &str) {
        let mut queues = self.lock();
        queues
            .entry(destination.to_string())
            .or_insert_with(Queue::new)
            .sender = None;
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, Queue>> {
        self.queues.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl QueueTransport for MemoryTransport {
    fn name(&self) -> &'static str {
        "memory"
    }

    async fn publish(&self, destination: &str, envelope: Envelope) -> Result<()> {
        let mut queues = self.lock();
        let queue = queues
            .entry(destination.to_string())
            .or_insert_with(Queue::new);

        match &queue.sender {
            Some(sender) => sender
                .send(envelope)
                .map_err(|_| ChatError::Transport(format!("queue {destination} has no consumer"))),
            None => Err(ChatError::Transport(format!("queue {destination} is closed"))),
        }
    }

    async fn consume(&self, destination: &str) -> Result<DeliveryStream> {
        let receiver = {
            let mut queues = self.lock();
            queues
                .entry(destination.to_string())
                .or_insert_with(Queue::new)
                .receiver
                .take()
        };

        let receiver = receiver.ok_or_else(|| {
            ChatError::Transport(format!("queue {destination} already has a consumer"))
        })?;

        let stream = futures::stream::unfold(receiver, |mut receiver| async move {
            receiver
                .recv()
                .await
                .map(|envelope| (Ok(Delivery::new(envelope)), receiver))
        });

        Ok(stream.boxed())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_publish_then_consume() {
        let transport = MemoryTransport::new();
        transport
            .publish("q", Envelope::new("1", "first"))
            .await
            .unwrap();

        let mut stream = transport.consume("q").await.unwrap();
        transport
            .publish("q", Envelope::new("2", "second"))
            .await
            .unwrap();

        let first = stream.next().await.unwrap().unwrap();
        let second = stream.next().await.unwrap().unwrap();
        assert_eq!(first.envelope, Envelope::new("1", "first"));
        assert_eq!(second.envelope, Envelope::new("2", "second"));
    }

    #[tokio::test]
    async fn test_second_consumer_rejected() {
        let transport = MemoryTransport::new();
        let _stream = transport.consume("q").await.unwrap();
        let result = transport.consume("q").await;
        assert!(matches!(result, Err(ChatError::Transport(_))));
    }

    #[tokio::test]
    async fn test_close_ends_stream() {
        let transport = MemoryTransport::new();
        let mut stream = transport.consume("q").await.unwrap();

        transport.publish("q", Envelope::new("1", "last")).await.unwrap();
        transport.close("q");

        assert!(stream.next().await.is_some());
        assert!(stream.next().await.is_none());
        assert!(transport.publish("q", Envelope::new("1", "x")).await.is_err());
    }

    #[tokio::test]
    async fn test_queues_are_independent() {
        let transport = MemoryTransport::new();
        transport.publish("a", Envelope::new("1", "for a")).await.unwrap();
        transport.publish("b", Envelope::new("2", "for b")).await.unwrap();

        let mut b = transport.consume("b").await.unwrap();
        let delivery = b.next().await.unwrap().unwrap();
        assert_eq!(delivery.envelope.body, "for b");
    }
}
