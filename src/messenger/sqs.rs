//! Amazon SQS queue transport.
//!
//! Destinations are queue URLs. SQS has no correlation property, so the
//! correlation key and reply destination are carried in a JSON body (see
//! [`super::payload`]). Messages are deleted only once the consumer acks them.

use std::collections::VecDeque;
use std::sync::Arc;

use async_trait::async_trait;
use aws_sdk_sqs::error::DisplayErrorContext;
use aws_sdk_sqs::Client;
use futures::StreamExt;
use tracing::{info, warn};

use super::payload;
use super::transport::{Delivery, DeliveryStream, Envelope, QueueTransport};
use crate::config::SqsConfig;
use crate::{ChatError, Result};

/// A message as returned by a receive call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReceivedMessage {
    pub body: String,
    pub receipt_handle: Option<String>,
}

/// The SQS operations the transport needs.
#[async_trait]
pub trait SqsApi: Send + Sync {
    async fn send(&self, queue_url: &str, body: String) -> Result<()>;

    async fn receive(
        &self,
        queue_url: &str,
        max_messages: i32,
        wait_time_secs: i32,
    ) -> Result<Vec<ReceivedMessage>>;

    async fn delete(&self, queue_url: &str, receipt_handle: &str) -> Result<()>;
}

fn sdk_error(action: &str, err: impl std::error::Error) -> ChatError {
    ChatError::Transport(format!("SQS {action} failed: {}", DisplayErrorContext(err)))
}

#[async_trait]
impl SqsApi for Client {
    async fn send(&self, queue_url: &str, body: String) -> Result<()> {
        self.send_message()
            .queue_url(queue_url)
            .message_body(body)
            .send()
            .await
            .map_err(|e| sdk_error("send", e))?;
        Ok(())
    }

    async fn receive(
        &self,
        queue_url: &str,
        max_messages: i32,
        wait_time_secs: i32,
    ) -> Result<Vec<ReceivedMessage>> {
        let output = self
            .receive_message()
            .queue_url(queue_url)
            .max_number_of_messages(max_messages)
            .wait_time_seconds(wait_time_secs)
            .send()
            .await
            .map_err(|e| sdk_error("receive", e))?;

        Ok(output
            .messages()
            .iter()
            .map(|m| ReceivedMessage {
                body: m.body().unwrap_or_default().to_string(),
                receipt_handle: m.receipt_handle().map(str::to_string),
            })
            .collect())
    }

    async fn delete(&self, queue_url: &str, receipt_handle: &str) -> Result<()> {
        self.delete_message()
            .queue_url(queue_url)
            .receipt_handle(receipt_handle)
            .send()
            .await
            .map_err(|e| sdk_error("delete", e))?;
        Ok(())
    }
}

/// Transport over an SQS client.
pub struct SqsTransport {
    api: Arc<dyn SqsApi>,
    wait_time_secs: i32,
    max_messages: i32,
}

impl SqsTransport {
    /// Build a transport over any [`SqsApi`].
    pub fn new(api: Arc<dyn SqsApi>, config: &SqsConfig) -> Self {
        Self {
            api,
            wait_time_secs: config.wait_time_secs,
            max_messages: config.max_messages,
        }
    }

    /// Build a transport using credentials and region from the environment.
    pub async fn from_env(config: &SqsConfig) -> Self {
        let shared = aws_config::load_defaults(aws_config::BehaviorVersion::latest()).await;
        info!("Loaded AWS configuration for SQS");
        Self::new(Arc::new(Client::new(&shared)), config)
    }
}

async fn delete_message(
    api: Arc<dyn SqsApi>,
    queue_url: String,
    receipt_handle: Option<String>,
) -> Result<()> {
    match receipt_handle {
        Some(handle) => api.delete(&queue_url, &handle).await,
        None => Ok(()),
    }
}

struct Poller {
    api: Arc<dyn SqsApi>,
    queue_url: String,
    wait_time_secs: i32,
    max_messages: i32,
    buffer: VecDeque<ReceivedMessage>,
    failed: bool,
}

impl Poller {
    /// Next delivery: drain the buffer first, then long-poll.
    async fn next(mut self) -> Option<(Result<Delivery>, Self)> {
        loop {
            if self.failed {
                return None;
            }

            if let Some(message) = self.buffer.pop_front() {
                let api = Arc::clone(&self.api);
                let queue_url = self.queue_url.clone();
                match payload::decode(&message.body) {
                    Ok(envelope) => {
                        let ack = delete_message(api, queue_url, message.receipt_handle);
                        return Some((Ok(Delivery::with_ack(envelope, ack)), self));
                    }
                    Err(e) => {
                        warn!(queue = %queue_url, error = %e, "Dropping malformed SQS message");
                        let deleted = delete_message(api, queue_url, message.receipt_handle);
                        if let Err(e) = deleted.await {
                            warn!(error = %e, "Failed to delete malformed SQS message");
                        }
                        continue;
                    }
                }
            }

            let received = self
                .api
                .receive(&self.queue_url, self.max_messages, self.wait_time_secs)
                .await;

            match received {
                Ok(messages) => self.buffer.extend(messages),
                Err(e) => {
                    self.failed = true;
                    return Some((Err(e), self));
                }
            }
        }
    }
}

#[async_trait]
impl QueueTransport for SqsTransport {
    fn name(&self) -> &'static str {
        "sqs"
    }

    async fn publish(&self, destination: &str, envelope: Envelope) -> Result<()> {
        let body = payload::encode(&envelope)?;
        self.api.send(destination, body).await
    }

    async fn consume(&self, destination: &str) -> Result<DeliveryStream> {
        info!(queue = destination, "Polling SQS queue");
        let poller = Poller {
            api: Arc::clone(&self.api),
            queue_url: destination.to_string(),
            wait_time_secs: self.wait_time_secs,
            max_messages: self.max_messages,
            buffer: VecDeque::new(),
            failed: false,
        };
        Ok(futures::stream::unfold(poller, Poller::next).boxed())
    }
}
