//! Command messenger.
//!
//! Bridges chat commands to an out-of-process bot worker over a
//! [`QueueTransport`]. Requests go to the request queue tagged with a
//! correlation key (the decimal room id); responses come back on the response
//! queue carrying the same key, which routes each result to its room.

pub mod memory;
pub mod payload;
pub mod transport;

#[cfg(feature = "amqp")]
pub mod amqp;
#[cfg(feature = "sqs")]
pub mod sqs;

use std::future::Future;
use std::sync::Arc;

use futures::StreamExt;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

pub use memory::MemoryTransport;
pub use transport::{Delivery, DeliveryStream, Envelope, QueueTransport};

use crate::config::{MessengerConfig, TransportKind};
use crate::{ChatError, Result};

/// A command sent to the bot worker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandRequest {
    pub correlation_key: String,
    pub command: String,
}

/// A bot result routed back to a room.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandResponse {
    pub room_id: i64,
    pub result_text: String,
}

/// Correlation key for a room.
pub fn room_key(room_id: i64) -> String {
    room_id.to_string()
}

/// Room id encoded in a correlation key.
pub fn room_id_from_key(key: &str) -> Result<i64> {
    key.trim()
        .parse()
        .map_err(|_| ChatError::Validation(format!("invalid correlation key: {key:?}")))
}

/// Request/response bridge over a queue transport.
#[derive(Clone)]
pub struct CommandMessenger {
    transport: Arc<dyn QueueTransport>,
    request_queue: String,
    response_queue: String,
}

impl CommandMessenger {
    pub fn new(
        transport: Arc<dyn QueueTransport>,
        request_queue: impl Into<String>,
        response_queue: impl Into<String>,
    ) -> Self {
        Self {
            transport,
            request_queue: request_queue.into(),
            response_queue: response_queue.into(),
        }
    }

    /// Messenger using the queues configured for the selected transport.
    pub fn from_config(transport: Arc<dyn QueueTransport>, config: &MessengerConfig) -> Self {
        let (request_queue, response_queue) = config.destinations();
        Self::new(transport, request_queue, response_queue)
    }

    pub fn transport(&self) -> &Arc<dyn QueueTransport> {
        &self.transport
    }

    pub fn request_queue(&self) -> &str {
        &self.request_queue
    }

    pub fn response_queue(&self) -> &str {
        &self.response_queue
    }

    /// Send `command` to the bot worker, asking for the answer on the
    /// response queue.
    pub async fn publish(&self, correlation_key: &str, command: &str) -> Result<()> {
        let envelope =
            Envelope::new(correlation_key, command).with_reply_to(self.response_queue.as_str());
        self.transport
            .publish(&self.request_queue, envelope)
            .await?;
        debug!(
            transport = self.transport.name(),
            key = correlation_key,
            "Published command request"
        );
        Ok(())
    }

    /// Consume the response queue, handing each response to `on_response`.
    ///
    /// Handler errors are logged and do not stop the loop. Every delivery is
    /// acknowledged once handled, including ones with an unreadable key.
    /// Returns an error when the delivery stream fails or ends.
    pub async fn run_response_loop<F, Fut>(&self, mut on_response: F) -> Result<()>
    where
        F: FnMut(CommandResponse) -> Fut,
        Fut: Future<Output = Result<()>>,
    {
        let mut deliveries = self.transport.consume(&self.response_queue).await?;
        info!(
            transport = self.transport.name(),
            queue = %self.response_queue,
            "Response loop started"
        );

        while let Some(item) = deliveries.next().await {
            let delivery = item?;
            let key = &delivery.envelope.correlation_key;

            match room_id_from_key(key) {
                Ok(room_id) => {
                    let response = CommandResponse {
                        room_id,
                        result_text: delivery.envelope.body.clone(),
                    };
                    if let Err(e) = on_response(response).await {
                        error!(room_id, error = %e, "Failed to handle command response");
                    }
                }
                Err(e) => {
                    warn!(error = %e, "Skipping command response");
                }
            }

            if let Err(e) = delivery.ack().await {
                warn!(error = %e, "Failed to acknowledge command response");
            }
        }

        Err(ChatError::Transport(format!(
            "{} response stream closed",
            self.transport.name()
        )))
    }
}

/// Connect the transport selected by `config`.
pub async fn connect_transport(config: &MessengerConfig) -> Result<Arc<dyn QueueTransport>> {
    match config.transport {
        #[cfg(feature = "amqp")]
        TransportKind::Amqp => {
            let amqp = &config.amqp;
            let transport = amqp::AmqpTransport::connect(
                &amqp.url,
                &[amqp.request_queue.as_str(), amqp.response_queue.as_str()],
            )
            .await?;
            Ok(Arc::new(transport))
        }
        #[cfg(feature = "sqs")]
        TransportKind::Sqs => Ok(Arc::new(sqs::SqsTransport::from_env(&config.sqs).await)),
        TransportKind::Memory => Ok(Arc::new(MemoryTransport::new())),
        #[allow(unreachable_patterns)]
        other => Err(ChatError::Config(format!(
            "transport '{}' is not enabled in this build",
            other.as_str()
        ))),
    }
}
