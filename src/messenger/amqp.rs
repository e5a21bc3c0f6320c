//! AMQP (RabbitMQ) queue transport.
//!
//! Requests and responses travel on two named queues through the default
//! exchange. The correlation key rides in the `correlation_id` property and
//! the reply queue in `reply_to`; the body is the plain command or result.

use async_trait::async_trait;
use futures::StreamExt;
use lapin::options::{
    BasicAckOptions, BasicConsumeOptions, BasicPublishOptions, QueueDeclareOptions,
};
use lapin::types::FieldTable;
use lapin::{BasicProperties, Channel, Connection, ConnectionProperties};
use tracing::{debug, info};

use super::transport::{Delivery, DeliveryStream, Envelope, QueueTransport};
use crate::{ChatError, Result};

/// Transport over one AMQP channel.
pub struct AmqpTransport {
    connection: Connection,
    channel: Channel,
}

impl AmqpTransport {
    /// Connect to the broker and declare `queues`.
    pub async fn connect(url: &str, queues: &[&str]) -> Result<Self> {
        let connection = Connection::connect(url, ConnectionProperties::default()).await?;
        let channel = connection.create_channel().await?;
        info!("Connected to AMQP broker");

        for queue in queues {
            channel
                .queue_declare(queue, QueueDeclareOptions::default(), FieldTable::default())
                .await?;
            debug!(queue, "Declared queue");
        }

        Ok(Self {
            connection,
            channel,
        })
    }

    /// Close the channel and the connection.
    pub async fn close(&self) -> Result<()> {
        self.channel.close(200, "bye").await?;
        self.connection.close(200, "bye").await?;
        Ok(())
    }
}

#[async_trait]
impl QueueTransport for AmqpTransport {
    fn name(&self) -> &'static str {
        "amqp"
    }

    async fn publish(&self, destination: &str, envelope: Envelope) -> Result<()> {
        let mut properties = BasicProperties::default()
            .with_content_type("text/plain".into())
            .with_correlation_id(envelope.correlation_key.as_str().into());
        if let Some(reply_to) = envelope.reply_to.as_deref() {
            properties = properties.with_reply_to(reply_to.into());
        }

        self.channel
            .basic_publish(
                "",
                destination,
                BasicPublishOptions::default(),
                envelope.body.as_bytes(),
                properties,
            )
            .await?
            .await?;
        Ok(())
    }

    async fn consume(&self, destination: &str) -> Result<DeliveryStream> {
        let consumer = self
            .channel
            .basic_consume(
                destination,
                "",
                BasicConsumeOptions::default(),
                FieldTable::default(),
            )
            .await?;
        info!(queue = destination, "Consuming AMQP queue");

        let stream = consumer.map(|item| -> Result<Delivery> {
            let delivery = item.map_err(ChatError::from)?;
            let properties = &delivery.properties;

            let envelope = Envelope {
                correlation_key: properties
                    .correlation_id()
                    .as_ref()
                    .map(|id| id.as_str().to_string())
                    .unwrap_or_default(),
                body: String::from_utf8_lossy(&delivery.data).into_owned(),
                reply_to: properties
                    .reply_to()
                    .as_ref()
                    .map(|queue| queue.as_str().to_string()),
            };

            let acker = delivery.acker.clone();
            Ok(Delivery::with_ack(envelope, async move {
                acker
                    .ack(BasicAckOptions::default())
                    .await
                    .map_err(ChatError::from)
            }))
        });

        Ok(stream.boxed())
    }
}
