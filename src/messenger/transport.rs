//! Queue transport contract.
//!
//! A transport moves [`Envelope`]s between named destinations. How the
//! correlation key travels (a broker property or a field inside the payload)
//! is the binding's business; callers only ever see envelopes.

use std::future::Future;

use async_trait::async_trait;
use futures::future::BoxFuture;
use futures::stream::BoxStream;

use crate::Result;

/// One message as seen by the messenger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Envelope {
    /// Key tying a response back to the request that caused it.
    pub correlation_key: String,
    /// Payload text: the command for requests, the result for responses.
    pub body: String,
    /// Where the receiver should send its answer, if anywhere.
    pub reply_to: Option<String>,
}

impl Envelope {
    /// Create an envelope without a reply destination.
    pub fn new(correlation_key: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            correlation_key: correlation_key.into(),
            body: body.into(),
            reply_to: None,
        }
    }

    /// Set the reply destination.
    pub fn with_reply_to(mut self, reply_to: impl Into<String>) -> Self {
        self.reply_to = Some(reply_to.into());
        self
    }
}

/// A received envelope plus the means to acknowledge it.
pub struct Delivery {
    /// The received message.
    pub envelope: Envelope,
    ack: Option<BoxFuture<'static, Result<()>>>,
}

impl Delivery {
    /// A delivery that needs no acknowledgement.
    pub fn new(envelope: Envelope) -> Self {
        Self {
            envelope,
            ack: None,
        }
    }

    /// A delivery acknowledged by running `ack`.
    pub fn with_ack<F>(envelope: Envelope, ack: F) -> Self
    where
        F: Future<Output = Result<()>> + Send + 'static,
    {
        Self {
            envelope,
            ack: Some(Box::pin(ack)),
        }
    }

    /// Tell the transport this message has been handled.
    pub async fn ack(self) -> Result<()> {
        match self.ack {
            Some(ack) => ack.await,
            None => Ok(()),
        }
    }
}

impl std::fmt::Debug for Delivery {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Delivery")
            .field("envelope", &self.envelope)
            .field("needs_ack", &self.ack.is_some())
            .finish()
    }
}

/// Stream of deliveries from one destination.
///
/// It yields an `Err` on a transport fault and ends when the underlying
/// connection closes.
pub type DeliveryStream = BoxStream<'static, Result<Delivery>>;

/// Publish/consume primitive over an external queue.
#[async_trait]
pub trait QueueTransport: Send + Sync {
    /// Short binding name for logs.
    fn name(&self) -> &'static str;

    /// Send an envelope to `destination`.
    async fn publish(&self, destination: &str, envelope: Envelope) -> Result<()>;

    /// Start consuming `destination`.
    async fn consume(&self, destination: &str) -> Result<DeliveryStream>;
}
