//! Hub subscriber trait.

use async_trait::async_trait;

use super::message::BroadcastMessage;
use crate::Result;

/// Anything registered with the hub to receive broadcast messages.
///
/// The hub keys its registry by [`Subscriber::id`] and evicts a subscriber
/// the first time [`Subscriber::deliver`] fails.
#[async_trait]
pub trait Subscriber: Send + Sync {
    /// Stable identity of this subscriber.
    fn id(&self) -> &str;

    /// Deliver one message.
    async fn deliver(&self, message: &BroadcastMessage) -> Result<()>;
}
