//! Broadcast hub for finchat.
//!
//! This module provides the in-process fan-out of chat messages:
//! - The hub control loop and its handle
//! - The subscriber trait
//! - Live client and bot command subscribers

mod broadcast;
mod client;
mod command;
mod message;
mod subscriber;

#[cfg(test)]
pub(crate) mod testing;

pub use broadcast::{Hub, HubHandle};
pub use client::LiveClientHandler;
pub use command::{CommandMessageHandler, COMMAND_HANDLER_ID};
pub use message::BroadcastMessage;
pub use subscriber::Subscriber;
