//! finchat - multi-room chat with a stock quote bot
//!
//! Messages posted to a room are stored and fanned out to every live client
//! by the broadcast hub. Messages starting with `/stock=` are also sent to an
//! out-of-process bot over a queue transport, and the bot's answer comes back
//! into the room as a regular message.

pub mod bot;
pub mod config;
pub mod db;
pub mod error;
pub mod hub;
pub mod logging;
pub mod messenger;
pub mod web;

pub use config::Config;
pub use db::Database;
pub use error::{ChatError, Result};
pub use hub::{BroadcastMessage, CommandMessageHandler, Hub, HubHandle, Subscriber};
pub use messenger::{CommandMessenger, CommandResponse, QueueTransport};
