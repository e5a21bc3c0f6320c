//! Bot command bridge.
//!
//! The command handler sits in the hub like any other subscriber. Messages
//! that start with the command prefix are forwarded to the bot worker; the
//! worker's answers come back through [`CommandMessageHandler::on_command_response`],
//! are stored as messages by the bot user and broadcast to the room.

use async_trait::async_trait;
use tracing::{debug, info, warn};

use super::broadcast::HubHandle;
use super::message::BroadcastMessage;
use super::subscriber::Subscriber;
use crate::config::BotConfig;
use crate::db::{Database, MessageRepository, User, UserRepository};
use crate::messenger::{room_key, CommandMessenger, CommandResponse};
use crate::Result;

/// Registry identity of the command handler.
pub const COMMAND_HANDLER_ID: &str = "command-handler";

/// Subscriber forwarding bot commands and posting the bot's answers.
pub struct CommandMessageHandler {
    messenger: CommandMessenger,
    hub: HubHandle,
    db: Database,
    bot: User,
    prefix: String,
}

impl CommandMessageHandler {
    /// Create the handler, registering the bot user if it does not exist yet.
    pub async fn new(
        messenger: CommandMessenger,
        hub: HubHandle,
        db: Database,
        config: &BotConfig,
    ) -> Result<Self> {
        let bot = UserRepository::new(db.pool())
            .find_or_create(&config.username, Some(&config.email))
            .await?;
        info!(bot = %bot.username, prefix = %config.command_prefix, "Command handler ready");

        Ok(Self {
            messenger,
            hub,
            db,
            bot,
            prefix: config.command_prefix.clone(),
        })
    }

    /// The user bot answers are posted as.
    pub fn bot_user(&self) -> &User {
        &self.bot
    }

    /// Command body of `text`, if it is a bot command.
    ///
    /// A prefix followed only by whitespace is not a command.
    pub fn command_body<'a>(&self, text: &'a str) -> Option<&'a str> {
        let body = text.strip_prefix(self.prefix.as_str())?.trim();
        (!body.is_empty()).then_some(body)
    }

    /// Store a bot answer and broadcast it to its room.
    pub async fn on_command_response(&self, response: CommandResponse) -> Result<()> {
        let stored = MessageRepository::new(self.db.pool())
            .create(response.room_id, self.bot.id, &response.result_text)
            .await?;
        debug!(room_id = stored.room_id, message_id = stored.id, "Posted bot answer");

        self.hub.broadcast(BroadcastMessage::from(stored));
        Ok(())
    }
}

#[async_trait]
impl Subscriber for CommandMessageHandler {
    fn id(&self) -> &str {
        COMMAND_HANDLER_ID
    }

    /// Never fails and never waits on the transport: the publish runs on its
    /// own task, and a command that cannot be sent is logged and dropped.
    async fn deliver(&self, message: &BroadcastMessage) -> Result<()> {
        let Some(command) = self.command_body(&message.text) else {
            return Ok(());
        };

        let messenger = self.messenger.clone();
        let room_id = message.room_id;
        let command = command.to_string();
        tokio::spawn(async move {
            let key = room_key(room_id);
            if let Err(e) = messenger.publish(&key, &command).await {
                warn!(room_id, command = %command, error = %e, "Failed to send bot command");
            }
        });
        Ok(())
    }
}
