//! Stock bot request loop.

use std::sync::Arc;

use futures::StreamExt;
use tracing::{error, info, warn};

use super::quote::{error_reply, quote_reply, QuoteSource};
use crate::messenger::{Envelope, QueueTransport};
use crate::{ChatError, Result};

/// Answers stock commands from the request queue.
pub struct StockBot {
    source: Arc<dyn QuoteSource>,
    transport: Arc<dyn QueueTransport>,
    request_queue: String,
    response_queue: String,
}

impl StockBot {
    /// Create a bot reading `request_queue`.
    ///
    /// Answers go to each request's reply destination, or to
    /// `response_queue` when a request names none.
    pub fn new(
        source: Arc<dyn QuoteSource>,
        transport: Arc<dyn QueueTransport>,
        request_queue: impl Into<String>,
        response_queue: impl Into<String>,
    ) -> Self {
        Self {
            source,
            transport,
            request_queue: request_queue.into(),
            response_queue: response_queue.into(),
        }
    }

    /// Reply text for one command. Lookup failures become an error reply.
    pub async fn answer(&self, command: &str) -> String {
        let symbol = command.trim();
        if symbol.is_empty() {
            return error_reply(symbol);
        }

        match self.source.quote(symbol).await {
            Ok(close) => quote_reply(symbol, &close),
            Err(e) => {
                warn!(symbol, error = %e, "Quote lookup failed");
                error_reply(symbol)
            }
        }
    }

    /// Consume requests until the stream fails or closes.
    pub async fn run(&self) -> Result<()> {
        let mut requests = self.transport.consume(&self.request_queue).await?;
        info!(
            transport = self.transport.name(),
            queue = %self.request_queue,
            "Stock bot waiting for commands"
        );

        while let Some(item) = requests.next().await {
            let delivery = item?;
            let request = &delivery.envelope;
            info!(key = %request.correlation_key, command = %request.body, "Received command");

            let reply = self.answer(&request.body).await;
            let destination = request
                .reply_to
                .clone()
                .unwrap_or_else(|| self.response_queue.clone());

            let response = Envelope::new(request.correlation_key.clone(), reply);
            if let Err(e) = self.transport.publish(&destination, response).await {
                error!(destination = %destination, error = %e, "Failed to publish answer");
                continue;
            }

            if let Err(e) = delivery.ack().await {
                warn!(error = %e, "Failed to acknowledge command");
            }
        }

        Err(ChatError::Transport(format!(
            "{} request stream closed",
            self.transport.name()
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::messenger::MemoryTransport;
    use async_trait::async_trait;

    struct FixedQuotes;

    #[async_trait]
    impl QuoteSource for FixedQuotes {
        async fn quote(&self, symbol: &str) -> Result<String> {
            match symbol {
                "AAPL" => Ok("183.38".to_string()),
                _ => Err(ChatError::Quote("no data for symbol".to_string())),
            }
        }
    }

    fn bot(transport: Arc<MemoryTransport>) -> StockBot {
        StockBot::new(Arc::new(FixedQuotes), transport, "req", "resp")
    }

    #[tokio::test]
    async fn test_answer() {
        let bot = bot(Arc::new(MemoryTransport::new()));
        assert_eq!(bot.answer("AAPL").await, "AAPL quote is $183.38 per share");
        assert_eq!(bot.answer("XXXX").await, "Error obtaining info for XXXX");
    }

    #[tokio::test]
    async fn test_run_replies_with_same_key() {
        let transport = Arc::new(MemoryTransport::new());
        transport
            .publish("req", Envelope::new("7", "AAPL").with_reply_to("custom"))
            .await
            .unwrap();
        transport
            .publish("req", Envelope::new("3", "XXXX"))
            .await
            .unwrap();
        transport.close("req");

        let result = bot(transport.clone()).run().await;
        assert!(matches!(result, Err(ChatError::Transport(_))));

        let mut custom = transport.consume("custom").await.unwrap();
        let answer = custom.next().await.unwrap().unwrap();
        assert_eq!(
            answer.envelope,
            Envelope::new("7", "AAPL quote is $183.38 per share")
        );

        let mut fallback = transport.consume("resp").await.unwrap();
        let answer = fallback.next().await.unwrap().unwrap();
        assert_eq!(
            answer.envelope,
            Envelope::new("3", "Error obtaining info for XXXX")
        );
    }
}
