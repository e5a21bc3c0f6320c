//! Stock quote lookup.
//!
//! Quotes come from a CSV endpoint returning a header row and one data row:
//! `Symbol,Date,Time,Open,High,Low,Close,Volume`. Missing values are `N/D`.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use tracing::debug;

use crate::config::BotConfig;
use crate::{ChatError, Result};

/// User agent string for quote requests.
const USER_AGENT: &str = "finchat-stockbot/0.1";

/// Column holding the closing price.
///
/// Earlier versions of the bot reported the Open column (index 3) here.
const CLOSE_COLUMN: usize = 6;

/// Placeholder the endpoint uses for missing values.
const NO_DATA: &str = "N/D";

/// Something that can price a stock symbol.
#[async_trait]
pub trait QuoteSource: Send + Sync {
    /// Latest closing price of `symbol`, as text.
    async fn quote(&self, symbol: &str) -> Result<String>;
}

/// HTTP quote fetcher.
pub struct QuoteFetcher {
    client: Client,
    url_template: String,
}

impl QuoteFetcher {
    /// Create a fetcher for the configured endpoint.
    pub fn new(config: &BotConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.quote_timeout_secs))
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| ChatError::Quote(format!("failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            url_template: config.quote_url.clone(),
        })
    }

    /// Request URL for `symbol`.
    pub fn url_for(&self, symbol: &str) -> String {
        self.url_template
            .replace("{symbol}", &urlencoding::encode(symbol))
    }
}

#[async_trait]
impl QuoteSource for QuoteFetcher {
    async fn quote(&self, symbol: &str) -> Result<String> {
        let url = self.url_for(symbol);
        debug!(%url, "Fetching quote");

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| ChatError::Quote(format!("failed to fetch quote: {}", e)))?;

        if !response.status().is_success() {
            return Err(ChatError::Quote(format!(
                "HTTP error: {}",
                response.status()
            )));
        }

        let body = response
            .text()
            .await
            .map_err(|e| ChatError::Quote(format!("failed to read response: {}", e)))?;

        parse_close(&body)
    }
}

/// Closing price from a quote CSV body.
pub fn parse_close(body: &str) -> Result<String> {
    let mut lines = body.lines().map(str::trim).filter(|line| !line.is_empty());

    lines
        .next()
        .ok_or_else(|| ChatError::Quote("empty response".to_string()))?;
    let row = lines
        .next()
        .ok_or_else(|| ChatError::Quote("missing data row".to_string()))?;

    let close = row
        .split(',')
        .nth(CLOSE_COLUMN)
        .map(str::trim)
        .ok_or_else(|| ChatError::Quote(format!("short data row: {row}")))?;

    if close.is_empty() || close == NO_DATA {
        return Err(ChatError::Quote("no data for symbol".to_string()));
    }
    Ok(close.to_string())
}

/// Chat reply for a successful lookup.
pub fn quote_reply(symbol: &str, close: &str) -> String {
    format!("{} quote is ${} per share", symbol, close)
}

/// Chat reply for a failed lookup.
pub fn error_reply(symbol: &str) -> String {
    format!("Error obtaining info for {}", symbol)
}
