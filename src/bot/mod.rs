//! Stock quote bot.
//!
//! Runs as its own process (the `stockbot` binary) or, with the in-memory
//! transport, as a task inside the chat server.

mod quote;
mod worker;

pub use quote::{error_reply, parse_close, quote_reply, QuoteFetcher, QuoteSource};
pub use worker::StockBot;
