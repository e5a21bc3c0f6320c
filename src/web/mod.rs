//! Web API module for finchat.
//!
//! REST endpoints for rooms and messages, plus the WebSocket endpoint that
//! registers live clients with the broadcast hub.

pub mod dto;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod router;
pub mod server;
pub mod ws;

pub use error::ApiError;
pub use handlers::AppState;
pub use router::create_router;
pub use server::WebServer;
