//! API handlers.

pub mod message;
pub mod room;

pub use message::*;
pub use room::*;

use crate::db::Database;
use crate::hub::HubHandle;

/// Shared state for handlers.
#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub hub: HubHandle,
}

impl AppState {
    pub fn new(db: Database, hub: HubHandle) -> Self {
        Self { db, hub }
    }
}
