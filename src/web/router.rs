//! Router configuration.

use std::sync::Arc;

use axum::{extract::State, routing::get, Json, Router};
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

use super::dto::HealthResponse;
use super::handlers::{
    create_room, get_room, list_messages, list_rooms, post_message, AppState,
};
use super::middleware::create_cors_layer;
use super::ws::chat_ws_handler;

/// Build the application router: `/health`, `/ws` and the `/api` routes.
pub fn create_router(app_state: Arc<AppState>, cors_origins: &[String]) -> Router {
    let room_routes = Router::new()
        .route("/", get(list_rooms).post(create_room))
        .route("/:id", get(get_room))
        .route("/:id/messages", get(list_messages).post(post_message));

    let api_routes = Router::new().nest("/rooms", room_routes);

    Router::new()
        .route("/health", get(health_check))
        .route("/ws", get(chat_ws_handler))
        .nest("/api", api_routes)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(create_cors_layer(cors_origins)),
        )
        .with_state(app_state)
}

/// Health check handler.
async fn health_check(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let subscribers = state.hub.subscriber_ids().await.len();
    let status = if state.hub.is_running() { "ok" } else { "degraded" };
    Json(HealthResponse {
        status,
        subscribers,
    })
}
