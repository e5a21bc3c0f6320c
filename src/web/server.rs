//! Web server.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::TcpListener;

use crate::config::ServerConfig;
use crate::db::Database;
use crate::hub::HubHandle;
use crate::{ChatError, Result};

use super::handlers::AppState;
use super::router::create_router;

/// HTTP and WebSocket server.
pub struct WebServer {
    addr: SocketAddr,
    app_state: Arc<AppState>,
    cors_origins: Vec<String>,
}

impl WebServer {
    pub fn new(config: &ServerConfig, db: Database, hub: HubHandle) -> Result<Self> {
        let addr = format!("{}:{}", config.host, config.port)
            .parse()
            .map_err(|e| ChatError::Config(format!("invalid server address: {}", e)))?;

        Ok(Self {
            addr,
            app_state: Arc::new(AppState::new(db, hub)),
            cors_origins: config.cors_origins.clone(),
        })
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Serve until `shutdown` resolves.
    pub async fn run(self, shutdown: impl Future<Output = ()> + Send + 'static) -> Result<()> {
        let router = create_router(self.app_state, &self.cors_origins);
        let listener = TcpListener::bind(self.addr).await?;
        tracing::info!("Web server listening on http://{}", listener.local_addr()?);

        axum::serve(listener, router)
            .with_graceful_shutdown(shutdown)
            .await?;
        Ok(())
    }

    /// Serve on a background task and return the bound address.
    ///
    /// Useful with port 0.
    pub async fn run_with_addr(self) -> Result<SocketAddr> {
        let router = create_router(self.app_state, &self.cors_origins);
        let listener = TcpListener::bind(self.addr).await?;
        let local_addr = listener.local_addr()?;
        tracing::info!("Web server listening on http://{}", local_addr);

        tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, router).await {
                tracing::error!("Web server error: {}", e);
            }
        });

        Ok(local_addr)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::HubConfig;
    use crate::hub::Hub;

    fn test_config() -> ServerConfig {
        ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 0,
            cors_origins: vec![],
        }
    }

    #[tokio::test]
    async fn test_invalid_address() {
        let db = Database::open_in_memory().await.unwrap();
        let (hub, _task) = Hub::spawn(&HubConfig::default());
        let config = ServerConfig {
            host: "not an address".to_string(),
            ..test_config()
        };
        assert!(matches!(
            WebServer::new(&config, db, hub),
            Err(ChatError::Config(_))
        ));
    }

    #[tokio::test]
    async fn test_run_serves_health() {
        let db = Database::open_in_memory().await.unwrap();
        let (hub, _task) = Hub::spawn(&HubConfig::default());
        let server = WebServer::new(&test_config(), db, hub).unwrap();
        assert_eq!(server.addr().ip().to_string(), "127.0.0.1");

        let addr = server.run_with_addr().await.unwrap();
        let resp = reqwest::Client::new()
            .get(format!("http://{}/health", addr))
            .send()
            .await
            .unwrap();

        assert!(resp.status().is_success());
        let body: serde_json::Value = serde_json::from_str(&resp.text().await.unwrap()).unwrap();
        assert_eq!(body["status"], "ok");
    }
}
