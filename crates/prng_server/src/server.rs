//! Server startup and binding
//!
//! Provides functionality to start the Axum server with configurable host/port
//! and to drain in-flight requests on shutdown.

use std::future::{Future, IntoFuture};
use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use tokio::net::TcpListener;
use tokio::sync::Notify;

use crate::config::ServerConfig;
use crate::routes;

/// Server instance that can be started
pub struct Server {
    /// Server configuration
    config: Arc<ServerConfig>,
    /// The built router
    router: Router,
}

impl Server {
    /// Create a new server instance with the given configuration
    pub fn new(config: ServerConfig) -> Self {
        let config = Arc::new(config);
        let router = routes::build_router(config.clone());

        Self { config, router }
    }

    /// Address the server will bind to, as `host:port`
    pub fn socket_addr(&self) -> String {
        self.config.socket_addr()
    }

    /// Get the configuration
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Run the server until Ctrl-C
    ///
    /// This is the main entry point for starting the server.
    /// It binds to the configured host/port and serves requests.
    pub async fn run(self) -> Result<(), std::io::Error> {
        let listener = TcpListener::bind(self.socket_addr()).await?;
        self.run_until(listener, ctrl_c()).await
    }

    /// Run the server with a specific listener until Ctrl-C
    ///
    /// This is useful for testing where you want to use a listener bound to port 0
    /// to get a random available port.
    pub async fn run_with_listener(self, listener: TcpListener) -> Result<(), std::io::Error> {
        self.run_until(listener, ctrl_c()).await
    }

    /// Run the server until `signal` resolves, then drain connections
    ///
    /// In-flight requests get `shutdown_timeout_secs` to complete before the
    /// server returns regardless.
    pub async fn run_until<F>(self, listener: TcpListener, signal: F) -> Result<(), std::io::Error>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let addr = listener.local_addr()?;
        tracing::info!("Server listening on {}", addr);

        let timeout = Duration::from_secs(self.config.shutdown_timeout_secs);
        let triggered = Arc::new(Notify::new());
        let notify = triggered.clone();

        let serve = axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                signal.await;
                tracing::info!("Shutdown signal received, draining connections");
                notify.notify_one();
            })
            .into_future();

        tokio::select! {
            result = serve => {
                tracing::info!("Server stopped");
                result
            }
            _ = async {
                triggered.notified().await;
                tokio::time::sleep(timeout).await;
            } => {
                tracing::warn!(
                    timeout_secs = timeout.as_secs(),
                    "Shutdown timeout elapsed, aborting open connections"
                );
                Ok(())
            }
        }
    }

    /// Create a test server and return the bound address
    ///
    /// This binds to port 0 to get a random available port, starts the server
    /// in a background task, and returns the actual bound address.
    #[cfg(test)]
    pub async fn spawn_test_server(
        config: ServerConfig,
    ) -> (std::net::SocketAddr, tokio::task::JoinHandle<()>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let server = Self::new(config);
        let handle = tokio::spawn(async move {
            server
                .run_until(listener, std::future::pending())
                .await
                .ok();
        });

        // Give the server a moment to start
        tokio::time::sleep(Duration::from_millis(10)).await;

        (addr, handle)
    }
}

async fn ctrl_c() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to install Ctrl-C handler");
        // Without a handler the server runs until killed
        std::future::pending::<()>().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::StatusCode;

    #[test]
    fn test_server_socket_addr() {
        let mut config = ServerConfig::default();
        config.host = "127.0.0.1".to_string();
        config.port = 3000;

        let server = Server::new(config);

        assert_eq!(server.socket_addr(), "127.0.0.1:3000");
    }

    #[test]
    fn test_server_config_access() {
        let mut config = ServerConfig::default();
        config.port = 9999;

        let server = Server::new(config);

        assert_eq!(server.config().port, 9999);
    }

    #[tokio::test]
    async fn test_server_health_endpoint() {
        let (addr, handle) = Server::spawn_test_server(ServerConfig::default()).await;

        let client = reqwest::Client::new();
        let response = client
            .get(format!("http://{}/health", addr))
            .send()
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);

        let body: serde_json::Value = response.json().await.unwrap();
        assert_eq!(body["status"], "healthy");

        handle.abort();
    }

    #[tokio::test]
    async fn test_server_generate_endpoint() {
        let (addr, handle) = Server::spawn_test_server(ServerConfig::default()).await;

        let client = reqwest::Client::new();
        let response = client
            .post(format!("http://{}/lab1/generate/", addr))
            .json(&serde_json::json!({ "m": 9, "a": 2, "c": 0, "x0": 1, "count": 6 }))
            .send()
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);

        let body: serde_json::Value = response.json().await.unwrap();
        assert_eq!(body["success"], true);
        assert_eq!(body["sequence"], serde_json::json!([2, 4, 8, 7, 5, 1]));

        handle.abort();
    }

    #[tokio::test]
    async fn test_server_enforces_configured_limits() {
        let mut config = ServerConfig::default();
        config.limits.max_count = 5;
        let (addr, handle) = Server::spawn_test_server(config).await;

        let client = reqwest::Client::new();
        let body: serde_json::Value = client
            .post(format!("http://{}/api/v1/randomness", addr))
            .json(&serde_json::json!({ "m": 9, "a": 2, "c": 0, "x0": 1, "count": 6 }))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();

        assert_eq!(body["success"], false);
        assert!(body["error"].as_str().unwrap().contains("must not exceed 5"));

        handle.abort();
    }

    #[tokio::test]
    async fn test_server_unknown_route_returns_404() {
        let (addr, handle) = Server::spawn_test_server(ServerConfig::default()).await;

        let client = reqwest::Client::new();
        let response = client
            .get(format!("http://{}/unknown/path", addr))
            .send()
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        handle.abort();
    }

    #[tokio::test]
    async fn test_server_stops_on_signal() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let (tx, rx) = tokio::sync::oneshot::channel::<()>();

        let server = Server::new(ServerConfig::default());
        let handle = tokio::spawn(server.run_until(listener, async {
            rx.await.ok();
        }));
        tokio::time::sleep(Duration::from_millis(10)).await;

        let response = reqwest::get(format!("http://{}/ready", addr)).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        tx.send(()).unwrap();
        let result = tokio::time::timeout(Duration::from_secs(5), handle)
            .await
            .expect("server did not stop")
            .unwrap();
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_multiple_servers_on_different_ports() {
        let (addr1, handle1) = Server::spawn_test_server(ServerConfig::default()).await;
        let (addr2, handle2) = Server::spawn_test_server(ServerConfig::default()).await;

        assert_ne!(addr1.port(), addr2.port());

        for addr in [addr1, addr2] {
            let response = reqwest::get(format!("http://{}/health", addr)).await.unwrap();
            assert_eq!(response.status(), StatusCode::OK);
        }

        handle1.abort();
        handle2.abort();
    }
}
