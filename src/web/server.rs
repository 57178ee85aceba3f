//! Web server for Depot.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio::net::TcpListener;

use crate::auth::TokenStore;
use crate::config::ServerConfig;
use crate::{DepotError, Result};

use super::handlers::AppState;
use super::router::create_router;

/// Token cleanup interval: 1 hour.
const CLEANUP_INTERVAL_SECS: u64 = 3600;

/// Web server for the API.
pub struct WebServer {
    addr: SocketAddr,
    app_state: Arc<AppState>,
    config: ServerConfig,
}

impl WebServer {
    /// Create a new web server.
    pub fn new(config: &ServerConfig, app_state: AppState) -> Result<Self> {
        let addr: SocketAddr = format!("{}:{}", config.host, config.port)
            .parse()
            .map_err(|e| {
                DepotError::Config(format!(
                    "invalid listen address {}:{}: {e}",
                    config.host, config.port
                ))
            })?;

        Ok(Self {
            addr,
            app_state: Arc::new(app_state),
            config: config.clone(),
        })
    }

    /// Get the configured server address.
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Start the token cleanup background task.
    ///
    /// Runs every hour and purges expired session tokens from the store.
    fn start_token_cleanup_task(tokens: Arc<dyn TokenStore>) {
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(Duration::from_secs(CLEANUP_INTERVAL_SECS));

            // Skip the first immediate tick
            interval.tick().await;

            loop {
                interval.tick().await;

                match tokens.cleanup_expired().await {
                    Ok(count) if count > 0 => {
                        tracing::info!(deleted_count = count, "Cleaned up expired session tokens");
                    }
                    Ok(_) => tracing::debug!("No expired session tokens to clean up"),
                    Err(e) => tracing::warn!(error = %e, "Failed to cleanup session tokens"),
                }
            }
        });
    }

    async fn bind(self) -> Result<(TcpListener, axum::Router)> {
        let tokens = self.app_state.authenticator.token_store().clone();
        let router = create_router(self.app_state, &self.config);

        let listener = TcpListener::bind(self.addr).await?;

        // Start token cleanup background task after successful bind
        Self::start_token_cleanup_task(tokens);
        tracing::info!("Token cleanup task started (runs every hour)");

        Ok((listener, router))
    }

    /// Run the web server until `shutdown` completes.
    pub async fn run<F>(self, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let (listener, router) = self.bind().await?;
        tracing::info!("Web server listening on http://{}", listener.local_addr()?);

        axum::serve(listener, router)
            .with_graceful_shutdown(shutdown)
            .await?;

        tracing::info!("Web server stopped");
        Ok(())
    }

    /// Run the server in the background and return the actual bound address.
    ///
    /// This is useful for testing when binding to port 0.
    pub async fn run_with_addr(self) -> Result<SocketAddr> {
        let (listener, router) = self.bind().await?;
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
