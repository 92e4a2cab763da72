//! Panelguard Web Server
//!
//! Main web server implementation using Axum.

use crate::{create_app, AppState, WebConfig, WebError, WebResult};
use axum::serve;
use panelguard_applications::PanelServices;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tracing::{error, info};

/// Main panelguard web server
pub struct PanelServer {
    config: WebConfig,
    state: AppState,
}

impl PanelServer {
    /// Create a new server, preparing the lock store and user directory
    pub async fn new(config: WebConfig) -> WebResult<Self> {
        let state = AppState::new(config.clone()).await?;
        Ok(Self { config, state })
    }

    /// Start the web server
    pub async fn start(self) -> WebResult<()> {
        let address = self.config.address();

        info!("Starting panelguard web server");
        info!("Server address: http://{}", address);
        if !self.config.panel.server.https_only {
            info!("Session cookies are issued without the Secure attribute");
        }

        let app = create_app(self.state.clone());

        let listener = TcpListener::bind(&address)
            .await
            .map_err(WebError::Server)?;

        info!("Server listening on http://{}", address);

        let sweeper = spawn_sweep_task(self.state.services.clone(), self.config.sweep_tick);

        let result = serve(
            listener,
            app.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .with_graceful_shutdown(shutdown_signal())
        .await;

        sweeper.abort();

        if let Err(e) = result {
            error!("Server error: {}", e);
            return Err(WebError::Server(e));
        }

        info!("Server shut down");
        Ok(())
    }

    /// Get server configuration
    pub fn config(&self) -> &WebConfig {
        &self.config
    }

    /// Get application state
    pub fn state(&self) -> &AppState {
        &self.state
    }
}

/// Offer both expiry sweeps on every tick. The managers' own throttles
/// decide whether a sweep actually runs.
pub fn spawn_sweep_task(services: Arc<PanelServices>, tick: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(tick);
        loop {
            interval.tick().await;
            services.run_sweeps(services.now()).await;
        }
    })
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}

/// Builder for PanelServer
pub struct PanelServerBuilder {
    config: WebConfig,
}

impl PanelServerBuilder {
    /// Create a new server builder
    pub fn new() -> Self {
        Self {
            config: WebConfig::default(),
        }
    }

    /// Start from an existing configuration
    pub fn config(mut self, config: WebConfig) -> Self {
        self.config = config;
        self
    }

    /// Set the server host
    pub fn host<S: Into<String>>(mut self, host: S) -> Self {
        self.config.panel.server.host = host.into();
        self
    }

    /// Set the server port
    pub fn port(mut self, port: u16) -> Self {
        self.config.panel.server.port = port;
        self
    }

    /// Keep the lock store and user accounts under `data_dir`
    pub fn data_dir<P: Into<std::path::PathBuf>>(mut self, data_dir: P) -> Self {
        self.config.panel = self.config.panel.with_data_dir(data_dir.into());
        self
    }

    /// Build the server
    pub async fn build(self) -> WebResult<PanelServer> {
        PanelServer::new(self.config).await
    }
}

impl Default for PanelServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}
