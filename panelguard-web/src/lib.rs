//! Panelguard Web Server
//!
//! HTTP front end for the session and lock core: login and logout, the
//! current-user endpoint, and lock acquire/release/status for editors.

pub mod auth;
pub mod handlers;
pub mod routes;
pub mod server;
pub mod state;

// Re-export main types
pub use server::{PanelServer, PanelServerBuilder};
pub use state::AppState;

use axum::{extract::DefaultBodyLimit, Router};
use panelguard_core::PanelConfig;
use std::path::PathBuf;
use std::time::Duration;
use tower_http::trace::TraceLayer;
use tracing::warn;

/// Create the main application router
pub fn create_app(state: AppState) -> Router {
    Router::new()
        .nest("/api", routes::api_routes())
        .layer(TraceLayer::new_for_http())
        .layer(DefaultBodyLimit::max(64 * 1024))
        .with_state(state)
}

/// Configuration for the web server
#[derive(Debug, Clone)]
pub struct WebConfig {
    /// Core settings, including the listen address
    pub panel: PanelConfig,
    /// How often the background task offers both managers a sweep
    pub sweep_tick: Duration,
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            panel: PanelConfig::default(),
            sweep_tick: Duration::from_secs(1),
        }
    }
}

impl WebConfig {
    pub fn new(panel: PanelConfig) -> Self {
        Self {
            panel,
            ..Self::default()
        }
    }

    /// Apply `PANELGUARD_*` environment variables. Unparsable values are
    /// ignored with a warning.
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(host) = std::env::var("PANELGUARD_HOST") {
            self.panel.server.host = host;
        }
        if let Ok(port) = std::env::var("PANELGUARD_PORT") {
            match port.parse() {
                Ok(port) => self.panel.server.port = port,
                Err(_) => warn!(value = %port, "Ignoring invalid PANELGUARD_PORT"),
            }
        }
        if let Ok(dir) = std::env::var("PANELGUARD_DATA_DIR") {
            self.panel = self.panel.with_data_dir(PathBuf::from(dir));
        }
        if let Ok(flag) = std::env::var("PANELGUARD_HTTPS_ONLY") {
            match flag.parse() {
                Ok(flag) => self.panel.server.https_only = flag,
                Err(_) => warn!(value = %flag, "Ignoring invalid PANELGUARD_HTTPS_ONLY"),
            }
        }
        self
    }

    /// Get the server address
    pub fn address(&self) -> String {
        self.panel.server.address()
    }
}

/// Error types for the web server
#[derive(thiserror::Error, Debug)]
pub enum WebError {
    #[error("Server error: {0}")]
    Server(#[from] std::io::Error),

    #[error("Startup error: {0}")]
    Startup(#[from] panelguard_applications::ApplicationError),}

/// Result type for web operations
pub type WebResult<T> = Result<T, WebError>;
