//! Shared application state

use crate::{WebConfig, WebResult};
use panelguard_applications::PanelServices;
use panelguard_core::Clock;
use std::sync::Arc;
use tracing::info;

/// State handed to every handler
#[derive(Clone)]
pub struct AppState {
    pub services: Arc<PanelServices>,
}

impl AppState {
    /// Build the coordination core from configuration using the system clock
    pub async fn new(config: WebConfig) -> WebResult<Self> {
        let services = PanelServices::new(config.panel).await?;
        info!("Application state initialized");
        Ok(Self::from_services(Arc::new(services)))
    }

    /// Build the coordination core with a caller-supplied clock
    pub async fn with_clock(config: WebConfig, clock: Arc<dyn Clock>) -> WebResult<Self> {
        let services = PanelServices::builder(config.panel)
            .with_clock(clock)
            .build()
            .await?;
        Ok(Self::from_services(Arc::new(services)))
    }

    pub fn from_services(services: Arc<PanelServices>) -> Self {
        Self { services }
    }

    /// Whether cookies must carry the `Secure` attribute
    pub fn https_only(&self) -> bool {
        self.services.config().server.https_only
    }

    pub fn cookie_max_age_secs(&self) -> u64 {
        self.services.config().session.cookie_max_age_secs
    }
}
