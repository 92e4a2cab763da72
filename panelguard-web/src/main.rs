//! Panelguard Web Server
//!
//! Session and resource-lock coordination for the control panel.

use clap::Parser;
use panelguard_core::{init_logging, PanelConfig};
use panelguard_web::server::PanelServerBuilder;
use panelguard_web::WebConfig;
use std::path::PathBuf;
use tracing::{error, info};

/// Panelguard Web Server - operator sessions and edit locks for the control panel
#[derive(Parser)]
#[command(name = "panelguard-web")]
#[command(about = "Session and resource-lock server for the control panel")]
#[command(version)]
struct Args {
    /// TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Server host to bind to
    #[arg(long)]
    host: Option<String>,

    /// Server port to listen on
    #[arg(short, long)]
    port: Option<u16>,

    /// Directory holding the lock store and user accounts
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long)]
    log_level: Option<String>,
}

impl Args {
    /// Layer command line flags over file and environment settings
    fn apply(&self, mut config: WebConfig) -> WebConfig {
        if let Some(host) = &self.host {
            config.panel.server.host = host.clone();
        }
        if let Some(port) = self.port {
            config.panel.server.port = port;
        }
        if let Some(dir) = &self.data_dir {
            config.panel = config.panel.with_data_dir(dir);
        }
        if let Some(level) = &self.log_level {
            config.panel.logging.set_level(level);
        }
        config
    }
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    // Load environment variables
    dotenvy::dotenv().ok();

    let panel = match &args.config {
        Some(path) => match PanelConfig::from_file(path) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("Failed to load config {}: {}", path.display(), e);
                std::process::exit(1);
            }
        },
        None => PanelConfig::default(),
    };
    let config = args.apply(WebConfig::new(panel).with_env_overrides());

    if let Err(e) = init_logging(&config.panel.logging) {
        eprintln!("Failed to initialize logging: {}", e);
        std::process::exit(1);
    }

    info!(
        address = %config.address(),
        lock_store = %config.panel.locks.store_path.display(),
        user_dir = %config.panel.users.user_dir.display(),
        "Starting panelguard"
    );

    let server = match PanelServerBuilder::new().config(config).build().await {
        Ok(server) => server,
        Err(e) => {
            error!("Failed to build server: {}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = server.start().await {
        error!("Server failed: {}", e);
        std::process::exit(1);
    }
}
