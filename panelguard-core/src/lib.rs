//! Panelguard Core - Shared types, configuration and infrastructure
//!
//! This crate holds the pieces every other panelguard crate depends on: the
//! error type, configuration, logging setup, the role hierarchy and the clock.

pub mod config;
pub mod error;
pub mod logging;
pub mod traits;
pub mod types;

pub use config::*;
pub use error::*;
pub use logging::*;
pub use traits::*;
pub use types::*;

// Re-export commonly used external types
pub use tracing;
