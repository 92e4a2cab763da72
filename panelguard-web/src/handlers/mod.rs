//! HTTP request handlers for the panelguard web server

pub mod health;
pub mod locks;
pub mod session;
pub mod types;

pub use health::*;
pub use locks::*;
pub use session::*;

pub use types::*;
