//! Session Management Module
//!
//! In-memory operator sessions with sliding expiry and client fingerprint
//! binding. Removing a session always releases the resource locks it holds.

pub mod cookie;
pub mod manager;
pub mod types;

pub use cookie::{
    cleared_session_cookie, extract_session_token, session_cookie, SESSION_COOKIE_NAME,
};
pub use manager::{SessionError, SessionManager, SessionResult};
pub use types::{Session, SessionInfo};
