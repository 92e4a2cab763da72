//! Session Types and Structures

use panelguard_core::{Role, Timestamp};
use serde::{Deserialize, Serialize};

/// Server-side record binding a token to an authenticated operator
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    /// 64 hex characters, also the table key and cookie value
    pub session_id: String,
    pub username: String,
    pub role: Role,
    pub creation_time: Timestamp,
    /// Refreshed on every successful validation
    pub last_heartbeat: Timestamp,
    /// Hash of the client address and user agent at login
    pub fingerprint: String,
}

impl Session {
    pub fn is_valid(&self) -> bool {
        !self.session_id.is_empty()
            && !self.username.is_empty()
            && !self.fingerprint.is_empty()
            && self.role.is_valid()
    }

    /// Whether the session has been idle for longer than `timeout_ms`
    pub fn is_expired(&self, now: Timestamp, timeout_ms: u64) -> bool {
        self.idle_ms(now) > timeout_ms
    }

    pub fn idle_ms(&self, now: Timestamp) -> u64 {
        now.saturating_sub(self.last_heartbeat)
    }
}

/// Diagnostic view of a session that omits the token and fingerprint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionInfo {
    pub username: String,
    pub role: Role,
    pub creation_time: Timestamp,
    pub last_heartbeat: Timestamp,
}

impl From<&Session> for SessionInfo {
    fn from(session: &Session) -> Self {
        Self {
            username: session.username.clone(),
            role: session.role,
            creation_time: session.creation_time,
            last_heartbeat: session.last_heartbeat,
        }
    }
}
