//! Session Manager - Issuance, validation and removal of operator sessions
//!
//! The session table lives behind a single `RwLock`. Every path that removes
//! a session goes through [`SessionManager::remove_session`], which releases
//! the session's resource locks before dropping the table entry. The table
//! lock is always taken before the lock manager's own mutex, never after.

use super::cookie::extract_session_token;
use super::{Session, SessionInfo};
use crate::auth::{credentials, CredentialError};
use crate::locks::LockManager;
use panelguard_core::{token_prefix, Clock, ErrorKind, Role, SessionSettings, Timestamp};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

/// Session errors
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("Failed to generate session token: {0}")]
    TokenGenFailed(#[from] CredentialError),

    #[error("Session data is invalid")]
    InvalidData,

    #[error("No session cookie supplied")]
    NoCookie,

    #[error("Session not found")]
    NotFound,

    #[error("Session expired")]
    Expired,

    #[error("Session fingerprint mismatch")]
    FingerprintMismatch,
}

impl SessionError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            SessionError::TokenGenFailed(_) => ErrorKind::Internal,
            SessionError::InvalidData | SessionError::NoCookie => ErrorKind::InvalidInput,
            SessionError::NotFound | SessionError::Expired => ErrorKind::NotFound,
            SessionError::FingerprintMismatch => ErrorKind::SecurityViolation,
        }
    }
}

pub type SessionResult<T> = Result<T, SessionError>;

/// Why a session is being removed; only used for logging
#[derive(Debug, Clone, Copy)]
enum RemovalReason {
    Expired,
    FingerprintMismatch,
    Logout,
    Sweep,
}

impl RemovalReason {
    fn as_str(&self) -> &'static str {
        match self {
            RemovalReason::Expired => "expired",
            RemovalReason::FingerprintMismatch => "fingerprint_mismatch",
            RemovalReason::Logout => "logout",
            RemovalReason::Sweep => "sweep",
        }
    }
}

struct SessionTable {
    sessions: HashMap<String, Session>,
    last_cleanup: Timestamp,
}

/// Owns the active session table
pub struct SessionManager {
    table: RwLock<SessionTable>,
    settings: SessionSettings,
    locks: Arc<LockManager>,
    clock: Arc<dyn Clock>,
}

impl SessionManager {
    pub fn new(settings: SessionSettings, locks: Arc<LockManager>, clock: Arc<dyn Clock>) -> Self {
        let table = SessionTable {
            sessions: HashMap::new(),
            last_cleanup: clock.now_ms(),
        };
        Self {
            table: RwLock::new(table),
            settings,
            locks,
            clock,
        }
    }

    /// Start a session for an authenticated operator
    pub async fn create_session(
        &self,
        username: &str,
        role: Role,
        client_address: &str,
        user_agent: &str,
    ) -> SessionResult<Session> {
        let token = credentials::generate_token()?;

        let now = self.clock.now_ms();
        let session = Session {
            session_id: token,
            username: username.to_string(),
            role,
            creation_time: now,
            last_heartbeat: now,
            fingerprint: credentials::fingerprint(client_address, user_agent),
        };
        if !session.is_valid() {
            debug!(username, role = %role, "Refusing to create invalid session");
            return Err(SessionError::InvalidData);
        }

        let mut table = self.table.write().await;
        table
            .sessions
            .insert(session.session_id.clone(), session.clone());

        info!(
            username,
            role = %role,
            session_id = token_prefix(&session.session_id),
            active = table.sessions.len(),
            "Session created"
        );
        Ok(session)
    }

    /// Validate the session named by a raw `Cookie` header and refresh its
    /// heartbeat. Expired and fingerprint-mismatched sessions are removed.
    pub async fn validate_session(
        &self,
        cookie_header: &str,
        client_address: &str,
        user_agent: &str,
    ) -> SessionResult<Session> {
        let token = extract_session_token(cookie_header).ok_or(SessionError::NoCookie)?;
        self.validate_token(token, client_address, user_agent).await
    }

    /// Validate a bare session token
    pub async fn validate_token(
        &self,
        token: &str,
        client_address: &str,
        user_agent: &str,
    ) -> SessionResult<Session> {
        let now = self.clock.now_ms();
        let mut table = self.table.write().await;

        let (expired, fingerprint_matches) = match table.sessions.get(token) {
            Some(session) => (
                session.is_expired(now, self.settings.timeout_ms),
                session.fingerprint == credentials::fingerprint(client_address, user_agent),
            ),
            None => return Err(SessionError::NotFound),
        };

        if expired {
            self.remove_session(&mut table, token, RemovalReason::Expired)
                .await;
            return Err(SessionError::Expired);
        }

        if !fingerprint_matches {
            warn!(
                session_id = token_prefix(token),
                client_address, "Session presented from a different client, revoking"
            );
            self.remove_session(&mut table, token, RemovalReason::FingerprintMismatch)
                .await;
            return Err(SessionError::FingerprintMismatch);
        }

        let session = table
            .sessions
            .get_mut(token)
            .ok_or(SessionError::NotFound)?;
        session.last_heartbeat = now;
        Ok(session.clone())
    }

    /// Log out the session with this token. Returns whether one was removed.
    pub async fn invalidate_session(&self, token: &str) -> bool {
        let mut table = self.table.write().await;
        self.remove_session(&mut table, token, RemovalReason::Logout)
            .await
    }

    /// Log out the session named by a raw `Cookie` header
    pub async fn invalidate_session_cookie(&self, cookie_header: &str) -> bool {
        match extract_session_token(cookie_header) {
            Some(token) => self.invalidate_session(token).await,
            None => false,
        }
    }

    /// Remove every session idle for longer than the timeout.
    ///
    /// Runs at most once per cleanup interval. Returns the number of sessions
    /// removed.
    pub async fn cleanup_expired_sessions(&self, now: Timestamp) -> usize {
        let mut table = self.table.write().await;
        if now.saturating_sub(table.last_cleanup) < self.settings.cleanup_interval_ms {
            return 0;
        }
        table.last_cleanup = now;

        let expired: Vec<String> = table
            .sessions
            .values()
            .filter(|s| s.is_expired(now, self.settings.timeout_ms))
            .map(|s| s.session_id.clone())
            .collect();

        let mut removed = 0;
        for token in &expired {
            if self
                .remove_session(&mut table, token, RemovalReason::Sweep)
                .await
            {
                removed += 1;
            }
        }

        if removed > 0 {
            info!(removed, active = table.sessions.len(), "Session sweep finished");
        }
        removed
    }

    pub async fn active_count(&self) -> usize {
        self.table.read().await.sessions.len()
    }

    /// Look up a session without refreshing its heartbeat
    pub async fn session_info(&self, token: &str) -> Option<SessionInfo> {
        self.table
            .read()
            .await
            .sessions
            .get(token)
            .map(SessionInfo::from)
    }

    /// The single removal path: release the session's locks, then drop it
    async fn remove_session(
        &self,
        table: &mut SessionTable,
        token: &str,
        reason: RemovalReason,
    ) -> bool {
        if !table.sessions.contains_key(token) {
            return false;
        }

        let released = self.locks.release_locks_for_session(token).await;
        let removed = table.sessions.remove(token);

        if let Some(session) = removed {
            info!(
                username = %session.username,
                session_id = token_prefix(token),
                reason = reason.as_str(),
                released_locks = released,
                "Session removed"
            );
        }
        true
    }
}
