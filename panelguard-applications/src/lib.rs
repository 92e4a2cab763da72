//! Panelguard Applications - Session and resource-lock coordination
//!
//! This crate holds the coordination core of the control panel:
//!
//! - Credential utilities (tokens, salted hashes, client fingerprints)
//! - The operator account directory
//! - The lock manager and its durable lock store
//! - The session manager, which releases a session's locks whenever it
//!   removes the session
//!
//! ## Architecture
//!
//! - **Core** (panelguard-core): configuration, errors, logging, clock
//! - **Applications** (this crate): the session and lock protocol
//! - **Presentation** (panelguard-web): HTTP handlers and the server binary

pub mod auth;
pub mod locks;
pub mod session;

pub use auth::{CredentialError, UserAccount, UserDirectory, UserError};
pub use locks::{
    LockError, LockManager, LockStatus, LockStore, LockStoreError, LockType, ResourceLock,
};
pub use session::{Session, SessionError, SessionInfo, SessionManager};

use panelguard_core::{Clock, ErrorKind, PanelConfig, PanelError, SystemClock, Timestamp};
use std::sync::Arc;
use tracing::{debug, info};

/// Application-level error type
#[derive(Debug, thiserror::Error)]
pub enum ApplicationError {
    #[error("Core error: {0}")]
    Core(#[from] PanelError),

    #[error("Session error: {0}")]
    Session(#[from] SessionError),

    #[error("Lock error: {0}")]
    Lock(#[from] LockError),

    #[error("User error: {0}")]
    User(#[from] UserError),
}

pub type ApplicationResult<T> = Result<T, ApplicationError>;

impl ApplicationError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ApplicationError::Core(e) => e.kind(),
            ApplicationError::Session(e) => e.kind(),
            ApplicationError::Lock(e) => e.kind(),
            ApplicationError::User(e) => e.kind(),
        }
    }
}

/// Outcome of one pass of both expiry sweeps
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepReport {
    pub sessions_removed: usize,
    pub locks_removed: usize,
}

/// The wired-up coordination core shared by request handlers
pub struct PanelServices {
    clock: Arc<dyn Clock>,
    locks: Arc<LockManager>,
    sessions: Arc<SessionManager>,
    users: Arc<UserDirectory>,
    config: PanelConfig,
}

/// Builder for PanelServices
pub struct PanelServicesBuilder {
    config: PanelConfig,
    clock: Option<Arc<dyn Clock>>,
}

impl PanelServicesBuilder {
    pub fn new(config: PanelConfig) -> Self {
        Self { config, clock: None }
    }

    /// Use a specific clock instead of the process uptime clock
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    /// Validate the configuration and prepare both durable stores.
    ///
    /// Fails if the lock store or the user directory cannot be created.
    pub async fn build(self) -> ApplicationResult<PanelServices> {
        self.config.validate()?;

        let clock = self
            .clock
            .unwrap_or_else(|| Arc::new(SystemClock::new()) as Arc<dyn Clock>);

        let locks = Arc::new(LockManager::new(self.config.locks.clone(), clock.clone()));
        locks.begin().await?;

        let users = Arc::new(UserDirectory::new(&self.config.users.user_dir));
        users.begin(self.config.users.create_default_owner)?;

        let sessions = Arc::new(SessionManager::new(
            self.config.session.clone(),
            locks.clone(),
            clock.clone(),
        ));

        info!(
            session_timeout_ms = self.config.session.timeout_ms,
            lock_timeout_ms = self.config.locks.timeout_ms,
            "Panel services ready"
        );

        Ok(PanelServices {
            clock,
            locks,
            sessions,
            users,
            config: self.config,
        })
    }
}

impl PanelServices {
    pub fn builder(config: PanelConfig) -> PanelServicesBuilder {
        PanelServicesBuilder::new(config)
    }

    pub async fn new(config: PanelConfig) -> ApplicationResult<Self> {
        PanelServicesBuilder::new(config).build().await
    }

    pub fn now(&self) -> Timestamp {
        self.clock.now_ms()
    }

    pub fn locks(&self) -> &Arc<LockManager> {
        &self.locks
    }

    pub fn sessions(&self) -> &Arc<SessionManager> {
        &self.sessions
    }

    pub fn users(&self) -> &Arc<UserDirectory> {
        &self.users
    }

    pub fn config(&self) -> &PanelConfig {
        &self.config
    }

    /// Run both expiry sweeps at `now`. Sessions go first so their locks are
    /// released through the cascade rather than by lock expiry.
    pub async fn run_sweeps(&self, now: Timestamp) -> SweepReport {
        let report = SweepReport {
            sessions_removed: self.sessions.cleanup_expired_sessions(now).await,
            locks_removed: self.locks.cleanup_expired_locks(now).await,
        };
        if report != SweepReport::default() {
            debug!(
                sessions = report.sessions_removed,
                locks = report.locks_removed,
                "Sweep pass removed entries"
            );
        }
        report
    }
}
