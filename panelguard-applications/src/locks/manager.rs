//! Lock Manager - Exclusive resource claims owned by sessions
//!
//! Every operation is a full load, transform and full save of the lock
//! store, performed while holding the manager's mutex so that two overlapping
//! calls can never both observe a resource as free.

use super::{LockStatus, LockStore, LockStoreError, LockType, ResourceLock};
use crate::session::Session;
use panelguard_core::{token_prefix, Clock, ErrorKind, LockSettings, Timestamp};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

/// Lock manager errors
#[derive(Debug, thiserror::Error)]
pub enum LockError {
    #[error("Invalid input: {message}")]
    InvalidInput { message: String },

    #[error("Resource {resource_id} is busy, held by {holder}")]
    Conflict { resource_id: String, holder: String },

    #[error("Lock not found or not owned: {resource_id}")]
    NotFound { resource_id: String },

    #[error("Lock storage error: {0}")]
    Storage(#[from] LockStoreError),
}

impl LockError {
    fn invalid<S: Into<String>>(message: S) -> Self {
        Self::InvalidInput {
            message: message.into(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            LockError::InvalidInput { .. } => ErrorKind::InvalidInput,
            LockError::Conflict { .. } => ErrorKind::Conflict,
            LockError::NotFound { .. } => ErrorKind::NotFound,
            LockError::Storage(_) => ErrorKind::StorageFailure,
        }
    }
}

pub type LockResult<T> = Result<T, LockError>;

struct LockState {
    store: LockStore,
    last_cleanup: Timestamp,
}

/// Coordinates exclusive access to named resources
pub struct LockManager {
    state: Mutex<LockState>,
    settings: LockSettings,
    clock: Arc<dyn Clock>,
}

impl LockManager {
    pub fn new(settings: LockSettings, clock: Arc<dyn Clock>) -> Self {
        let state = LockState {
            store: LockStore::new(&settings.store_path),
            last_cleanup: clock.now_ms(),
        };
        Self {
            state: Mutex::new(state),
            settings,
            clock,
        }
    }

    /// Prepare the backing store. A failure here should abort startup.
    ///
    /// Sessions do not survive a restart, so any lock left in the store
    /// belongs to a session nobody can log out of. Those locks are dropped.
    /// Returns how many were dropped.
    pub async fn begin(&self) -> LockResult<usize> {
        let state = self.state.lock().await;
        state.store.initialize()?;

        let orphaned = match state.store.load_all() {
            Ok(locks) => locks.len(),
            Err(e) => {
                warn!(error = %e, "Lock store unreadable at startup, leaving it untouched");
                0
            }
        };
        if orphaned > 0 {
            state.store.save_all(&[])?;
            info!(dropped = orphaned, "Dropped locks left by a previous run");
        }

        if self.settings.expiry_enabled() {
            info!(
                timeout_ms = self.settings.timeout_ms,
                "Lock manager initialized at {}",
                state.store.path().display()
            );
        } else {
            info!(
                "Lock manager initialized at {} (lock expiry disabled)",
                state.store.path().display()
            );
        }
        Ok(orphaned)
    }

    /// Acquire or renew a lock on `resource_id` for `owner`.
    ///
    /// Re-acquiring a lock the session already holds replaces the entry with
    /// a fresh timestamp. A lock held by any other session is a conflict.
    pub async fn try_acquire_lock(
        &self,
        resource_id: &str,
        lock_type: LockType,
        owner: &Session,
    ) -> LockResult<ResourceLock> {
        if resource_id.is_empty() {
            return Err(LockError::invalid("resource id must not be empty"));
        }
        if !owner.is_valid() {
            return Err(LockError::invalid("owner session is not valid"));
        }

        let state = self.state.lock().await;
        let mut locks = state.store.load_all()?;

        if let Some(existing) = locks.iter().find(|l| l.resource_id == resource_id) {
            if !existing.is_owned_by(&owner.session_id) {
                let holder = existing.username.clone();
                debug!(resource_id, holder = %holder, "Lock request refused, resource busy");
                return Err(LockError::Conflict {
                    resource_id: resource_id.to_string(),
                    holder,
                });
            }
            locks.retain(|l| !(l.resource_id == resource_id && l.is_owned_by(&owner.session_id)));
            debug!(resource_id, "Renewing lock");
        }

        let lock = ResourceLock {
            resource_id: resource_id.to_string(),
            lock_type,
            session_id: owner.session_id.clone(),
            username: owner.username.clone(),
            timestamp: self.clock.now_ms(),
        };
        if !lock.is_valid() {
            return Err(LockError::invalid("constructed lock is not valid"));
        }
        locks.push(lock.clone());
        state.store.save_all(&locks)?;

        info!(
            resource_id,
            lock_type = %lock_type,
            username = %owner.username,
            session_id = token_prefix(&owner.session_id),
            "Lock acquired"
        );
        Ok(lock)
    }

    /// Boolean form of [`Self::try_acquire_lock`]; `false` means busy or failed
    pub async fn acquire_lock(&self, resource_id: &str, lock_type: LockType, owner: &Session) -> bool {
        match self.try_acquire_lock(resource_id, lock_type, owner).await {
            Ok(_) => true,
            Err(LockError::Conflict { .. }) => false,
            Err(e) => {
                warn!(resource_id, error = %e, "Failed to acquire lock");
                false
            }
        }
    }

    /// Release a lock held by `session_id`. A missing lock and a lock held by
    /// someone else are reported the same way.
    pub async fn try_release_lock(&self, resource_id: &str, session_id: &str) -> LockResult<()> {
        let state = self.state.lock().await;
        let mut locks = state.store.load_all()?;

        let before = locks.len();
        locks.retain(|l| !(l.resource_id == resource_id && l.is_owned_by(session_id)));
        if locks.len() == before {
            return Err(LockError::NotFound {
                resource_id: resource_id.to_string(),
            });
        }

        state.store.save_all(&locks)?;
        info!(
            resource_id,
            session_id = token_prefix(session_id),
            "Lock released"
        );
        Ok(())
    }

    pub async fn release_lock(&self, resource_id: &str, session_id: &str) -> bool {
        match self.try_release_lock(resource_id, session_id).await {
            Ok(()) => true,
            Err(LockError::NotFound { .. }) => false,
            Err(e) => {
                warn!(resource_id, error = %e, "Failed to release lock");
                false
            }
        }
    }

    /// Drop every lock owned by `session_id`.
    ///
    /// Returns the number of entries removed from the working copy, even when
    /// persisting the result fails.
    pub async fn release_locks_for_session(&self, session_id: &str) -> usize {
        let state = self.state.lock().await;
        let mut locks = match state.store.load_all() {
            Ok(locks) => locks,
            Err(e) => {
                warn!(
                    session_id = token_prefix(session_id),
                    error = %e,
                    "Could not load locks to release for session"
                );
                return 0;
            }
        };

        let before = locks.len();
        locks.retain(|l| !l.is_owned_by(session_id));
        let released = before - locks.len();

        if released > 0 {
            if let Err(e) = state.store.save_all(&locks) {
                warn!(
                    session_id = token_prefix(session_id),
                    released,
                    error = %e,
                    "Failed to persist released locks"
                );
            } else {
                info!(
                    session_id = token_prefix(session_id),
                    released, "Released locks for session"
                );
            }
        }

        released
    }

    /// Look up the lock on a resource. An unreadable store reads as unlocked;
    /// use [`Self::lock_status`] where that distinction matters.
    pub async fn is_locked(&self, resource_id: &str) -> Option<ResourceLock> {
        match self.lock_status(resource_id).await {
            LockStatus::Held(lock) => Some(lock),
            LockStatus::Free | LockStatus::Unknown => None,
        }
    }

    pub async fn get_lock_info(&self, resource_id: &str) -> Option<ResourceLock> {
        self.is_locked(resource_id).await
    }

    /// Look up the lock on a resource, reporting an unreadable store as
    /// [`LockStatus::Unknown`]
    pub async fn lock_status(&self, resource_id: &str) -> LockStatus {
        let state = self.state.lock().await;
        match state.store.load_all() {
            Ok(locks) => locks
                .into_iter()
                .find(|l| l.resource_id == resource_id)
                .map(LockStatus::Held)
                .unwrap_or(LockStatus::Free),
            Err(e) => {
                warn!(resource_id, error = %e, "Lock store unreadable during lookup");
                LockStatus::Unknown
            }
        }
    }

    /// Snapshot of every lock in the store
    pub async fn list_locks(&self) -> LockResult<Vec<ResourceLock>> {
        let state = self.state.lock().await;
        Ok(state.store.load_all()?)
    }

    /// Remove locks not renewed within the configured timeout.
    ///
    /// Does nothing when expiry is disabled or the previous sweep ran less
    /// than one cleanup interval ago. The interval restarts even if the store
    /// cannot be read. Returns the number of locks removed.
    pub async fn cleanup_expired_locks(&self, now: Timestamp) -> usize {
        if !self.settings.expiry_enabled() {
            return 0;
        }

        let mut state = self.state.lock().await;
        if now.saturating_sub(state.last_cleanup) < self.settings.cleanup_interval_ms {
            return 0;
        }
        state.last_cleanup = now;

        let mut locks = match state.store.load_all() {
            Ok(locks) => locks,
            Err(e) => {
                warn!(error = %e, "Skipping lock sweep, store unreadable");
                return 0;
            }
        };

        let timeout_ms = self.settings.timeout_ms as u64;
        let before = locks.len();
        locks.retain(|l| {
            let expired = l.is_expired(now, timeout_ms);
            if expired {
                info!(
                    resource_id = %l.resource_id,
                    username = %l.username,
                    "Expiring stale lock"
                );
            }
            !expired
        });
        let removed = before - locks.len();

        if removed > 0 {
            if let Err(e) = state.store.save_all(&locks) {
                warn!(error = %e, "Failed to persist lock sweep");
            }
        }

        removed
    }
}
