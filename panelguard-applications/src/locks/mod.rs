//! Resource Locks
//!
//! Exclusive, session-owned claims on named resources, persisted in a single
//! JSON document.

pub mod manager;
pub mod storage;
pub mod types;

pub use manager::{LockError, LockManager, LockResult};
pub use storage::{LockStore, LockStoreError, LockStoreResult};
pub use types::{LockStatus, LockType, ResourceLock};
