//! Lock Types and Structures

use panelguard_core::Timestamp;
use serde::{Deserialize, Serialize};

/// Why a resource is being locked. Informational only: any lock excludes
/// every other lock on the same resource regardless of type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LockType {
    /// An operator is editing a schedule
    EditingSchedule,
    /// An operator is editing a cycle template
    EditingTemplate,
}

impl LockType {
    pub fn as_str(&self) -> &'static str {
        match self {
            LockType::EditingSchedule => "editing_schedule",
            LockType::EditingTemplate => "editing_template",
        }
    }
}

impl std::fmt::Display for LockType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for LockType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "editing_schedule" => Ok(LockType::EditingSchedule),
            "editing_template" => Ok(LockType::EditingTemplate),
            _ => Err(format!("Unknown lock type: {}", s)),
        }
    }
}

/// An exclusive claim on a named resource, owned by a session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceLock {
    /// Caller-defined resource key, e.g. `schedule_abc`
    pub resource_id: String,
    pub lock_type: LockType,
    /// Token of the owning session
    pub session_id: String,
    /// Display copy of the owner's username
    pub username: String,
    /// Last acquire or renew time
    pub timestamp: Timestamp,
}

impl ResourceLock {
    pub fn is_valid(&self) -> bool {
        !self.resource_id.is_empty() && !self.session_id.is_empty()
    }

    pub fn is_owned_by(&self, session_id: &str) -> bool {
        self.session_id == session_id
    }

    /// Whether more than `timeout_ms` has passed since the last renewal
    pub fn is_expired(&self, now: Timestamp, timeout_ms: u64) -> bool {
        now.saturating_sub(self.timestamp) > timeout_ms
    }
}

/// Result of a lock lookup that distinguishes "free" from "could not tell"
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LockStatus {
    Free,
    Held(ResourceLock),
    /// The lock store could not be read
    Unknown,
}
