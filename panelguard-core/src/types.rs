//! Core data type definitions

use serde::{Deserialize, Serialize};

/// Milliseconds on the device's monotonic uptime clock
pub type Timestamp = u64;

/// Privilege level of an operator.
///
/// Variants are declared in ascending order so the derived `Ord` gives the
/// privilege hierarchy, with `Unknown` as the bottom value.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Invalid or uninitialised role; never grants anything
    #[default]
    Unknown,
    /// Can view state but not change it
    Viewer,
    /// Can edit schedules and take edit locks
    Manager,
    /// Full administrative privileges
    Owner,
}

impl Role {
    /// Whether this role is a real role rather than the bottom value
    pub fn is_valid(&self) -> bool {
        *self != Role::Unknown
    }

    /// Whether this role meets the given minimum level
    pub fn at_least(&self, minimum: Role) -> bool {
        self.is_valid() && *self >= minimum
    }

    /// Whether this role falls short of the given minimum level
    pub fn is_insufficient_for(&self, minimum: Role) -> bool {
        !self.at_least(minimum)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Unknown => "unknown",
            Role::Viewer => "viewer",
            Role::Manager => "manager",
            Role::Owner => "owner",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Role {
    type Err = std::convert::Infallible;

    /// Unrecognised strings parse to `Role::Unknown`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.to_lowercase().as_str() {
            "viewer" => Role::Viewer,
            "manager" => Role::Manager,
            "owner" => Role::Owner,
            _ => Role::Unknown,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_ordering() {
        assert!(Role::Unknown < Role::Viewer);
        assert!(Role::Viewer < Role::Manager);
        assert!(Role::Manager < Role::Owner);
    }

    #[test]
    fn test_role_privilege_checks() {
        assert!(Role::Owner.at_least(Role::Manager));
        assert!(Role::Manager.at_least(Role::Manager));
        assert!(Role::Viewer.is_insufficient_for(Role::Manager));
        assert!(!Role::Unknown.at_least(Role::Unknown));
        assert!(Role::Unknown.is_insufficient_for(Role::Viewer));
    }

    #[test]
    fn test_role_parsing() {
        assert_eq!("OWNER".parse::<Role>().unwrap(), Role::Owner);
        assert_eq!("Manager".parse::<Role>().unwrap(), Role::Manager);
        assert_eq!("viewer".parse::<Role>().unwrap(), Role::Viewer);
        assert_eq!("root".parse::<Role>().unwrap(), Role::Unknown);
        assert_eq!(Role::Manager.to_string(), "manager");
    }

    #[test]
    fn test_role_serde() {
        let json = serde_json::to_string(&Role::Owner).unwrap();
        assert_eq!(json, "\"owner\"");
        let role: Role = serde_json::from_str("\"viewer\"").unwrap();
        assert_eq!(role, Role::Viewer);
    }
}
