//! User directory
//!
//! Operator accounts stored as one JSON document per user. Passwords are kept
//! as salted SHA-256 digests produced by [`super::credentials`].

use super::credentials::{self, CredentialError, DEFAULT_SALT_BYTES};
use panelguard_core::{ErrorKind, Role};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

const DEFAULT_OWNER_USERNAME: &str = "owner";
const DEFAULT_OWNER_PASSWORD: &str = "password";

/// A stored operator account
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserAccount {
    pub username: String,
    pub hashed_password: String,
    pub salt: String,
    #[serde(default)]
    pub role: Role,
}

impl UserAccount {
    pub fn is_valid(&self) -> bool {
        !self.username.is_empty()
            && !self.hashed_password.is_empty()
            && !self.salt.is_empty()
            && self.role.is_valid()
    }
}

/// User directory errors
#[derive(Debug, thiserror::Error)]
pub enum UserError {
    #[error("Invalid input: {message}")]
    InvalidInput { message: String },

    #[error("User already exists: {0}")]
    AlreadyExists(String),

    #[error("User not found: {0}")]
    NotFound(String),

    #[error("Credential error: {0}")]
    Credential(#[from] CredentialError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl UserError {
    fn invalid<S: Into<String>>(message: S) -> Self {
        Self::InvalidInput {
            message: message.into(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            UserError::InvalidInput { .. } => ErrorKind::InvalidInput,
            UserError::Credential(e) => e.kind(),
            UserError::AlreadyExists(_) => ErrorKind::Conflict,
            UserError::NotFound(_) => ErrorKind::NotFound,
            UserError::Io(_) | UserError::Serialization(_) => ErrorKind::StorageFailure,
        }
    }
}

pub type UserResult<T> = Result<T, UserError>;

/// File-backed collection of operator accounts
pub struct UserDirectory {
    user_dir: PathBuf,
}

impl UserDirectory {
    pub fn new<P: AsRef<Path>>(user_dir: P) -> Self {
        Self {
            user_dir: user_dir.as_ref().to_path_buf(),
        }
    }

    /// Create the directory and, if requested and no account exists yet, the
    /// default owner account. Failure here is fatal to startup.
    pub fn begin(&self, create_default_owner: bool) -> UserResult<()> {
        std::fs::create_dir_all(&self.user_dir)?;

        if create_default_owner && !self.any_user_exists()? {
            warn!(
                username = DEFAULT_OWNER_USERNAME,
                password = DEFAULT_OWNER_PASSWORD,
                "No users found; creating default owner account. CHANGE THIS PASSWORD IMMEDIATELY"
            );
            self.add_user(DEFAULT_OWNER_USERNAME, DEFAULT_OWNER_PASSWORD, Role::Owner)?;
        }

        info!("User directory initialized at: {}", self.user_dir.display());
        Ok(())
    }

    /// Map a username to its document path, neutralising path separators
    fn user_file_path(&self, username: &str) -> UserResult<PathBuf> {
        let clean = username
            .replace('/', "_")
            .replace('\\', "_")
            .replace("..", "_");
        if clean.is_empty() {
            return Err(UserError::invalid("username must not be empty"));
        }
        Ok(self.user_dir.join(format!("{}.json", clean)))
    }

    fn save_user(&self, account: &UserAccount) -> UserResult<()> {
        if !account.is_valid() {
            return Err(UserError::invalid("refusing to save incomplete account"));
        }
        let path = self.user_file_path(&account.username)?;
        let json = serde_json::to_string_pretty(account)?;
        std::fs::write(&path, json)?;
        debug!(username = %account.username, "Saved user account");
        Ok(())
    }

    /// Load a user by name; `Ok(None)` if no such user exists
    pub fn find_user(&self, username: &str) -> UserResult<Option<UserAccount>> {
        let path = self.user_file_path(username)?;
        if !path.exists() {
            return Ok(None);
        }

        let json = std::fs::read_to_string(&path)?;
        let account: UserAccount = serde_json::from_str(&json)?;
        if !account.is_valid() {
            warn!(username, "Stored user account is incomplete; ignoring it");
            return Ok(None);
        }
        Ok(Some(account))
    }

    /// Create a new account with a fresh salt
    pub fn add_user(&self, username: &str, password: &str, role: Role) -> UserResult<UserAccount> {
        if username.is_empty() || password.is_empty() || !role.is_valid() {
            return Err(UserError::invalid(
                "username, password and a known role are required",
            ));
        }
        if self.user_file_path(username)?.exists() {
            return Err(UserError::AlreadyExists(username.to_string()));
        }

        let salt = credentials::generate_salt(DEFAULT_SALT_BYTES)?;
        let account = UserAccount {
            username: username.to_string(),
            hashed_password: credentials::hash_with_salt(password, &salt)?,
            salt,
            role,
        };
        self.save_user(&account)?;
        info!(username, role = %role, "Added user");
        Ok(account)
    }

    pub fn delete_user(&self, username: &str) -> UserResult<()> {
        let path = self.user_file_path(username)?;
        if !path.exists() {
            return Err(UserError::NotFound(username.to_string()));
        }
        std::fs::remove_file(&path)?;
        info!(username, "Deleted user");
        Ok(())
    }

    /// Replace a user's password, rotating the salt
    pub fn update_password(&self, username: &str, new_password: &str) -> UserResult<()> {
        if new_password.is_empty() {
            return Err(UserError::invalid("password must not be empty"));
        }
        let mut account = self
            .find_user(username)?
            .ok_or_else(|| UserError::NotFound(username.to_string()))?;

        account.salt = credentials::generate_salt(DEFAULT_SALT_BYTES)?;
        account.hashed_password = credentials::hash_with_salt(new_password, &account.salt)?;
        self.save_user(&account)?;
        info!(username, "Updated password");
        Ok(())
    }

    pub fn update_role(&self, username: &str, role: Role) -> UserResult<()> {
        if !role.is_valid() {
            return Err(UserError::invalid("cannot assign the unknown role"));
        }
        let mut account = self
            .find_user(username)?
            .ok_or_else(|| UserError::NotFound(username.to_string()))?;

        account.role = role;
        self.save_user(&account)?;
        info!(username, role = %role, "Updated role");
        Ok(())
    }

    /// All valid accounts, sorted by username
    pub fn list_users(&self) -> UserResult<Vec<UserAccount>> {
        let mut users = Vec::new();

        for entry in std::fs::read_dir(&self.user_dir)? {
            let path = entry?.path();
            if path.extension().and_then(|s| s.to_str()) != Some("json") {
                continue;
            }
            let parsed = std::fs::read_to_string(&path)
                .map_err(UserError::from)
                .and_then(|json| serde_json::from_str::<UserAccount>(&json).map_err(UserError::from));
            match parsed {
                Ok(account) if account.is_valid() => users.push(account),
                Ok(_) => warn!("Skipping incomplete user file {}", path.display()),
                Err(e) => warn!("Failed to load user from {}: {}", path.display(), e),
            }
        }

        users.sort_by(|a, b| a.username.cmp(&b.username));
        Ok(users)
    }

    /// Check a login attempt. Returns the account only if the password matches.
    pub fn authenticate(&self, username: &str, password: &str) -> Option<UserAccount> {
        let account = match self.find_user(username) {
            Ok(Some(account)) => account,
            Ok(None) => {
                debug!(username, "Login for unknown user");
                return None;
            }
            Err(e) => {
                warn!(username, error = %e, "Failed to load user during login");
                return None;
            }
        };

        if credentials::verify_secret(password, &account.hashed_password, &account.salt) {
            Some(account)
        } else {
            debug!(username, "Password mismatch");
            None
        }
    }

    fn any_user_exists(&self) -> UserResult<bool> {
        Ok(!self.list_users()?.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn directory() -> (TempDir, UserDirectory) {
        let dir = TempDir::new().unwrap();
        let users = UserDirectory::new(dir.path().join("users"));
        (dir, users)
    }

    #[test]
    fn test_begin_creates_default_owner() {
        let (_dir, users) = directory();
        users.begin(true).unwrap();

        let owner = users.find_user("owner").unwrap().unwrap();
        assert_eq!(owner.role, Role::Owner);
        assert!(users.authenticate("owner", "password").is_some());

        // A second begin must not recreate or duplicate anything
        users.begin(true).unwrap();
        assert_eq!(users.list_users().unwrap().len(), 1);
    }

    #[test]
    fn test_begin_without_default_owner() {
        let (_dir, users) = directory();
        users.begin(false).unwrap();
        assert!(users.list_users().unwrap().is_empty());
    }

    #[test]
    fn test_add_and_authenticate() {
        let (_dir, users) = directory();
        users.begin(false).unwrap();

        users.add_user("alice", "s3cret", Role::Manager).unwrap();
        let account = users.authenticate("alice", "s3cret").unwrap();
        assert_eq!(account.role, Role::Manager);

        assert!(users.authenticate("alice", "wrong").is_none());
        assert!(users.authenticate("bob", "s3cret").is_none());
    }

    #[test]
    fn test_add_user_validation() {
        let (_dir, users) = directory();
        users.begin(false).unwrap();

        assert!(matches!(
            users.add_user("", "pw", Role::Viewer),
            Err(UserError::InvalidInput { .. })
        ));
        assert!(matches!(
            users.add_user("carol", "pw", Role::Unknown),
            Err(UserError::InvalidInput { .. })
        ));

        users.add_user("carol", "pw", Role::Viewer).unwrap();
        let err = users.add_user("carol", "pw2", Role::Viewer).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Conflict);
    }

    #[test]
    fn test_username_is_sanitised() {
        let (dir, users) = directory();
        users.begin(false).unwrap();

        users.add_user("../evil", "pw", Role::Viewer).unwrap();
        assert!(dir.path().join("users").join("__evil.json").exists());
        assert!(!dir.path().join("evil.json").exists());
    }

    #[test]
    fn test_update_password_rotates_salt() {
        let (_dir, users) = directory();
        users.begin(false).unwrap();
        let before = users.add_user("dave", "old", Role::Viewer).unwrap();

        users.update_password("dave", "new").unwrap();
        let after = users.find_user("dave").unwrap().unwrap();

        assert_ne!(before.salt, after.salt);
        assert!(users.authenticate("dave", "new").is_some());
        assert!(users.authenticate("dave", "old").is_none());
    }

    #[test]
    fn test_update_role_and_delete() {
        let (_dir, users) = directory();
        users.begin(false).unwrap();
        users.add_user("erin", "pw", Role::Viewer).unwrap();

        assert!(users.update_role("erin", Role::Unknown).is_err());
        users.update_role("erin", Role::Owner).unwrap();
        assert_eq!(users.find_user("erin").unwrap().unwrap().role, Role::Owner);

        users.delete_user("erin").unwrap();
        assert!(users.find_user("erin").unwrap().is_none());
        assert_eq!(
            users.delete_user("erin").unwrap_err().kind(),
            ErrorKind::NotFound
        );
    }
}
