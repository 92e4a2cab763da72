//! Authentication Module
//!
//! Credential primitives and the operator account directory.

pub mod credentials;
pub mod users;

pub use credentials::{
    fingerprint, generate_salt, generate_token, hash_with_salt, verify_secret, CredentialError,
    CredentialResult,
};
pub use users::{UserAccount, UserDirectory, UserError, UserResult};
