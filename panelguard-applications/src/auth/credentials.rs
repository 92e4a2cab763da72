//! Credential utilities
//!
//! Token generation, salted secret hashing and client fingerprinting. All
//! functions here are stateless.

use panelguard_core::ErrorKind;
use rand::rngs::OsRng;
use rand::RngCore;
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

/// Random bytes behind every session token (256 bits)
pub const TOKEN_BYTES: usize = 32;

/// Default salt length in bytes
pub const DEFAULT_SALT_BYTES: usize = 16;

/// Credential utility errors
#[derive(Debug, thiserror::Error)]
pub enum CredentialError {
    #[error("Secure random source unavailable: {0}")]
    RandomSource(#[from] rand::Error),

    #[error("Salt is not valid hex: {0}")]
    InvalidSalt(#[from] hex::FromHexError),

    #[error("Salt must not be empty")]
    EmptySalt,
}

impl CredentialError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            CredentialError::RandomSource(_) => ErrorKind::Internal,
            CredentialError::InvalidSalt(_) | CredentialError::EmptySalt => {
                ErrorKind::InvalidInput
            }
        }
    }
}

pub type CredentialResult<T> = Result<T, CredentialError>;

/// Fill `len` bytes from the OS random source and hex-encode them
fn random_hex(len: usize) -> CredentialResult<String> {
    let mut bytes = vec![0u8; len];
    OsRng.try_fill_bytes(&mut bytes)?;
    Ok(hex::encode(bytes))
}

/// Generate a session token: 32 random bytes, 64 lowercase hex characters.
///
/// An error means the random source failed; callers must not fall back to
/// a weaker token.
pub fn generate_token() -> CredentialResult<String> {
    random_hex(TOKEN_BYTES)
}

/// Generate a hex-encoded random salt of `len` bytes
pub fn generate_salt(len: usize) -> CredentialResult<String> {
    if len == 0 {
        return Err(CredentialError::EmptySalt);
    }
    random_hex(len)
}

/// SHA-256 over the decoded salt bytes followed by the secret bytes
pub fn hash_with_salt(secret: &str, salt_hex: &str) -> CredentialResult<String> {
    if salt_hex.is_empty() {
        return Err(CredentialError::EmptySalt);
    }
    let salt = hex::decode(salt_hex)?;

    let mut hasher = Sha256::new();
    hasher.update(&salt);
    hasher.update(secret.as_bytes());
    Ok(hex::encode(hasher.finalize()))
}

/// Check a secret against a stored salted hash.
///
/// The comparison runs in constant time over the hex digests. A malformed
/// salt never verifies.
pub fn verify_secret(secret: &str, stored_hash_hex: &str, salt_hex: &str) -> bool {
    match hash_with_salt(secret, salt_hex) {
        Ok(computed) => computed
            .as_bytes()
            .ct_eq(stored_hash_hex.as_bytes())
            .into(),
        Err(_) => false,
    }
}

/// Fingerprint of a client: SHA-256 of address followed by user agent
pub fn fingerprint(client_address: &str, user_agent: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(client_address.as_bytes());
    hasher.update(user_agent.as_bytes());
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_shape() {
        let token = generate_token().unwrap();
        assert_eq!(token.len(), TOKEN_BYTES * 2);
        assert!(token.chars().all(|c| c.is_ascii_hexdigit()));
        assert_eq!(token, token.to_lowercase());
    }

    #[test]
    fn test_tokens_are_distinct() {
        let tokens: std::collections::HashSet<String> =
            (0..64).map(|_| generate_token().unwrap()).collect();
        assert_eq!(tokens.len(), 64);
    }

    #[test]
    fn test_salt_generation() {
        let salt = generate_salt(DEFAULT_SALT_BYTES).unwrap();
        assert_eq!(salt.len(), 32);
        assert!(matches!(generate_salt(0), Err(CredentialError::EmptySalt)));
    }

    #[test]
    fn test_hash_with_salt_known_vector() {
        // Salt bytes "ab" followed by secret "c" is SHA-256("abc").
        let hash = hash_with_salt("c", "6162").unwrap();
        assert_eq!(
            hash,
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn test_hash_rejects_bad_salt() {
        assert!(matches!(
            hash_with_salt("secret", "abc"),
            Err(CredentialError::InvalidSalt(_))
        ));
        assert!(matches!(
            hash_with_salt("secret", "zz"),
            Err(CredentialError::InvalidSalt(_))
        ));
        assert!(matches!(
            hash_with_salt("secret", ""),
            Err(CredentialError::EmptySalt)
        ));
    }

    #[test]
    fn test_verify_secret() {
        let salt = generate_salt(DEFAULT_SALT_BYTES).unwrap();
        let stored = hash_with_salt("hunter2", &salt).unwrap();

        assert!(verify_secret("hunter2", &stored, &salt));
        assert!(!verify_secret("hunter3", &stored, &salt));
        assert!(!verify_secret("hunter2", &stored[..10], &salt));
        assert!(!verify_secret("hunter2", &stored, "xyz"));
    }

    #[test]
    fn test_fingerprint() {
        let a = fingerprint("192.168.1.20", "Mozilla/5.0");
        let b = fingerprint("192.168.1.20", "Mozilla/5.0");
        let c = fingerprint("192.168.1.21", "Mozilla/5.0");
        let d = fingerprint("192.168.1.20", "curl/8.0");

        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_ne!(a, d);
        assert_eq!(a.len(), 64);
    }
}
