use bcrypt::{hash, verify};
use thiserror::Error;

/// Internal failure of the hashing primitive. A wrong password is not an error.
#[derive(Debug, Error)]
#[error("{0}")]
pub struct PasswordError(String);

/// One-way hashing of credentials.
pub trait PasswordHasher: Send + Sync {
    /// Hashes `plaintext` with a fresh random salt.
    fn hash(&self, plaintext: &str) -> Result<String, PasswordError>;

    /// Returns `Ok(false)` when `plaintext` does not match `hashed`.
    fn verify(&self, hashed: &str, plaintext: &str) -> Result<bool, PasswordError>;
}

/// `PasswordHasher` backed by bcrypt.
#[derive(Debug, Clone, Copy)]
pub struct BcryptHasher {
    cost: u32,
}

impl BcryptHasher {
    pub fn new(cost: u32) -> Self {
        Self { cost }
    }
}

impl PasswordHasher for BcryptHasher {
    fn hash(&self, plaintext: &str) -> Result<String, PasswordError> {
        hash(plaintext, self.cost)
            .map_err(|e| PasswordError(format!("Failed to hash password: {}", e)))
    }

    fn verify(&self, hashed: &str, plaintext: &str) -> Result<bool, PasswordError> {
        verify(plaintext, hashed)
            .map_err(|e| PasswordError(format!("Failed to verify password: {}", e)))
    }
}
