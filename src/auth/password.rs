use bcrypt::{DEFAULT_COST, hash, verify};

#[derive(Debug, thiserror::Error)]
pub enum PasswordError {
    #[error("Password hashing failed: {0}")]
    HashingFailed(bcrypt::BcryptError),
}

pub struct PasswordManager;

impl PasswordManager {
    /// Salted bcrypt hash; hashing the same password twice gives different output.
    pub fn hash(password: &str) -> Result<String, PasswordError> {
        hash(password, DEFAULT_COST).map_err(PasswordError::HashingFailed)
    }

    /// A malformed hash verifies as `false` instead of failing.
    pub fn verify(password: &str, hash: &str) -> bool {
        verify(password, hash).unwrap_or_else(|e| {
            tracing::warn!("Password verification against malformed hash: {e}");
            false
        })
    }
}
