//! Password hashing
//!
//! bcrypt is CPU-bound, so hashing and verification run on the blocking pool.

use thiserror::Error;

/// Password hashing errors
#[derive(Error, Debug)]
pub enum HashError {
    #[error("Password hashing failed: {0}")]
    Bcrypt(#[from] bcrypt::BcryptError),

    #[error("Hashing task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

/// Lowest bcrypt cost the algorithm accepts
pub const MIN_COST: u32 = 4;
/// Highest bcrypt cost the algorithm accepts
pub const MAX_COST: u32 = 31;

/// bcrypt hasher with a fixed cost
#[derive(Debug, Clone)]
pub struct PasswordHasher {
    cost: u32,
    /// Verified against when the account is unknown, so a miss costs the
    /// same as a wrong password.
    dummy_hash: String,
}

impl PasswordHasher {
    pub fn new(cost: u32) -> Result<Self, HashError> {
        let dummy_hash = bcrypt::hash(uuid::Uuid::new_v4().to_string(), cost)?;
        Ok(Self { cost, dummy_hash })
    }

    pub async fn hash(&self, password: &str) -> Result<String, HashError> {
        let password = password.to_string();
        let cost = self.cost;
        let hash = tokio::task::spawn_blocking(move || bcrypt::hash(password, cost)).await??;
        Ok(hash)
    }

    /// Check `password` against `stored`, or against the dummy hash when there
    /// is no stored hash. The latter always yields `false`.
    pub async fn verify(&self, password: &str, stored: Option<String>) -> Result<bool, HashError> {
        let known = stored.is_some();
        let hash = stored.unwrap_or_else(|| self.dummy_hash.clone());
        let password = password.to_string();

        let matches = tokio::task::spawn_blocking(move || bcrypt::verify(password, &hash)).await??;
        Ok(known && matches)
    }
}
