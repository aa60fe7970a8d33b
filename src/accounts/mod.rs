//! Account storage
//!
//! The session engine only needs to match an email against a stored secret.
//! Secrets are bcrypt hashes; the store itself never sees a plaintext password.

mod memory;
mod password;

use async_trait::async_trait;
use thiserror::Error;

pub use memory::InMemoryAccountStore;
pub use password::{HashError, PasswordHasher, MAX_COST, MIN_COST};

/// Account store errors
#[derive(Error, Debug, PartialEq, Eq)]
pub enum AccountError {
    #[error("Account not found")]
    NotFound,

    #[error("Account already exists")]
    AlreadyExists,
}

/// Minimal credential store keyed by email
#[async_trait]
pub trait AccountStore: Send + Sync {
    async fn exists(&self, email: &str) -> bool;

    /// Stored password hash for `email`
    async fn get(&self, email: &str) -> Result<String, AccountError>;

    /// Insert a new account. Fails with `AlreadyExists` if the email is taken.
    async fn save(&self, email: &str, password_hash: &str) -> Result<(), AccountError>;
}
