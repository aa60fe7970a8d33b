use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;

use super::{AccountError, AccountStore};

/// In-memory account store
#[derive(Debug, Default)]
pub struct InMemoryAccountStore {
    accounts: RwLock<HashMap<String, String>>,
}

impl InMemoryAccountStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl AccountStore for InMemoryAccountStore {
    async fn exists(&self, email: &str) -> bool {
        self.accounts.read().await.contains_key(email)
    }

    async fn get(&self, email: &str) -> Result<String, AccountError> {
        self.accounts
            .read()
            .await
            .get(email)
            .cloned()
            .ok_or(AccountError::NotFound)
    }

    async fn save(&self, email: &str, password_hash: &str) -> Result<(), AccountError> {
        let mut accounts = self.accounts.write().await;
        if accounts.contains_key(email) {
            return Err(AccountError::AlreadyExists);
        }
        accounts.insert(email.to_string(), password_hash.to_string());
        Ok(())
    }
}
