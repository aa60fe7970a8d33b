//! Token ledger
//!
//! Bookkeeping of the access↔refresh pairing and the revocation set. Keys are
//! SHA-256 digests of the token strings, so a dump of the ledger never holds a
//! usable bearer token.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use tokio::sync::RwLock;

use super::jwt::IssuedToken;

/// Hash a token for storage
pub fn hash_token(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    hex::encode(hasher.finalize())
}

/// Counts of entries removed by [`TokenLedger::purge_expired`]
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct PurgeStats {
    pub sessions: usize,
    pub revocations: usize,
}

/// Storage-agnostic ledger of session pairs and revocations.
///
/// Every operation must be linearizable with respect to every other one;
/// `revoke_key` in particular is a compare-and-delete that reports whether it
/// removed a live pairing, which is what makes refresh tokens single-use.
#[async_trait]
pub trait TokenLedger: Send + Sync {
    /// Record a new session pair, overwriting any prior mapping for its keys.
    async fn save(&self, access: &IssuedToken, refresh: &IssuedToken);

    /// True iff the access key has a recorded pairing and is not revoked.
    async fn exists_key(&self, access_key: &str) -> bool;

    /// Reverse lookup: the ledger key of the access token paired with `refresh`.
    async fn get_by_refresh(&self, refresh: &str) -> Option<String>;

    /// Revoke a live access key together with both pairing directions.
    ///
    /// Returns `false` without touching anything if the key has no live pairing.
    async fn revoke_key(&self, access_key: &str) -> bool;

    /// Drop sessions whose refresh token expired and revocations whose access
    /// token expired.
    async fn purge_expired(&self, now: DateTime<Utc>) -> PurgeStats;

    async fn exists(&self, access: &str) -> bool {
        self.exists_key(&hash_token(access)).await
    }

    async fn revoke(&self, access: &str) -> bool {
        self.revoke_key(&hash_token(access)).await
    }
}

#[derive(Debug, Clone)]
struct PairEntry {
    refresh_key: String,
    access_expires_at: DateTime<Utc>,
    refresh_expires_at: DateTime<Utc>,
}

#[derive(Debug, Default)]
struct LedgerState {
    access_to_refresh: HashMap<String, PairEntry>,
    refresh_to_access: HashMap<String, String>,
    /// Revoked access keys and the instant the access token expires
    revoked: HashMap<String, DateTime<Utc>>,
}

/// In-memory ledger with all three maps behind a single lock
#[derive(Debug, Default)]
pub struct InMemoryLedger {
    state: RwLock<LedgerState>,
}

impl InMemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live (recorded, unrevoked) session pairs
    pub async fn active_sessions(&self) -> usize {
        self.state.read().await.access_to_refresh.len()
    }

    /// Size of the revocation set
    pub async fn revoked_count(&self) -> usize {
        self.state.read().await.revoked.len()
    }
}

#[async_trait]
impl TokenLedger for InMemoryLedger {
    async fn save(&self, access: &IssuedToken, refresh: &IssuedToken) {
        let access_key = hash_token(&access.token);
        let refresh_key = hash_token(&refresh.token);

        let mut state = self.state.write().await;
        state.refresh_to_access.insert(refresh_key.clone(), access_key.clone());
        state.access_to_refresh.insert(
            access_key,
            PairEntry {
                refresh_key,
                access_expires_at: access.expires_at,
                refresh_expires_at: refresh.expires_at,
            },
        );
    }

    async fn exists_key(&self, access_key: &str) -> bool {
        let state = self.state.read().await;
        state.access_to_refresh.contains_key(access_key) && !state.revoked.contains_key(access_key)
    }

    async fn get_by_refresh(&self, refresh: &str) -> Option<String> {
        let refresh_key = hash_token(refresh);
        self.state
            .read()
            .await
            .refresh_to_access
            .get(&refresh_key)
            .cloned()
    }

    async fn revoke_key(&self, access_key: &str) -> bool {
        let mut state = self.state.write().await;

        if state.revoked.contains_key(access_key) {
            return false;
        }
        let Some(entry) = state.access_to_refresh.remove(access_key) else {
            return false;
        };

        // Only drop the reverse entry if it still points at this access key.
        if state
            .refresh_to_access
            .get(&entry.refresh_key)
            .is_some_and(|paired| paired == access_key)
        {
            state.refresh_to_access.remove(&entry.refresh_key);
        }
        state
            .revoked
            .insert(access_key.to_string(), entry.access_expires_at);

        true
    }

    async fn purge_expired(&self, now: DateTime<Utc>) -> PurgeStats {
        let mut state = self.state.write().await;
        let LedgerState {
            access_to_refresh,
            refresh_to_access,
            revoked,
        } = &mut *state;

        let sessions_before = access_to_refresh.len();
        access_to_refresh.retain(|_, entry| entry.refresh_expires_at > now);
        let sessions = sessions_before - access_to_refresh.len();

        refresh_to_access.retain(|_, access_key| access_to_refresh.contains_key(access_key));

        let revocations_before = revoked.len();
        revoked.retain(|_, expires_at| *expires_at > now);
        let revocations = revocations_before - revoked.len();

        PurgeStats {
            sessions,
            revocations,
        }
    }
}
