//! Authentication service
//!
//! Session lifecycle on top of the signer, the token ledger and the account
//! store: sign-up, sign-in, refresh rotation, revocation and validation.

use chrono::Duration;
use std::sync::Arc;
use thiserror::Error;

use crate::accounts::{AccountError, AccountStore, HashError, PasswordHasher};
use crate::models::AuthTokensResponse;

use super::jwt::{IssuedToken, JwtError, TokenKind, TokenSigner};
use super::ledger::TokenLedger;

/// Auth service errors
#[derive(Error, Debug)]
pub enum AuthError {
    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("Invalid token")]
    InvalidCredential,

    #[error("Token expired")]
    CredentialExpired,

    #[error("Token revoked")]
    CredentialRevoked,

    #[error("Account already exists")]
    AccountAlreadyExists,

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<JwtError> for AuthError {
    fn from(e: JwtError) -> Self {
        match e {
            JwtError::TokenExpired => AuthError::CredentialExpired,
            JwtError::InvalidToken(_) => AuthError::InvalidCredential,
            JwtError::EncodingFailed(msg) => AuthError::Internal(msg),
        }
    }
}

impl From<AccountError> for AuthError {
    fn from(e: AccountError) -> Self {
        match e {
            AccountError::AlreadyExists => AuthError::AccountAlreadyExists,
            AccountError::NotFound => AuthError::Internal(e.to_string()),
        }
    }
}

impl From<HashError> for AuthError {
    fn from(e: HashError) -> Self {
        AuthError::Internal(e.to_string())
    }
}

/// Authentication service
///
/// Holds no session state of its own; everything mutable lives in the ledger.
#[derive(Clone)]
pub struct AuthService {
    signer: Arc<TokenSigner>,
    ledger: Arc<dyn TokenLedger>,
    accounts: Arc<dyn AccountStore>,
    hasher: PasswordHasher,
    access_token_ttl_seconds: i64,
    refresh_token_ttl_seconds: i64,
}

impl AuthService {
    /// Create a new AuthService
    pub fn new(
        signer: TokenSigner,
        ledger: Arc<dyn TokenLedger>,
        accounts: Arc<dyn AccountStore>,
        hasher: PasswordHasher,
        access_token_ttl_seconds: i64,
        refresh_token_ttl_seconds: i64,
    ) -> Self {
        Self {
            signer: Arc::new(signer),
            ledger,
            accounts,
            hasher,
            access_token_ttl_seconds,
            refresh_token_ttl_seconds,
        }
    }

    pub fn ledger(&self) -> Arc<dyn TokenLedger> {
        self.ledger.clone()
    }

    /// Register a new account
    pub async fn sign_up(&self, email: &str, password: &str) -> Result<(), AuthError> {
        if self.accounts.exists(email).await {
            return Err(AuthError::AccountAlreadyExists);
        }

        let password_hash = self.hasher.hash(password).await?;
        // A concurrent sign-up may have taken the email while we were hashing;
        // the store's insert decides.
        self.accounts.save(email, &password_hash).await?;

        tracing::info!(subject = %email, "Account created");
        Ok(())
    }

    /// Check account credentials and issue a new session pair
    pub async fn sign_in(
        &self,
        email: &str,
        password: &str,
    ) -> Result<AuthTokensResponse, AuthError> {
        let stored = match self.accounts.get(email).await {
            Ok(hash) => Some(hash),
            Err(AccountError::NotFound) => None,
            Err(e) => return Err(e.into()),
        };

        if !self.hasher.verify(password, stored).await? {
            tracing::debug!("Sign-in rejected");
            return Err(AuthError::InvalidCredentials);
        }

        let tokens = self.issue_pair(email).await?;
        tracing::info!(subject = %email, "Signed in");
        Ok(tokens)
    }

    /// Exchange a refresh token for a brand-new session pair.
    ///
    /// The old access token is revoked and the refresh token consumed. Of any
    /// number of concurrent calls with the same refresh token, exactly one
    /// succeeds.
    pub async fn refresh(&self, refresh_token: &str) -> Result<AuthTokensResponse, AuthError> {
        let verified = self.signer.verify(refresh_token)?;
        if verified.kind != TokenKind::Refresh {
            tracing::debug!(kind = verified.kind.as_str(), "Refresh with wrong token kind");
            return Err(AuthError::InvalidCredential);
        }

        let access_key = self
            .ledger
            .get_by_refresh(refresh_token)
            .await
            .ok_or(AuthError::InvalidCredential)?;

        if !self.ledger.revoke_key(&access_key).await {
            tracing::debug!(subject = %verified.subject, "Refresh token already consumed");
            return Err(AuthError::InvalidCredential);
        }

        let tokens = self.issue_pair(&verified.subject).await?;
        tracing::info!(subject = %verified.subject, "Session rotated");
        Ok(tokens)
    }

    /// Revoke an access token and the refresh token paired with it
    pub async fn revoke(&self, access_token: &str) -> Result<(), AuthError> {
        if !self.ledger.revoke(access_token).await {
            return Err(AuthError::InvalidCredential);
        }

        tracing::info!("Session revoked");
        Ok(())
    }

    /// Validate a bearer access token, returning its subject
    pub async fn validate(&self, access_token: &str) -> Result<String, AuthError> {
        let verified = self.signer.verify(access_token)?;
        if verified.kind != TokenKind::Access {
            return Err(AuthError::InvalidCredential);
        }

        if !self.ledger.exists(access_token).await {
            return Err(AuthError::CredentialRevoked);
        }

        Ok(verified.subject)
    }

    async fn issue_pair(&self, subject: &str) -> Result<AuthTokensResponse, AuthError> {
        let access = self.issue(subject, TokenKind::Access, self.access_token_ttl_seconds)?;
        let refresh = self.issue(subject, TokenKind::Refresh, self.refresh_token_ttl_seconds)?;

        self.ledger.save(&access, &refresh).await;

        Ok(AuthTokensResponse {
            access_token: access.token,
            refresh_token: refresh.token,
            token_type: "Bearer".to_string(),
            expires_in: self.access_token_ttl_seconds,
        })
    }

    fn issue(
        &self,
        subject: &str,
        kind: TokenKind,
        ttl_seconds: i64,
    ) -> Result<IssuedToken, AuthError> {
        let ttl = Duration::try_seconds(ttl_seconds)
            .ok_or_else(|| AuthError::Internal(format!("token ttl {}s out of range", ttl_seconds)))?;
        Ok(self.signer.issue(subject, kind, ttl)?)
    }
}
