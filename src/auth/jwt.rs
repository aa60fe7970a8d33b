//! Credential signing and verification
//!
//! Access and refresh tokens are HS256 JWTs carrying the subject, a unique
//! token id, the token kind and the issue/expiry timestamps.

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// JWT-related errors
#[derive(Error, Debug)]
pub enum JwtError {
    #[error("Token encoding failed: {0}")]
    EncodingFailed(String),

    #[error("Token expired")]
    TokenExpired,

    #[error("Invalid token: {0}")]
    InvalidToken(String),
}

/// Token kind, carried in the `token_type` claim
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    Access,
    Refresh,
}

impl TokenKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TokenKind::Access => "access",
            TokenKind::Refresh => "refresh",
        }
    }
}

/// JWT claims shared by access and refresh tokens
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// Subject (account email)
    pub sub: String,
    /// JWT ID, unique per issued token
    pub jti: String,
    /// Issued at (Unix timestamp)
    pub iat: i64,
    /// Expiration (Unix timestamp)
    pub exp: i64,
    pub token_type: TokenKind,
}

/// A freshly signed token together with its expiry
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: String,
    pub token_id: String,
    pub expires_at: DateTime<Utc>,
}

/// Credential reconstructed from a token whose signature and expiry checked out
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifiedToken {
    pub subject: String,
    pub token_id: String,
    pub kind: TokenKind,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

/// Signs and verifies tokens with a process-wide symmetric secret.
///
/// The secret is fixed at construction; the signer holds no other state and
/// can be shared across tasks behind an `Arc`.
#[derive(Clone)]
pub struct TokenSigner {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
}

impl std::fmt::Debug for TokenSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenSigner").finish_non_exhaustive()
    }
}

impl TokenSigner {
    pub fn new(secret: &[u8]) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        // Expiry is checked by hand once the signature is known to be good,
        // so that `now >= exp` counts as expired with no leeway.
        validation.validate_exp = false;
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "iat", "sub"]);

        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            validation,
        }
    }

    /// Issue a token for `subject` that expires `ttl` from now.
    ///
    /// A non-positive `ttl` yields a token that is already expired.
    pub fn issue(
        &self,
        subject: &str,
        kind: TokenKind,
        ttl: Duration,
    ) -> Result<IssuedToken, JwtError> {
        let now = Utc::now();
        let exp = now
            .checked_add_signed(ttl)
            .ok_or_else(|| JwtError::EncodingFailed("token expiry out of range".to_string()))?;

        let claims = Claims {
            sub: subject.to_string(),
            jti: Uuid::new_v4().to_string(),
            iat: now.timestamp(),
            exp: exp.timestamp(),
            token_type: kind,
        };

        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| JwtError::EncodingFailed(e.to_string()))?;

        Ok(IssuedToken {
            token,
            token_id: claims.jti,
            expires_at: timestamp_to_datetime(claims.exp)?,
        })
    }

    /// Verify a token's signature, then its expiry.
    ///
    /// # Returns
    /// * `Ok(VerifiedToken)` if the signature matches and the token is unexpired
    /// * `Err(JwtError::InvalidToken)` for malformed or forged tokens
    /// * `Err(JwtError::TokenExpired)` for authentic tokens past their expiry
    pub fn verify(&self, token: &str) -> Result<VerifiedToken, JwtError> {
        let claims = decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map_err(|e| JwtError::InvalidToken(e.to_string()))?
            .claims;

        if Utc::now().timestamp() >= claims.exp {
            return Err(JwtError::TokenExpired);
        }

        Ok(VerifiedToken {
            issued_at: timestamp_to_datetime(claims.iat)?,
            expires_at: timestamp_to_datetime(claims.exp)?,
            subject: claims.sub,
            token_id: claims.jti,
            kind: claims.token_type,
        })
    }
}

fn timestamp_to_datetime(seconds: i64) -> Result<DateTime<Utc>, JwtError> {
    DateTime::from_timestamp(seconds, 0)
        .ok_or_else(|| JwtError::InvalidToken(format!("timestamp {} out of range", seconds)))
}
