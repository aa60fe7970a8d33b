//! Token lifecycle engine
//!
//! - Signed access/refresh token issue and verification
//! - Ledger of session pairs and revoked access tokens
//! - Session service: sign-up, sign-in, refresh rotation, revocation, validation
//! - Background sweep of expired ledger entries

mod jwt;
mod ledger;
mod service;
mod sweeper;

pub use jwt::{Claims, IssuedToken, JwtError, TokenKind, TokenSigner, VerifiedToken};
pub use ledger::{hash_token, InMemoryLedger, PurgeStats, TokenLedger};
pub use service::{AuthError, AuthService};
pub use sweeper::ledger_sweeper;
