//! Data models for the SessionVault API

pub mod auth;
pub use auth::*;
