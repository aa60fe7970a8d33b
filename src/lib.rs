//! SessionVault Server Library
//!
//! Issues, rotates, validates and revokes short-lived access/refresh token
//! pairs, and exposes those operations over HTTP.

pub mod accounts;
pub mod auth;
pub mod config;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod state;
