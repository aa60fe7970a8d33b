//! Authentication middleware
//!
//! Gate for protected endpoints: validates the bearer access token and hands
//! the token's subject to the handler.

use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::{header::AUTHORIZATION, request::Parts},
};
use axum_extra::{
    headers::{authorization::Bearer, Authorization},
    TypedHeader,
};
use std::sync::Arc;

use crate::auth::AuthService;
use crate::error::ApiError;

/// Scheme prefix, matched case-sensitively
const BEARER_PREFIX: &str = "Bearer ";

/// Caller authenticated by a valid, unrevoked access token
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    /// Account email the token was issued to
    pub subject: String,
}

/// Extractor for authenticated users
///
/// # Example
///
/// ```rust,ignore
/// async fn protected_handler(user: AuthenticatedUser) -> impl IntoResponse {
///     format!("Hello, {}", user.subject)
/// }
/// ```
#[async_trait]
impl<S> FromRequestParts<S> for AuthenticatedUser
where
    Arc<AuthService>: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        // The typed header accepts any casing of the scheme.
        let has_prefix = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .is_some_and(|value| value.starts_with(BEARER_PREFIX));
        if !has_prefix {
            return Err(ApiError::MissingToken);
        }

        let TypedHeader(Authorization(bearer)) =
            TypedHeader::<Authorization<Bearer>>::from_request_parts(parts, state)
                .await
                .map_err(|_| ApiError::MissingToken)?;

        let auth_service = Arc::<AuthService>::from_ref(state);
        let subject = auth_service.validate(bearer.token()).await?;

        Ok(AuthenticatedUser { subject })
    }
}
