//! Authentication HTTP handlers

use axum::{extract::State, http::StatusCode, Json};
use validator::Validate;

use super::AuthenticatedUser;
use crate::auth::AuthError;
use crate::error::{ApiError, ApiResult};
use crate::models::{
    AuthTokensResponse, CredentialsRequest, MessageResponse, ProtectedResponse,
    RefreshTokenRequest, RevokeRequest,
};
use crate::state::AppState;

/// POST /signup - Register a new account
pub async fn sign_up(
    State(state): State<AppState>,
    Json(req): Json<CredentialsRequest>,
) -> ApiResult<(StatusCode, Json<MessageResponse>)> {
    req.validate()?;

    state.auth_service.sign_up(&req.email, &req.password).await?;

    Ok((
        StatusCode::CREATED,
        Json(MessageResponse::new("user created")),
    ))
}

/// POST /signin - Check credentials and issue a session pair
pub async fn sign_in(
    State(state): State<AppState>,
    Json(req): Json<CredentialsRequest>,
) -> ApiResult<Json<AuthTokensResponse>> {
    req.validate()?;

    let tokens = state
        .auth_service
        .sign_in(&req.email, &req.password)
        .await?;

    Ok(Json(tokens))
}

/// POST /refresh - Rotate a session using its refresh token
pub async fn refresh_token(
    State(state): State<AppState>,
    Json(req): Json<RefreshTokenRequest>,
) -> ApiResult<Json<AuthTokensResponse>> {
    req.validate()?;

    let tokens = state.auth_service.refresh(&req.refresh_token).await?;

    Ok(Json(tokens))
}

/// POST /revoke - Revoke an access token
pub async fn revoke_token(
    State(state): State<AppState>,
    Json(req): Json<RevokeRequest>,
) -> ApiResult<Json<MessageResponse>> {
    req.validate()?;

    state
        .auth_service
        .revoke(&req.token)
        .await
        .map_err(|e| match e {
            AuthError::InvalidCredential => ApiError::NotFound("token not found".to_string()),
            other => other.into(),
        })?;

    Ok(Json(MessageResponse::new("token revoked")))
}

/// GET /protected - Example endpoint behind the bearer token gate
pub async fn protected(user: AuthenticatedUser) -> Json<ProtectedResponse> {
    Json(ProtectedResponse {
        message: format!("protected data for {}", user.subject),
        subject: user.subject,
    })
}
