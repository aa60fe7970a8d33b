//! Authentication request/response DTOs

use serde::{Deserialize, Serialize};
use validator::Validate;

/// Sign-up and sign-in request body
#[derive(Debug, Deserialize, Validate)]
pub struct CredentialsRequest {
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 8))]
    pub password: String,
}

/// Auth tokens response
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct AuthTokensResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: String,
    /// Access token lifetime in seconds
    pub expires_in: i64,
}

/// Refresh token request
#[derive(Debug, Deserialize, Validate)]
pub struct RefreshTokenRequest {
    #[validate(length(min = 1))]
    pub refresh_token: String,
}

/// Revoke request
#[derive(Debug, Deserialize, Validate)]
pub struct RevokeRequest {
    #[validate(length(min = 1))]
    pub token: String,
}

/// Plain confirmation message
#[derive(Debug, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Protected endpoint response
#[derive(Debug, Serialize, Deserialize)]
pub struct ProtectedResponse {
    pub message: String,
    pub subject: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_credentials_validation() {
        let valid = CredentialsRequest {
            email: "a@b.com".to_string(),
            password: "password1".to_string(),
        };
        assert!(valid.validate().is_ok());

        let bad_email = CredentialsRequest {
            email: "not-an-email".to_string(),
            password: "password1".to_string(),
        };
        assert!(bad_email.validate().is_err());

        let short_password = CredentialsRequest {
            email: "a@b.com".to_string(),
            password: "short".to_string(),
        };
        assert!(short_password.validate().is_err());
    }

    #[test]
    fn test_empty_refresh_token_rejected() {
        let req = RefreshTokenRequest {
            refresh_token: String::new(),
        };
        assert!(req.validate().is_err());
    }
}
