use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct RegisterRequest {
    #[validate(length(min = 2, max = 20, message = "Name must be 2-20 characters"))]
    #[schema(example = "User Userberg")]
    pub name: String,

    #[validate(email(message = "Invalid email format"))]
    #[schema(example = "user@example.com")]
    pub email: Option<String>,

    #[validate(custom(function = "crate::utils::validation::validate_phone_number"))]
    #[schema(example = "998991234567")]
    pub phone_number: String,

    #[validate(length(min = 6, max = 32, message = "Password must be 6-32 characters"))]
    #[schema(example = "pass123", min_length = 6, max_length = 32)]
    pub password: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct RegisterResponse {
    #[schema(example = "998991234567")]
    pub phone_number: String,
    #[schema(example = "Verification code sent")]
    pub message: String,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct VerifyRequest {
    #[validate(custom(function = "crate::utils::validation::validate_phone_number"))]
    #[schema(example = "998991234567")]
    pub phone_number: String,

    #[validate(custom(function = "crate::utils::validation::validate_sms_code"))]
    #[schema(example = "12345")]
    pub code: String,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct LoginRequest {
    #[validate(custom(function = "crate::utils::validation::validate_phone_number"))]
    #[schema(example = "998991234567")]
    pub phone_number: String,

    #[validate(length(min = 1, message = "Password is required"))]
    #[schema(example = "pass123")]
    pub password: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct RefreshRequest {
    #[schema(example = "refresh-token-123")]
    pub refresh_token: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct LogoutRequest {
    #[schema(example = "refresh-token-123")]
    pub refresh_token: String,
}

/// Token pair returned on verify and login; refresh issues a new
/// access token only.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    #[schema(example = "Bearer")]
    pub token_type: String,
    pub expires_in: i64,
}

impl TokenResponse {
    pub fn pair(access_token: String, refresh_token: String, expires_in: i64) -> Self {
        Self {
            access_token,
            refresh_token: Some(refresh_token),
            token_type: "Bearer".to_string(),
            expires_in,
        }
    }

    pub fn access_only(access_token: String, expires_in: i64) -> Self {
        Self {
            access_token,
            refresh_token: None,
            token_type: "Bearer".to_string(),
            expires_in,
        }
    }
}
