//! Request body validation.

use axum::{
    extract::{FromRequest, Request},
    Json,
};
use serde::de::DeserializeOwned;
use validator::{Validate, ValidationError};

use crate::error::AppError;

/// JSON extractor that runs `validator` rules before the handler.
///
/// Rejections flow through [`AppError`] so validation failures render
/// the same error envelope as everything else.
pub struct ValidatedJson<T>(pub T);

#[axum::async_trait]
impl<T, S> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned + Validate + 'static,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|e| AppError::BadRequest(format!("Json parse error: {}", e)))?;

        value.validate().map_err(AppError::ValidationError)?;

        Ok(ValidatedJson(value))
    }
}

/// E.164-style phone number without the plus sign: a non-zero leading
/// digit followed by 1 to 14 further digits.
pub fn validate_phone_number(phone: &str) -> Result<(), ValidationError> {
    let mut chars = phone.chars();
    let valid = matches!(chars.next(), Some(c) if ('1'..='9').contains(&c))
        && phone.len() >= 2
        && phone.len() <= 15
        && phone.chars().all(|c| c.is_ascii_digit());
    if valid {
        Ok(())
    } else {
        Err(ValidationError::new("phone_number"))
    }
}

/// Exactly five ASCII digits.
pub fn validate_sms_code(code: &str) -> Result<(), ValidationError> {
    if code.len() == 5 && code.chars().all(|c| c.is_ascii_digit()) {
        Ok(())
    } else {
        Err(ValidationError::new("code"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_phone_number() {
        assert!(validate_phone_number("998991234567").is_ok());
        assert!(validate_phone_number("19").is_ok());
        assert!(validate_phone_number("0998991234").is_err());
        assert!(validate_phone_number("998-99-123").is_err());
        assert!(validate_phone_number("9").is_err());
        assert!(validate_phone_number("1234567890123456").is_err());
    }

    #[test]
    fn test_validate_sms_code() {
        assert!(validate_sms_code("12345").is_ok());
        assert!(validate_sms_code("1234").is_err());
        assert!(validate_sms_code("123456").is_err());
        assert!(validate_sms_code("12a45").is_err());
    }
}
