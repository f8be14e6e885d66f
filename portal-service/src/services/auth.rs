//! Account lifecycle and token issuance.

use chrono::{DateTime, TimeZone, Utc};

use crate::dtos::auth::{
    LoginRequest, RegisterRequest, RegisterResponse, TokenResponse, VerifyRequest,
};
use crate::error::AppError;
use crate::services::database::Database;
use crate::services::jwt::{JwtService, TokenKind};
use crate::services::verification::{SmsVerifier, VerificationError, BLOCK_DURATION_SECONDS};
use crate::utils::password::{Password, PasswordHashString};
use crate::workers::{Job, JobQueue};

#[derive(Clone)]
pub struct AuthService {
    db: Database,
    jwt: JwtService,
    verifier: SmsVerifier,
    jobs: JobQueue,
}

impl AuthService {
    pub fn new(db: Database, jwt: JwtService, verifier: SmsVerifier, jobs: JobQueue) -> Self {
        Self {
            db,
            jwt,
            verifier,
            jobs,
        }
    }

    /// Create an unverified account and dispatch a verification code.
    pub async fn register(&self, req: RegisterRequest) -> Result<RegisterResponse, AppError> {
        let hashed = Password::new(req.password).hash()?;

        let user = self
            .db
            .register_user(
                &req.name,
                req.email.as_deref(),
                &req.phone_number,
                hashed.as_str(),
            )
            .await?;

        let code = self
            .verifier
            .issue_code(&user.phone_number)
            .await
            .map_err(map_verification_error)?;

        self.jobs.enqueue(Job::SendSms {
            phone_number: user.phone_number.clone(),
            message: format!("Your verification code is {}", code),
        })?;

        tracing::info!(user_id = user.id, "User registered, verification pending");

        Ok(RegisterResponse {
            phone_number: user.phone_number,
            message: "Verification code sent".to_string(),
        })
    }

    /// Consume a verification code, activate the account and log the
    /// user straight in with a fresh token pair.
    pub async fn verify(&self, req: VerifyRequest) -> Result<TokenResponse, AppError> {
        self.verifier
            .verify_code(&req.phone_number, &req.code)
            .await
            .map_err(map_verification_error)?;

        let user = self.db.activate_user(&req.phone_number).await?;

        let pair = self.jwt.generate_token_pair(user.id)?;
        self.db
            .record_refresh_token(&pair.refresh_jti, self.refresh_expiry_from_now())
            .await?;

        tracing::info!(user_id = user.id, "User verified");
        Ok(TokenResponse::pair(
            pair.access_token,
            pair.refresh_token,
            self.jwt.access_token_expiry_seconds(),
        ))
    }

    /// Password login for a verified account. Issues a token pair and
    /// records the refresh token in the revocation ledger.
    pub async fn login(&self, req: LoginRequest) -> Result<TokenResponse, AppError> {
        let user = self
            .db
            .find_user_by_phone(&req.phone_number)
            .await?
            .ok_or(AppError::Unauthorized(
                "Invalid phone number or password".to_string(),
            ))?;

        PasswordHashString::new(user.hashed_password.clone())
            .verify(&Password::new(req.password))
            .map_err(|_| {
                AppError::Unauthorized("Invalid phone number or password".to_string())
            })?;

        if !user.can_login() {
            return Err(AppError::Forbidden("Account is not active".to_string()));
        }

        let pair = self.jwt.generate_token_pair(user.id)?;
        self.db
            .record_refresh_token(&pair.refresh_jti, self.refresh_expiry_from_now())
            .await?;

        tracing::info!(user_id = user.id, "User logged in");

        Ok(TokenResponse::pair(
            pair.access_token,
            pair.refresh_token,
            self.jwt.access_token_expiry_seconds(),
        ))
    }

    /// Revoke a refresh token. Repeated logout with the same token
    /// succeeds; an undecodable token is rejected.
    pub async fn logout(&self, refresh_token: &str) -> Result<(), AppError> {
        let claims = self
            .jwt
            .decode(refresh_token)
            .map_err(|_| AppError::Unauthorized("Invalid refresh token".to_string()))?;
        claims
            .expect_kind(TokenKind::Refresh)
            .map_err(|_| AppError::Unauthorized("Invalid refresh token".to_string()))?;

        let expires_at = timestamp_to_datetime(claims.exp);
        self.db.blacklist_token(&claims.jti, expires_at).await?;

        tracing::info!(user_id = %claims.sub, "Refresh token revoked");
        Ok(())
    }

    /// Exchange a live refresh token for a fresh access token.
    pub async fn refresh(&self, refresh_token: &str) -> Result<TokenResponse, AppError> {
        let claims = self
            .jwt
            .decode(refresh_token)
            .map_err(|_| AppError::Unauthorized("Invalid refresh token".to_string()))?;
        claims
            .expect_kind(TokenKind::Refresh)
            .map_err(|_| AppError::Unauthorized("Invalid refresh token".to_string()))?;

        if self.db.is_token_blacklisted(&claims.jti).await? {
            return Err(AppError::Unauthorized(
                "Refresh token has been revoked".to_string(),
            ));
        }

        let user_id = claims
            .user_id()
            .map_err(|_| AppError::Unauthorized("Invalid refresh token".to_string()))?;
        let user = self
            .db
            .find_user_by_id(user_id)
            .await?
            .ok_or(AppError::Unauthorized("User not found".to_string()))?;

        if !user.can_login() {
            return Err(AppError::Forbidden("Account is not active".to_string()));
        }

        let access_token = self.jwt.generate_access_token(user.id)?;
        Ok(TokenResponse::access_only(
            access_token,
            self.jwt.access_token_expiry_seconds(),
        ))
    }

    fn refresh_expiry_from_now(&self) -> DateTime<Utc> {
        Utc::now() + chrono::Duration::seconds(self.jwt.refresh_token_expiry_seconds())
    }
}

fn timestamp_to_datetime(ts: i64) -> DateTime<Utc> {
    Utc.timestamp_opt(ts, 0).single().unwrap_or_else(Utc::now)
}

fn map_verification_error(e: VerificationError) -> AppError {
    match e {
        VerificationError::Blocked | VerificationError::TooManyAttempts => {
            AppError::TooManyRequests(e.to_string(), Some(BLOCK_DURATION_SECONDS as u64))
        }
        VerificationError::CodeNotFound | VerificationError::InvalidCode => {
            AppError::BadRequest(e.to_string())
        }
        VerificationError::Store(inner) => AppError::InternalError(inner),
    }
}
