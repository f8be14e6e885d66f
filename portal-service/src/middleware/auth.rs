use axum::{
    extract::{FromRequestParts, Request, State},
    http::{header, request::Parts},
    middleware::Next,
    response::IntoResponse,
};

use crate::error::AppError;
use crate::models::User;
use crate::services::jwt::TokenKind;
use crate::AppState;

/// Require a live access token and load the account behind it.
///
/// The resolved [`User`] is stored in request extensions for handlers
/// and downstream layers.
pub async fn require_auth(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<impl IntoResponse, AppError> {
    let token = bearer_token(&req).ok_or(AppError::Unauthorized(
        "Missing or invalid Authorization header".to_string(),
    ))?;

    let claims = state
        .jwt
        .decode(token)
        .map_err(|_| AppError::Unauthorized("Invalid or expired token".to_string()))?;
    claims
        .expect_kind(TokenKind::Access)
        .map_err(|_| AppError::Unauthorized("Invalid or expired token".to_string()))?;

    if state.db.is_token_blacklisted(&claims.jti).await? {
        return Err(AppError::Unauthorized(
            "Token has been revoked".to_string(),
        ));
    }

    let user_id = claims
        .user_id()
        .map_err(|_| AppError::Unauthorized("Invalid or expired token".to_string()))?;
    let user = state
        .db
        .find_user_by_id(user_id)
        .await?
        .ok_or(AppError::Unauthorized("User not found".to_string()))?;

    if !user.can_login() {
        return Err(AppError::Forbidden("Account is not active".to_string()));
    }

    req.extensions_mut().insert(user);
    Ok(next.run(req).await)
}

/// Resolve the caller if a usable access token is present.
///
/// For routes that serve anonymous traffic but personalize (or
/// rate-limit) authenticated callers. Any resolution failure degrades
/// to no subject instead of rejecting the request.
pub async fn optional_auth(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> axum::response::Response {
    let user = match bearer_token(&req) {
        Some(token) => resolve_optional_user(&state, token).await,
        None => None,
    };
    if let Some(user) = user {
        req.extensions_mut().insert(user);
    }
    next.run(req).await
}

async fn resolve_optional_user(state: &AppState, token: &str) -> Option<User> {
    let claims = state.jwt.decode(token).ok()?;
    claims.expect_kind(TokenKind::Access).ok()?;

    if state.db.is_token_blacklisted(&claims.jti).await.ok()? {
        return None;
    }

    let user = state
        .db
        .find_user_by_id(claims.user_id().ok()?)
        .await
        .ok()??;
    user.can_login().then_some(user)
}

/// Require the authenticated account to be a superuser. Layered after
/// [`require_auth`].
pub async fn require_superuser(req: Request, next: Next) -> Result<impl IntoResponse, AppError> {
    let user = req
        .extensions()
        .get::<User>()
        .ok_or(AppError::Unauthorized("Authentication required".to_string()))?;

    if !user.is_superuser {
        return Err(AppError::Forbidden(
            "Superuser privileges required".to_string(),
        ));
    }

    Ok(next.run(req).await)
}

fn bearer_token(req: &Request) -> Option<&str> {
    req.headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
}

/// Extractor for the account resolved by [`require_auth`].
pub struct CurrentUser(pub User);

#[axum::async_trait]
impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let user = parts
            .extensions
            .get::<User>()
            .ok_or(AppError::InternalError(anyhow::anyhow!(
                "User missing from request extensions"
            )))?;

        Ok(CurrentUser(user.clone()))
    }
}
