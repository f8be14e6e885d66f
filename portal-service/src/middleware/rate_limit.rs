//! Fixed-window rate limiting backed by the key-value store.
//!
//! Counters are shared across instances: the window start is derived
//! from wall-clock time, so every replica increments the same key for
//! the same caller, path and window. Limits come from the tier's rule
//! for the normalized path; callers without a tier or a matching rule
//! get the process-wide default.

use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::IntoResponse,
};
use chrono::Utc;

use crate::error::AppError;
use crate::models::User;
use crate::utils::path::sanitize_path;
use crate::AppState;

/// Start of the fixed window containing `now` for the given period.
pub fn window_start(now: i64, period: i64) -> i64 {
    now - (now % period)
}

pub async fn rate_limit(
    State(state): State<AppState>,
    req: Request,
    next: Next,
) -> Result<impl IntoResponse, AppError> {
    let path = sanitize_path(req.uri().path());
    let (identity, subject) = match req.extensions().get::<User>() {
        Some(user) => (format!("user:{}", user.id), Some((user.id, user.tier_id))),
        None => (format!("ip:{}", client_ip(&req)), None),
    };

    let (limit, period) = resolve_rule(&state, subject, &path).await;

    let now = Utc::now().timestamp();
    let window = window_start(now, period);
    let key = format!("ratelimit:{}:{}:{}", identity, path, window);

    let count = state.kv.incr(&key).await?;
    if count == 1 {
        state.kv.expire(&key, period).await?;
    }

    if count > limit {
        let retry_after = (window + period - now).max(1) as u64;
        tracing::warn!(identity = %identity, path = %path, count, limit, "Rate limit exceeded");
        return Err(AppError::TooManyRequests(
            "Too many requests. Please try again later".to_string(),
            Some(retry_after),
        ));
    }

    Ok(next.run(req).await)
}

/// Look up the tier's rule for the path. A missing tier, a missing
/// rule and a failed lookup all fall back to the configured default
/// with a warning; anonymous callers use the default without one.
async fn resolve_rule(
    state: &AppState,
    subject: Option<(i64, Option<i64>)>,
    path: &str,
) -> (i64, i64) {
    let default = (
        state.config.rate_limit.default_limit,
        state.config.rate_limit.default_period_seconds,
    );

    let Some((user_id, tier_id)) = subject else {
        return default;
    };

    let Some(tier_id) = tier_id else {
        tracing::warn!(user_id, path = %path, "No tier assigned, using default rate limit");
        return default;
    };

    match state.db.find_rate_limit_rule(tier_id, path).await {
        Ok(Some(rule)) => (rule.limit, rule.period),
        Ok(None) => {
            tracing::warn!(tier_id, path = %path, "No rate limit rule for path, using default");
            default
        }
        Err(e) => {
            tracing::warn!(tier_id, path = %path, "Rate limit rule lookup failed, using default: {}", e);
            default
        }
    }
}

fn client_ip(req: &Request) -> String {
    req.headers()
        .get("x-forwarded-for")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(',').next())
        .map(|value| value.trim().to_string())
        .or_else(|| {
            req.headers()
                .get(header::FORWARDED)
                .and_then(|value| value.to_str().ok())
                .map(|value| value.to_string())
        })
        .unwrap_or_else(|| "unknown".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_window_start_is_period_aligned() {
        assert_eq!(window_start(125, 60), 120);
        assert_eq!(window_start(120, 60), 120);
        assert_eq!(window_start(179, 60), 120);
        assert_eq!(window_start(180, 60), 180);
    }

    #[test]
    fn test_same_window_same_key_across_instances() {
        // Two calls a second apart inside one window agree on the start
        let a = window_start(1_700_000_005, 60);
        let b = window_start(1_700_000_006, 60);
        assert_eq!(a, b);
    }
}
