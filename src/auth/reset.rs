//! Password reset: `NoReset -> Pending -> (Consumed | Expired)`.
//!
//! A pending reset is the `(reset_token, reset_token_expires_at)` pair on the
//! user row. Consuming or expiring it clears both columns, so a token string
//! can satisfy [`consume_reset`] at most once.

use time::{macros::format_description, Duration, OffsetDateTime};
use tracing::{info, warn};

use super::credentials::{hash_password, normalize_email, random_token, verify_password};
use crate::{
    error::{AppError, AppResult},
    store::Store,
};

pub const RESET_TOKEN_LEN: usize = 10;

#[derive(Debug, Clone, PartialEq)]
pub enum ResetRequest {
    Issued {
        email: String,
        token: String,
        expires_at: OffsetDateTime,
    },
    UnknownEmail,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResetOutcome {
    Reset,
    Expired,
}

/// Issues a fresh token valid for `ttl` from `now`. Any earlier pending token
/// for the same user is overwritten.
pub async fn request_reset(
    store: &dyn Store,
    email: &str,
    ttl: Duration,
    now: OffsetDateTime,
) -> AppResult<ResetRequest> {
    let email = normalize_email(email);
    let Some(user) = store.find_user_by_email(&email).await? else {
        info!(email = %email, "reset requested for unknown email");
        return Ok(ResetRequest::UnknownEmail);
    };

    let token = random_token(RESET_TOKEN_LEN);
    let expires_at = now + ttl;
    store.set_reset_token(user.id, &token, expires_at).await?;

    info!(user_id = %user.id, %expires_at, "reset token issued");
    Ok(ResetRequest::Issued {
        email: user.email,
        token,
        expires_at,
    })
}

pub async fn consume_reset(
    store: &dyn Store,
    token: &str,
    old_password: &str,
    new_password: &str,
    now: OffsetDateTime,
) -> AppResult<ResetOutcome> {
    let missing = || AppError::not_found("reset token not found");
    let user = store
        .find_user_by_reset_token(token)
        .await?
        .ok_or_else(missing)?;

    let expired = match user.reset_token_expires_at {
        Some(expires_at) => now > expires_at,
        None => true,
    };
    if expired {
        if store.clear_reset_token(user.id, token).await? == 0 {
            return Err(missing());
        }
        warn!(user_id = %user.id, "reset token expired");
        return Ok(ResetOutcome::Expired);
    }

    if !verify_password(old_password, &user.password_hash)? {
        warn!(user_id = %user.id, "reset rejected: old password mismatch");
        return Err(AppError::auth("old password incorrect"));
    }
    if new_password.is_empty() {
        return Err(AppError::validation("new_password is required"));
    }

    let digest = hash_password(new_password)?;
    // Another consume or a newer request may have replaced the token since the lookup.
    if store.rotate_password(user.id, token, &digest).await? == 0 {
        warn!(user_id = %user.id, "reset token changed before password rotation");
        return Err(missing());
    }
    info!(user_id = %user.id, "password reset");
    Ok(ResetOutcome::Reset)
}

pub fn reset_link(base: &str, token: &str) -> String {
    format!("{}/reset_password/{}", base.trim_end_matches('/'), token)
}

/// Renders e.g. `19 October 2026 14:05:00`.
pub fn format_expiry(at: OffsetDateTime) -> String {
    let fmt = format_description!("[day] [month repr:long] [year] [hour]:[minute]:[second]");
    at.format(&fmt).unwrap_or_else(|_| at.to_string())
}
