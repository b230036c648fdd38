use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
};
use tracing::warn;
use uuid::Uuid;

use super::{jwt::JwtKeys, repo_types::User};
use crate::{
    error::{AppError, AppResult},
    state::AppState,
    store::Store,
};

/// Header carrying the caller's claimed user id alongside the bearer token.
pub const USER_ID_HEADER: &str = "http-x-uid";

/// Identity resolved for one request plus the capability derived from its role.
#[derive(Debug, Clone)]
pub struct CommonRequest {
    pub identity: User,
    pub is_admin: bool,
}

/// Outcome of an admin-gated operation. `Denied` is not an error: callers
/// answer it with a normal response carrying a "contact admin" message.
#[derive(Debug, Clone, PartialEq)]
pub enum Admission<T> {
    Granted(T),
    Denied,
}

/// Validates the bearer token, checks the user-id header names the same
/// subject, loads that user and derives `is_admin`.
pub async fn resolve(
    keys: &JwtKeys,
    store: &dyn Store,
    authorization: Option<&str>,
    user_id_header: Option<&str>,
) -> AppResult<CommonRequest> {
    let auth = authorization.ok_or_else(|| AppError::auth("Missing Authorization header"))?;
    let token = auth
        .strip_prefix("Bearer ")
        .or_else(|| auth.strip_prefix("bearer "))
        .ok_or_else(|| AppError::auth("Invalid Authorization header"))?;

    let claims = keys.verify(token).map_err(|e| {
        warn!(error = %e, "invalid or expired token");
        AppError::auth("Invalid or expired token")
    })?;

    let claimed = user_id_header
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .ok_or_else(|| AppError::auth("Missing user id header"))?;
    if claimed.parse::<Uuid>().ok() != Some(claims.sub) {
        warn!(token_sub = %claims.sub, header = %claimed, "user id header does not match token");
        return Err(AppError::auth("User id does not match token"));
    }

    let identity = store
        .find_user_by_id(claims.sub)
        .await?
        .ok_or_else(|| AppError::auth("User not found"))?;

    Ok(CommonRequest {
        is_admin: identity.is_admin(),
        identity,
    })
}

#[async_trait]
impl FromRequestParts<AppState> for CommonRequest {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let authorization = parts
            .headers
            .get(axum::http::header::AUTHORIZATION)
            .and_then(|h| h.to_str().ok());
        let user_id = parts
            .headers
            .get(USER_ID_HEADER)
            .and_then(|h| h.to_str().ok());
        let keys = JwtKeys::from_ref(state);
        resolve(&keys, state.store.as_ref(), authorization, user_id).await
    }
}
