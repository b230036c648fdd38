use axum::{
    extract::{FromRef, Path, State},
    http::{header::HOST, HeaderMap},
    routing::{get, post},
    Json, Router,
};
use time::{Duration, OffsetDateTime};
use tracing::instrument;

use super::{
    dto::{
        LoginRequest, LoginResponse, MeResponse, MessageResponse, PublicUser, RegisterRequest,
        RegisterResponse, ResetLinkData, ResetLinkRequest, ResetPasswordRequest, SuccessEnvelope,
    },
    extractors::CommonRequest,
    jwt::JwtKeys,
    reset::{self, ResetOutcome, ResetRequest},
    services::{self, Registration},
};
use crate::{error::AppResult, state::AppState};

pub const LINK_EXPIRED: &str = "link expired, please call reset_link endpoint again";
pub const USER_NOT_FOUND: &str = "User not found";

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/get_reset_link", post(get_reset_link))
        .route("/reset_password/:token", post(reset_password))
}

pub fn me_routes() -> Router<AppState> {
    Router::new().route("/me", get(get_me))
}

#[instrument(skip(state, payload))]
pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> AppResult<Json<RegisterResponse>> {
    let user = services::register(
        state.store.as_ref(),
        Registration {
            username: payload.username,
            email: payload.email,
            password: payload.password,
            role: payload.role,
        },
    )
    .await?;

    Ok(Json(RegisterResponse {
        message: "registration success",
        user: PublicUser::from(&user),
    }))
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> AppResult<Json<LoginResponse>> {
    let keys = JwtKeys::from_ref(&state);
    let ok = services::login(state.store.as_ref(), &keys, &payload.email, &payload.password).await?;

    Ok(Json(LoginResponse {
        message: "Login Success",
        id: ok.user.id,
        token: ok.token,
        user: PublicUser::from(&ok.user),
    }))
}

#[instrument(skip(state, headers, payload))]
pub async fn get_reset_link(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(payload): Json<ResetLinkRequest>,
) -> AppResult<Json<serde_json::Value>> {
    let ttl = Duration::minutes(state.config.reset_token_ttl_minutes);
    let outcome =
        reset::request_reset(state.store.as_ref(), &payload.email, ttl, OffsetDateTime::now_utc())
            .await?;

    let body = match outcome {
        ResetRequest::UnknownEmail => serde_json::to_value(MessageResponse::new(USER_NOT_FOUND)),
        ResetRequest::Issued {
            email,
            token,
            expires_at,
        } => {
            let base = headers
                .get(HOST)
                .and_then(|h| h.to_str().ok())
                .map(|host| format!("http://{host}"))
                .unwrap_or_else(|| state.config.public_base_url.clone());
            serde_json::to_value(SuccessEnvelope::new(ResetLinkData {
                email,
                reset_link: reset::reset_link(&base, &token),
                link_expired: reset::format_expiry(expires_at),
            }))
        }
    }
    .map_err(anyhow::Error::from)?;

    Ok(Json(body))
}

#[instrument(skip(state, token, payload))]
pub async fn reset_password(
    State(state): State<AppState>,
    Path(token): Path<String>,
    Json(payload): Json<ResetPasswordRequest>,
) -> AppResult<Json<serde_json::Value>> {
    let outcome = reset::consume_reset(
        state.store.as_ref(),
        &token,
        &payload.password,
        &payload.new_password,
        OffsetDateTime::now_utc(),
    )
    .await?;

    let body = match outcome {
        ResetOutcome::Expired => serde_json::to_value(MessageResponse::new(LINK_EXPIRED)),
        ResetOutcome::Reset => serde_json::to_value(SuccessEnvelope::new(MessageResponse::new(
            "Success reset password",
        ))),
    }
    .map_err(anyhow::Error::from)?;

    Ok(Json(body))
}

#[instrument(skip(req))]
pub async fn get_me(req: CommonRequest) -> Json<MeResponse> {
    let user = req.identity;
    Json(MeResponse {
        id: user.id,
        username: user.username,
        email: user.email,
        role: user.role,
    })
}
