use crate::state::AppState;
use axum::Router;

pub mod credentials;
mod dto;
pub mod extractors;
pub mod handlers;
pub mod jwt;
pub mod repo_types;
pub mod reset;
pub mod services;

pub(crate) use dto::{MessageResponse, SuccessEnvelope};

pub fn router() -> Router<AppState> {
    Router::new()
        .merge(handlers::auth_routes())
        .merge(handlers::me_routes())
}
