use axum::{extract::State, routing::post, Json, Router};
use tracing::instrument;

use super::{
    dto::{CreateReviewRequest, ReviewResponse},
    services,
};
use crate::{
    auth::{extractors::CommonRequest, SuccessEnvelope},
    error::AppResult,
    state::AppState,
};

pub fn review_routes() -> Router<AppState> {
    Router::new().route("/user/send_review", post(send_review))
}

#[instrument(skip(state, req, payload), fields(user_id = %req.identity.id))]
pub async fn send_review(
    State(state): State<AppState>,
    req: CommonRequest,
    Json(payload): Json<CreateReviewRequest>,
) -> AppResult<Json<SuccessEnvelope<ReviewResponse>>> {
    let (review, restaurant) = services::create_review(
        state.store.as_ref(),
        &req.identity,
        &payload.restaurant_id,
        payload.rating,
        &payload.content,
    )
    .await?;

    Ok(Json(SuccessEnvelope::new(ReviewResponse {
        content: review.content,
        rating: review.rating,
        user: req.identity.username,
        restaurant: restaurant.name,
    })))
}
