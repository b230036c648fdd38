use axum::{
    extract::{Path, State},
    routing::{get, post},
    Json, Router,
};
use tracing::instrument;

use super::{
    dto::{CreateOrderRequest, OrderView},
    services,
};
use crate::{
    auth::{extractors::CommonRequest, SuccessEnvelope},
    error::AppResult,
    state::AppState,
};

pub fn order_routes() -> Router<AppState> {
    Router::new()
        .route("/user/create/orders", post(create_order))
        .route("/user/show/order/:id/restaurant", get(show_orders_by_restaurant))
}

#[instrument(skip(state, req, payload), fields(user_id = %req.identity.id))]
pub async fn create_order(
    State(state): State<AppState>,
    req: CommonRequest,
    Json(payload): Json<CreateOrderRequest>,
) -> AppResult<Json<SuccessEnvelope<OrderView>>> {
    let order = services::create_order(
        state.store.as_ref(),
        &req.identity,
        &payload.restaurant_id,
        &payload.order_menu,
    )
    .await?;
    Ok(Json(SuccessEnvelope::new(order.into())))
}

#[instrument(skip(state, req), fields(user_id = %req.identity.id))]
pub async fn show_orders_by_restaurant(
    State(state): State<AppState>,
    req: CommonRequest,
    Path(id): Path<String>,
) -> AppResult<Json<SuccessEnvelope<Vec<OrderView>>>> {
    let orders = services::orders_for_restaurant(state.store.as_ref(), &id).await?;
    Ok(Json(SuccessEnvelope::new(
        orders.into_iter().map(OrderView::from).collect(),
    )))
}
