use axum::{
    extract::{Path, Query, State},
    routing::{delete, get, post},
    Json, Router,
};
use serde_json::{json, Value};
use tracing::instrument;

use super::{
    dto::{
        CreateMenusRequest, CreateRestaurantRequest, CreatedRestaurantResponse, DeleteMenuQuery,
        RestaurantData, RestaurantListItem,
    },
    services,
};
use crate::{
    auth::{
        extractors::{Admission, CommonRequest},
        MessageResponse, SuccessEnvelope,
    },
    error::AppResult,
    state::AppState,
};

pub const RESTAURANT_DENIED: &str = "Cannot add restaurant. Please contact admin or SuperAdmin";
pub const MENU_DENIED: &str = "Cannot add menu restaurant. Please contact admin or SuperAdmin";
pub const MENU_DELETE_DENIED: &str =
    "Cannot delete menu restaurant. Please contact admin or SuperAdmin";

pub fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/restaurant/create", post(create_restaurant))
        .route("/restaurant/create/menus", post(create_menus))
        .route("/restaurant/delete/menus/:id", delete(delete_menu))
}

pub fn public_routes() -> Router<AppState> {
    Router::new().route("/get_all_resto", get(list_restaurants))
}

#[instrument(skip(state, req, payload), fields(user_id = %req.identity.id))]
pub async fn create_restaurant(
    State(state): State<AppState>,
    req: CommonRequest,
    Json(payload): Json<CreateRestaurantRequest>,
) -> AppResult<Json<Value>> {
    let out =
        services::create_restaurant(state.store.as_ref(), &req, &payload.name, &payload.city)
            .await?;
    let body = match out {
        Admission::Denied => json!(MessageResponse::new(RESTAURANT_DENIED)),
        Admission::Granted(r) => json!(CreatedRestaurantResponse {
            message: "success create restaurant",
            data: RestaurantData {
                name: r.name,
                city: r.city,
            },
        }),
    };
    Ok(Json(body))
}

#[instrument(skip(state, req, payload), fields(user_id = %req.identity.id))]
pub async fn create_menus(
    State(state): State<AppState>,
    req: CommonRequest,
    Json(payload): Json<CreateMenusRequest>,
) -> AppResult<Json<MessageResponse>> {
    let out = services::add_menu_items(
        state.store.as_ref(),
        &req,
        &payload.restaurant_id,
        payload.menus,
    )
    .await?;
    let message = match out {
        Admission::Denied => MENU_DENIED.to_string(),
        Admission::Granted(rows) => format!("success create {rows} Menu restaurant"),
    };
    Ok(Json(MessageResponse::new(message)))
}

#[instrument(skip(state, req), fields(user_id = %req.identity.id))]
pub async fn delete_menu(
    State(state): State<AppState>,
    req: CommonRequest,
    Path(id): Path<String>,
    Query(q): Query<DeleteMenuQuery>,
) -> AppResult<Json<MessageResponse>> {
    if !req.is_admin {
        return Ok(Json(MessageResponse::new(MENU_DELETE_DENIED)));
    }
    services::delete_menu_item(state.store.as_ref(), &id, &q.restaurant_id).await?;
    Ok(Json(MessageResponse::new("success delete menu")))
}

#[instrument(skip(state))]
pub async fn list_restaurants(
    State(state): State<AppState>,
) -> AppResult<Json<SuccessEnvelope<Vec<RestaurantListItem>>>> {
    let rows = services::list_restaurants(state.store.as_ref()).await?;
    let items = rows
        .into_iter()
        .map(|(r, stats)| RestaurantListItem {
            id: r.id,
            name: r.name,
            city: r.city,
            total_review: stats.total_reviews,
            rating_avg: stats.rating_avg,
        })
        .collect();
    Ok(Json(SuccessEnvelope::new(items)))
}
