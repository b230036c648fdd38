use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::services::MenuItemInput;

#[derive(Debug, Deserialize)]
pub struct CreateRestaurantRequest {
    pub name: String,
    pub city: String,
}

#[derive(Debug, Serialize)]
pub struct RestaurantData {
    pub name: String,
    pub city: String,
}

#[derive(Debug, Serialize)]
pub struct CreatedRestaurantResponse {
    pub message: &'static str,
    pub data: RestaurantData,
}

#[derive(Debug, Deserialize)]
pub struct CreateMenusRequest {
    pub restaurant_id: String,
    #[serde(default)]
    pub menus: Vec<MenuItemInput>,
}

#[derive(Debug, Deserialize)]
pub struct DeleteMenuQuery {
    #[serde(default)]
    pub restaurant_id: String,
}

#[derive(Debug, Serialize)]
pub struct RestaurantListItem {
    pub id: Uuid,
    pub name: String,
    pub city: String,
    pub total_review: i64,
    pub rating_avg: f64,
}
