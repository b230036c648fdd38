use serde::Deserialize;
use tracing::{info, warn};
use uuid::Uuid;

use super::repo_types::{NewMenuItem, Restaurant};
use crate::{
    auth::extractors::{Admission, CommonRequest},
    error::{AppError, AppResult},
    reviews::{repo_types::ReviewStats, services::aggregate},
    store::Store,
};

/// Ids arrive as strings; anything that is not a UUID cannot name a row.
pub(crate) fn parse_id(raw: &str, what: &str) -> AppResult<Uuid> {
    raw.trim()
        .parse::<Uuid>()
        .map_err(|_| AppError::not_found(format!("{what} not found")))
}

/// Menu prices come in as strings (or plain numbers from newer clients).
/// An absent or `null` price is `Missing`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(untagged)]
pub enum PriceInput {
    Number(i64),
    Text(String),
    #[default]
    Missing,
}

impl PriceInput {
    /// Unparsable or negative prices become 0 rather than failing the batch.
    pub fn to_price(&self) -> i64 {
        let parsed = match self {
            PriceInput::Number(n) => Some(*n),
            PriceInput::Text(s) => s.trim().parse::<i64>().ok(),
            PriceInput::Missing => None,
        };
        match parsed {
            Some(p) if p >= 0 => p,
            _ => {
                warn!(price = ?self, "unparsable menu price coerced to 0");
                0
            }
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct MenuItemInput {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub price: PriceInput,
}

pub async fn create_restaurant(
    store: &dyn Store,
    requester: &CommonRequest,
    name: &str,
    city: &str,
) -> AppResult<Admission<Restaurant>> {
    if !requester.is_admin {
        warn!(user_id = %requester.identity.id, "non-admin tried to create restaurant");
        return Ok(Admission::Denied);
    }
    let restaurant = store
        .insert_restaurant(name.trim(), city.trim(), requester.identity.id)
        .await?;
    info!(restaurant_id = %restaurant.id, owner = %requester.identity.id, "restaurant created");
    Ok(Admission::Granted(restaurant))
}

pub async fn find_restaurant(store: &dyn Store, id: Uuid) -> AppResult<Restaurant> {
    store
        .find_restaurant(id)
        .await?
        .ok_or_else(|| AppError::not_found("restaurant not found"))
}

/// Adds a batch of menu items in one transaction; returns rows written.
pub async fn add_menu_items(
    store: &dyn Store,
    requester: &CommonRequest,
    restaurant_id: &str,
    items: Vec<MenuItemInput>,
) -> AppResult<Admission<u64>> {
    if !requester.is_admin {
        warn!(user_id = %requester.identity.id, "non-admin tried to add menu items");
        return Ok(Admission::Denied);
    }
    let restaurant = find_restaurant(store, parse_id(restaurant_id, "restaurant")?).await?;

    let batch: Vec<NewMenuItem> = items
        .into_iter()
        .map(|i| NewMenuItem {
            price: i.price.to_price(),
            name: i.name,
            description: i.description,
        })
        .collect();
    let rows = store.insert_menu_items(restaurant.id, &batch).await?;
    info!(restaurant_id = %restaurant.id, rows, "menu items created");
    Ok(Admission::Granted(rows))
}

/// Removes a menu item only if it belongs to `restaurant_id`.
pub async fn delete_menu_item(store: &dyn Store, id: &str, restaurant_id: &str) -> AppResult<()> {
    let id = parse_id(id, "menu item")?;
    let restaurant_id = parse_id(restaurant_id, "menu item")?;
    match store.delete_menu_item(id, restaurant_id).await? {
        0 => Err(AppError::not_found("menu item not found")),
        _ => {
            info!(menu_item_id = %id, %restaurant_id, "menu item deleted");
            Ok(())
        }
    }
}

/// Every restaurant in insertion order with its review aggregate.
pub async fn list_restaurants(store: &dyn Store) -> AppResult<Vec<(Restaurant, ReviewStats)>> {
    let restaurants = store.list_restaurants().await?;
    let mut out = Vec::with_capacity(restaurants.len());
    for r in restaurants {
        let stats = aggregate(store, r.id).await?;
        out.push((r, stats));
    }
    Ok(out)
}
