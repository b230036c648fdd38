use serde::Deserialize;
use tracing::{info, warn};

use super::{
    pricing::price_order,
    repo_types::{NewOrder, NewOrderLine, Order},
};
use crate::{
    auth::repo_types::User,
    error::{AppError, AppResult},
    restaurants::services::{find_restaurant, parse_id},
    store::Store,
};

/// Value clients send when no restaurant was picked.
pub const ABSENT_RESTAURANT: &str = "nil";

#[derive(Debug, Clone, Deserialize)]
pub struct OrderLineInput {
    pub id: String,
    pub quantity: i32,
}

/// Prices every line, then writes the order and its lines in one transaction.
/// Nothing is written if any line fails to resolve.
pub async fn create_order(
    store: &dyn Store,
    buyer: &User,
    restaurant_id: &str,
    lines: &[OrderLineInput],
) -> AppResult<Order> {
    let restaurant_id = restaurant_id.trim();
    if restaurant_id.is_empty() || restaurant_id == ABSENT_RESTAURANT {
        return Err(AppError::validation("Restaurant not found"));
    }
    let restaurant = find_restaurant(store, parse_id(restaurant_id, "restaurant")?).await?;

    let requested = lines
        .iter()
        .map(|l| Ok((parse_id(&l.id, "menu item")?, l.quantity)))
        .collect::<AppResult<Vec<_>>>()?;
    let priced = price_order(store, &requested).await?;

    if let Some(foreign) = priced.lines.iter().find(|l| l.item.restaurant_id != restaurant.id) {
        warn!(menu_item_id = %foreign.item.id, restaurant_id = %restaurant.id, "menu item from another restaurant");
        return Err(AppError::not_found("menu item not found in this restaurant"));
    }

    let order = store
        .insert_order(NewOrder {
            user_id: buyer.id,
            restaurant_id: restaurant.id,
            total_price: priced.total,
            lines: priced
                .lines
                .into_iter()
                .map(|l| NewOrderLine {
                    menu_item_id: l.item.id,
                    name: l.item.name,
                    quantity: l.quantity,
                    unit_price: l.item.price,
                    subtotal: l.subtotal,
                })
                .collect(),
        })
        .await?;

    info!(order_id = %order.id, user_id = %buyer.id, restaurant_id = %restaurant.id, total = order.total_price, "order created");
    Ok(order)
}

/// Orders of one restaurant with their lines. An empty result is reported
/// as not found, like a failed lookup.
pub async fn orders_for_restaurant(store: &dyn Store, restaurant_id: &str) -> AppResult<Vec<Order>> {
    let not_found = || AppError::not_found("Record not found!");
    let id = parse_id(restaurant_id, "restaurant").map_err(|_| not_found())?;
    let orders = store.orders_for_restaurant(id).await.map_err(|e| {
        warn!(error = %e, restaurant_id = %id, "orders lookup failed");
        not_found()
    })?;
    if orders.is_empty() {
        return Err(not_found());
    }
    Ok(orders)
}
