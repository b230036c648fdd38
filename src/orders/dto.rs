use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use super::repo_types::{Order, OrderLine};
use super::services::OrderLineInput;

#[derive(Debug, Deserialize)]
pub struct CreateOrderRequest {
    pub restaurant_id: String,
    #[serde(default)]
    pub order_menu: Vec<OrderLineInput>,
}

#[derive(Debug, Serialize)]
pub struct OrderLineView {
    pub menu_item_id: Option<Uuid>,
    pub name: String,
    pub quantity: i32,
    pub unit_price: i64,
    pub subtotal: i64,
}

impl From<OrderLine> for OrderLineView {
    fn from(l: OrderLine) -> Self {
        Self {
            menu_item_id: l.menu_item_id,
            name: l.name,
            quantity: l.quantity,
            unit_price: l.unit_price,
            subtotal: l.subtotal,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct OrderView {
    pub id: Uuid,
    pub user_id: Uuid,
    pub restaurant_id: Uuid,
    pub total_price: i64,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    pub order: Vec<OrderLineView>,
}

impl From<Order> for OrderView {
    fn from(o: Order) -> Self {
        Self {
            id: o.id,
            user_id: o.user_id,
            restaurant_id: o.restaurant_id,
            total_price: o.total_price,
            created_at: o.created_at,
            order: o.lines.into_iter().map(OrderLineView::from).collect(),
        }
    }
}
