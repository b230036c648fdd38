use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    restaurants::repo_types::MenuItem,
    store::Store,
};

#[derive(Debug, Clone)]
pub struct PricedLine {
    pub item: MenuItem,
    pub quantity: i32,
    pub subtotal: i64,
}

#[derive(Debug, Clone)]
pub struct PricedOrder {
    pub lines: Vec<PricedLine>,
    pub total: i64,
}

/// `subtotal = price * quantity`. Quantity is not checked for sign.
pub async fn price_line(store: &dyn Store, menu_item_id: Uuid, quantity: i32) -> AppResult<PricedLine> {
    let item = store
        .find_menu_item(menu_item_id)
        .await?
        .ok_or_else(|| AppError::not_found("menu item not found"))?;
    let subtotal = item
        .price
        .checked_mul(i64::from(quantity))
        .ok_or_else(|| AppError::validation("order line price overflows"))?;
    Ok(PricedLine {
        item,
        quantity,
        subtotal,
    })
}

/// Prices lines in input order and stops at the first one that fails.
pub async fn price_order(store: &dyn Store, lines: &[(Uuid, i32)]) -> AppResult<PricedOrder> {
    let mut priced = Vec::with_capacity(lines.len());
    let mut total: i64 = 0;
    for &(menu_item_id, quantity) in lines {
        let line = price_line(store, menu_item_id, quantity).await?;
        total = total
            .checked_add(line.subtotal)
            .ok_or_else(|| AppError::validation("order total overflows"))?;
        priced.push(line);
    }
    Ok(PricedOrder {
        lines: priced,
        total,
    })
}
