//! Persistence capability handed to every service call.
//!
//! Services never reach for a global pool; they receive `&dyn Store` and only
//! see the operations below. Every method that writes more than one row runs
//! in a single transaction, so a concurrent reader never sees half of it.
//! That holds for `PgStore`; `MemoryStore` applies each write under one lock.

use async_trait::async_trait;
use thiserror::Error;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::auth::repo_types::{NewUser, User};
use crate::orders::repo_types::{NewOrder, Order};
use crate::restaurants::repo_types::{MenuItem, NewMenuItem, Restaurant};
use crate::reviews::repo_types::{Review, ReviewStats};

#[cfg(test)]
pub mod memory;
pub mod postgres;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("{0}")]
    Conflict(String),

    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;

#[async_trait]
pub trait Store: Send + Sync {
    async fn insert_user(&self, new: NewUser) -> StoreResult<User>;
    async fn find_user_by_id(&self, id: Uuid) -> StoreResult<Option<User>>;
    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>>;
    async fn find_user_by_reset_token(&self, token: &str) -> StoreResult<Option<User>>;
    /// Stores token and expiry together, replacing any previous pair.
    async fn set_reset_token(
        &self,
        user_id: Uuid,
        token: &str,
        expires_at: OffsetDateTime,
    ) -> StoreResult<()>;
    /// Clears the pending pair only while `token` is still the stored one;
    /// returns rows changed.
    async fn clear_reset_token(&self, user_id: Uuid, token: &str) -> StoreResult<u64>;
    /// Replaces the password digest and clears the pending reset token, but
    /// only while `token` is still the stored one; returns rows changed.
    async fn rotate_password(
        &self,
        user_id: Uuid,
        token: &str,
        password_hash: &str,
    ) -> StoreResult<u64>;

    async fn insert_restaurant(&self, name: &str, city: &str, owner_id: Uuid)
        -> StoreResult<Restaurant>;
    async fn find_restaurant(&self, id: Uuid) -> StoreResult<Option<Restaurant>>;
    /// All restaurants in insertion order.
    async fn list_restaurants(&self) -> StoreResult<Vec<Restaurant>>;

    /// Inserts the whole batch or nothing; returns rows written.
    async fn insert_menu_items(&self, restaurant_id: Uuid, items: &[NewMenuItem])
        -> StoreResult<u64>;
    async fn find_menu_item(&self, id: Uuid) -> StoreResult<Option<MenuItem>>;
    /// Deletes only when the item belongs to `restaurant_id`; returns rows removed.
    async fn delete_menu_item(&self, id: Uuid, restaurant_id: Uuid) -> StoreResult<u64>;

    /// Writes the order row and all of its lines atomically.
    async fn insert_order(&self, order: NewOrder) -> StoreResult<Order>;
    async fn orders_for_restaurant(&self, restaurant_id: Uuid) -> StoreResult<Vec<Order>>;

    async fn insert_review(
        &self,
        user_id: Uuid,
        restaurant_id: Uuid,
        rating: i32,
        content: &str,
    ) -> StoreResult<Review>;
    /// Average rating and count for one restaurant, computed in one pass.
    async fn review_stats(&self, restaurant_id: Uuid) -> StoreResult<ReviewStats>;
}
