use std::sync::Mutex;

use async_trait::async_trait;
use time::OffsetDateTime;
use uuid::Uuid;

use super::{Store, StoreError, StoreResult};
use crate::auth::repo_types::{NewUser, User};
use crate::orders::repo_types::{NewOrder, Order, OrderLine};
use crate::restaurants::repo_types::{MenuItem, NewMenuItem, Restaurant};
use crate::reviews::repo_types::{Review, ReviewStats};

/// In-process store for tests. Each write is applied under one lock, so a
/// multi-row write is either fully visible or not at all.
#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Tables>,
}

#[derive(Default)]
struct Tables {
    users: Vec<User>,
    restaurants: Vec<Restaurant>,
    menu_items: Vec<MenuItem>,
    orders: Vec<Order>,
    reviews: Vec<Review>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn tables(&self) -> std::sync::MutexGuard<'_, Tables> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn restaurant_count(&self) -> usize {
        self.tables().restaurants.len()
    }

    pub fn order_count(&self) -> usize {
        self.tables().orders.len()
    }

    pub fn order_line_count(&self) -> usize {
        self.tables().orders.iter().map(|o| o.lines.len()).sum()
    }

    pub fn menu_items_of(&self, restaurant_id: Uuid) -> Vec<MenuItem> {
        self.tables()
            .menu_items
            .iter()
            .filter(|m| m.restaurant_id == restaurant_id)
            .cloned()
            .collect()
    }
}

fn now() -> OffsetDateTime {
    OffsetDateTime::now_utc()
}

#[async_trait]
impl Store for MemoryStore {
    async fn insert_user(&self, new: NewUser) -> StoreResult<User> {
        let mut t = self.tables();
        if t.users.iter().any(|u| u.username == new.username) {
            return Err(StoreError::Conflict("username already taken".into()));
        }
        if t.users.iter().any(|u| u.email == new.email) {
            return Err(StoreError::Conflict("email already registered".into()));
        }
        let user = User {
            id: Uuid::new_v4(),
            username: new.username,
            email: new.email,
            password_hash: new.password_hash,
            role: new.role,
            reset_token: None,
            reset_token_expires_at: None,
            created_at: now(),
            updated_at: now(),
        };
        t.users.push(user.clone());
        Ok(user)
    }

    async fn find_user_by_id(&self, id: Uuid) -> StoreResult<Option<User>> {
        Ok(self.tables().users.iter().find(|u| u.id == id).cloned())
    }

    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        Ok(self.tables().users.iter().find(|u| u.email == email).cloned())
    }

    async fn find_user_by_reset_token(&self, token: &str) -> StoreResult<Option<User>> {
        Ok(self
            .tables()
            .users
            .iter()
            .find(|u| u.reset_token.as_deref() == Some(token))
            .cloned())
    }

    async fn set_reset_token(
        &self,
        user_id: Uuid,
        token: &str,
        expires_at: OffsetDateTime,
    ) -> StoreResult<()> {
        let mut t = self.tables();
        if let Some(u) = t.users.iter_mut().find(|u| u.id == user_id) {
            u.reset_token = Some(token.to_string());
            u.reset_token_expires_at = Some(expires_at);
            u.updated_at = now();
        }
        Ok(())
    }

    async fn clear_reset_token(&self, user_id: Uuid, token: &str) -> StoreResult<u64> {
        let mut t = self.tables();
        let Some(u) = t
            .users
            .iter_mut()
            .find(|u| u.id == user_id && u.reset_token.as_deref() == Some(token))
        else {
            return Ok(0);
        };
        u.reset_token = None;
        u.reset_token_expires_at = None;
        u.updated_at = now();
        Ok(1)
    }

    async fn rotate_password(
        &self,
        user_id: Uuid,
        token: &str,
        password_hash: &str,
    ) -> StoreResult<u64> {
        let mut t = self.tables();
        let Some(u) = t
            .users
            .iter_mut()
            .find(|u| u.id == user_id && u.reset_token.as_deref() == Some(token))
        else {
            return Ok(0);
        };
        u.password_hash = password_hash.to_string();
        u.reset_token = None;
        u.reset_token_expires_at = None;
        u.updated_at = now();
        Ok(1)
    }

    async fn insert_restaurant(
        &self,
        name: &str,
        city: &str,
        owner_id: Uuid,
    ) -> StoreResult<Restaurant> {
        let restaurant = Restaurant {
            id: Uuid::new_v4(),
            name: name.to_string(),
            city: city.to_string(),
            user_id: owner_id,
            created_at: now(),
            updated_at: now(),
        };
        self.tables().restaurants.push(restaurant.clone());
        Ok(restaurant)
    }

    async fn find_restaurant(&self, id: Uuid) -> StoreResult<Option<Restaurant>> {
        Ok(self.tables().restaurants.iter().find(|r| r.id == id).cloned())
    }

    async fn list_restaurants(&self) -> StoreResult<Vec<Restaurant>> {
        Ok(self.tables().restaurants.clone())
    }

    async fn insert_menu_items(
        &self,
        restaurant_id: Uuid,
        items: &[NewMenuItem],
    ) -> StoreResult<u64> {
        let staged: Vec<MenuItem> = items
            .iter()
            .map(|i| MenuItem {
                id: Uuid::new_v4(),
                restaurant_id,
                name: i.name.clone(),
                description: i.description.clone(),
                price: i.price,
                created_at: now(),
                updated_at: now(),
            })
            .collect();
        let rows = staged.len() as u64;
        self.tables().menu_items.extend(staged);
        Ok(rows)
    }

    async fn find_menu_item(&self, id: Uuid) -> StoreResult<Option<MenuItem>> {
        Ok(self.tables().menu_items.iter().find(|m| m.id == id).cloned())
    }

    async fn delete_menu_item(&self, id: Uuid, restaurant_id: Uuid) -> StoreResult<u64> {
        let mut t = self.tables();
        let before = t.menu_items.len();
        t.menu_items
            .retain(|m| !(m.id == id && m.restaurant_id == restaurant_id));
        let removed = (before - t.menu_items.len()) as u64;
        if removed > 0 {
            for line in t.orders.iter_mut().flat_map(|o| o.lines.iter_mut()) {
                if line.menu_item_id == Some(id) {
                    line.menu_item_id = None;
                }
            }
        }
        Ok(removed)
    }

    async fn insert_order(&self, order: NewOrder) -> StoreResult<Order> {
        let id = Uuid::new_v4();
        let saved = Order {
            id,
            user_id: order.user_id,
            restaurant_id: order.restaurant_id,
            total_price: order.total_price,
            created_at: now(),
            updated_at: now(),
            lines: order
                .lines
                .into_iter()
                .map(|l| OrderLine {
                    order_id: id,
                    menu_item_id: Some(l.menu_item_id),
                    name: l.name,
                    quantity: l.quantity,
                    unit_price: l.unit_price,
                    subtotal: l.subtotal,
                })
                .collect(),
        };
        self.tables().orders.push(saved.clone());
        Ok(saved)
    }

    async fn orders_for_restaurant(&self, restaurant_id: Uuid) -> StoreResult<Vec<Order>> {
        Ok(self
            .tables()
            .orders
            .iter()
            .filter(|o| o.restaurant_id == restaurant_id)
            .cloned()
            .collect())
    }

    async fn insert_review(
        &self,
        user_id: Uuid,
        restaurant_id: Uuid,
        rating: i32,
        content: &str,
    ) -> StoreResult<Review> {
        let review = Review {
            id: Uuid::new_v4(),
            user_id,
            restaurant_id,
            rating,
            content: content.to_string(),
            created_at: now(),
            updated_at: now(),
        };
        self.tables().reviews.push(review.clone());
        Ok(review)
    }

    async fn review_stats(&self, restaurant_id: Uuid) -> StoreResult<ReviewStats> {
        let t = self.tables();
        let ratings: Vec<i32> = t
            .reviews
            .iter()
            .filter(|r| r.restaurant_id == restaurant_id)
            .map(|r| r.rating)
            .collect();
        if ratings.is_empty() {
            return Ok(ReviewStats::EMPTY);
        }
        let sum: i64 = ratings.iter().map(|&r| i64::from(r)).sum();
        Ok(ReviewStats {
            rating_avg: sum as f64 / ratings.len() as f64,
            total_reviews: ratings.len() as i64,
        })
    }
}
