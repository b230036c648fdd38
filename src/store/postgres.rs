use anyhow::Context;
use async_trait::async_trait;
use sqlx::{postgres::PgPoolOptions, PgPool};
use time::OffsetDateTime;
use tracing::debug;
use uuid::Uuid;

use super::{Store, StoreError, StoreResult};
use crate::auth::repo_types::{NewUser, User};
use crate::config::AppConfig;
use crate::orders::repo_types::{NewOrder, Order, OrderLine};
use crate::restaurants::repo_types::{MenuItem, NewMenuItem, Restaurant};
use crate::reviews::repo_types::{Review, ReviewStats};

const USER_COLUMNS: &str = "id, username, email, password_hash, role, reset_token, \
                            reset_token_expires_at, created_at, updated_at";

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub async fn connect(config: &AppConfig) -> anyhow::Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(config.db_max_connections)
            .connect(&config.database_url)
            .await
            .context("connect to database")?;
        Ok(Self { pool })
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

/// Turns a unique-constraint violation into a `Conflict` naming the column.
fn map_unique(e: sqlx::Error) -> StoreError {
    if let sqlx::Error::Database(db) = &e {
        if db.code().as_deref() == Some("23505") {
            let msg = match db.constraint() {
                Some("users_username_key") => "username already taken",
                Some("users_email_key") => "email already registered",
                _ => "record already exists",
            };
            return StoreError::Conflict(msg.into());
        }
    }
    StoreError::Database(e)
}

#[async_trait]
impl Store for PgStore {
    async fn insert_user(&self, new: NewUser) -> StoreResult<User> {
        let sql = format!(
            "INSERT INTO users (username, email, password_hash, role) \
             VALUES ($1, $2, $3, $4) RETURNING {USER_COLUMNS}"
        );
        sqlx::query_as::<_, User>(&sql)
            .bind(&new.username)
            .bind(&new.email)
            .bind(&new.password_hash)
            .bind(new.role)
            .fetch_one(&self.pool)
            .await
            .map_err(map_unique)
    }

    async fn find_user_by_id(&self, id: Uuid) -> StoreResult<Option<User>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1");
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE email = $1");
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    async fn find_user_by_reset_token(&self, token: &str) -> StoreResult<Option<User>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE reset_token = $1");
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(token)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    async fn set_reset_token(
        &self,
        user_id: Uuid,
        token: &str,
        expires_at: OffsetDateTime,
    ) -> StoreResult<()> {
        sqlx::query(
            r#"
            UPDATE users
               SET reset_token = $2, reset_token_expires_at = $3, updated_at = now()
             WHERE id = $1
            "#,
        )
        .bind(user_id)
        .bind(token)
        .bind(expires_at)
        .execute(&self.pool)
        .await
        .map_err(map_unique)?;
        Ok(())
    }

    async fn clear_reset_token(&self, user_id: Uuid, token: &str) -> StoreResult<u64> {
        let done = sqlx::query(
            r#"
            UPDATE users
               SET reset_token = NULL, reset_token_expires_at = NULL, updated_at = now()
             WHERE id = $1 AND reset_token = $2
            "#,
        )
        .bind(user_id)
        .bind(token)
        .execute(&self.pool)
        .await?;
        Ok(done.rows_affected())
    }

    async fn rotate_password(
        &self,
        user_id: Uuid,
        token: &str,
        password_hash: &str,
    ) -> StoreResult<u64> {
        let done = sqlx::query(
            r#"
            UPDATE users
               SET password_hash = $3,
                   reset_token = NULL,
                   reset_token_expires_at = NULL,
                   updated_at = now()
             WHERE id = $1 AND reset_token = $2
            "#,
        )
        .bind(user_id)
        .bind(token)
        .bind(password_hash)
        .execute(&self.pool)
        .await?;
        Ok(done.rows_affected())
    }

    async fn insert_restaurant(
        &self,
        name: &str,
        city: &str,
        owner_id: Uuid,
    ) -> StoreResult<Restaurant> {
        let restaurant = sqlx::query_as::<_, Restaurant>(
            r#"
            INSERT INTO restaurants (name, city, user_id)
            VALUES ($1, $2, $3)
            RETURNING id, name, city, user_id, created_at, updated_at
            "#,
        )
        .bind(name)
        .bind(city)
        .bind(owner_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(restaurant)
    }

    async fn find_restaurant(&self, id: Uuid) -> StoreResult<Option<Restaurant>> {
        let restaurant = sqlx::query_as::<_, Restaurant>(
            r#"
            SELECT id, name, city, user_id, created_at, updated_at
              FROM restaurants
             WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(restaurant)
    }

    async fn list_restaurants(&self) -> StoreResult<Vec<Restaurant>> {
        let rows = sqlx::query_as::<_, Restaurant>(
            r#"
            SELECT id, name, city, user_id, created_at, updated_at
              FROM restaurants
             ORDER BY created_at ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn insert_menu_items(
        &self,
        restaurant_id: Uuid,
        items: &[NewMenuItem],
    ) -> StoreResult<u64> {
        let mut tx = self.pool.begin().await?;
        let mut rows = 0;
        for item in items {
            rows += sqlx::query(
                r#"
                INSERT INTO menu_items (restaurant_id, name, description, price)
                VALUES ($1, $2, $3, $4)
                "#,
            )
            .bind(restaurant_id)
            .bind(&item.name)
            .bind(&item.description)
            .bind(item.price)
            .execute(&mut *tx)
            .await?
            .rows_affected();
        }
        tx.commit().await?;
        debug!(%restaurant_id, rows, "menu items inserted");
        Ok(rows)
    }

    async fn find_menu_item(&self, id: Uuid) -> StoreResult<Option<MenuItem>> {
        let item = sqlx::query_as::<_, MenuItem>(
            r#"
            SELECT id, restaurant_id, name, description, price, created_at, updated_at
              FROM menu_items
             WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(item)
    }

    async fn delete_menu_item(&self, id: Uuid, restaurant_id: Uuid) -> StoreResult<u64> {
        let done = sqlx::query("DELETE FROM menu_items WHERE id = $1 AND restaurant_id = $2")
            .bind(id)
            .bind(restaurant_id)
            .execute(&self.pool)
            .await?;
        Ok(done.rows_affected())
    }

    async fn insert_order(&self, order: NewOrder) -> StoreResult<Order> {
        // Any failed line returns before `commit`; dropping `tx` rolls back the order row.
        let mut tx = self.pool.begin().await?;

        let mut saved = sqlx::query_as::<_, Order>(
            r#"
            INSERT INTO orders (user_id, restaurant_id, total_price)
            VALUES ($1, $2, $3)
            RETURNING id, user_id, restaurant_id, total_price, created_at, updated_at
            "#,
        )
        .bind(order.user_id)
        .bind(order.restaurant_id)
        .bind(order.total_price)
        .fetch_one(&mut *tx)
        .await?;

        for (position, line) in order.lines.iter().enumerate() {
            sqlx::query(
                r#"
                INSERT INTO order_items
                    (order_id, position, menu_item_id, name, quantity, unit_price, subtotal)
                VALUES ($1, $2, $3, $4, $5, $6, $7)
                "#,
            )
            .bind(saved.id)
            .bind(position as i32)
            .bind(line.menu_item_id)
            .bind(&line.name)
            .bind(line.quantity)
            .bind(line.unit_price)
            .bind(line.subtotal)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        saved.lines = order
            .lines
            .into_iter()
            .map(|l| OrderLine {
                order_id: saved.id,
                menu_item_id: Some(l.menu_item_id),
                name: l.name,
                quantity: l.quantity,
                unit_price: l.unit_price,
                subtotal: l.subtotal,
            })
            .collect();
        Ok(saved)
    }

    async fn orders_for_restaurant(&self, restaurant_id: Uuid) -> StoreResult<Vec<Order>> {
        let mut orders = sqlx::query_as::<_, Order>(
            r#"
            SELECT id, user_id, restaurant_id, total_price, created_at, updated_at
              FROM orders
             WHERE restaurant_id = $1
             ORDER BY created_at ASC
            "#,
        )
        .bind(restaurant_id)
        .fetch_all(&self.pool)
        .await?;

        if orders.is_empty() {
            return Ok(orders);
        }

        let ids: Vec<Uuid> = orders.iter().map(|o| o.id).collect();
        let lines = sqlx::query_as::<_, OrderLine>(
            r#"
            SELECT order_id, menu_item_id, name, quantity, unit_price, subtotal
              FROM order_items
             WHERE order_id = ANY($1)
             ORDER BY order_id, position
            "#,
        )
        .bind(&ids)
        .fetch_all(&self.pool)
        .await?;

        for line in lines {
            if let Some(order) = orders.iter_mut().find(|o| o.id == line.order_id) {
                order.lines.push(line);
            }
        }
        Ok(orders)
    }

    async fn insert_review(
        &self,
        user_id: Uuid,
        restaurant_id: Uuid,
        rating: i32,
        content: &str,
    ) -> StoreResult<Review> {
        let review = sqlx::query_as::<_, Review>(
            r#"
            INSERT INTO reviews (user_id, restaurant_id, rating, content)
            VALUES ($1, $2, $3, $4)
            RETURNING id, user_id, restaurant_id, rating, content, created_at, updated_at
            "#,
        )
        .bind(user_id)
        .bind(restaurant_id)
        .bind(rating)
        .bind(content)
        .fetch_one(&self.pool)
        .await?;
        Ok(review)
    }

    async fn review_stats(&self, restaurant_id: Uuid) -> StoreResult<ReviewStats> {
        let stats = sqlx::query_as::<_, ReviewStats>(
            r#"
            SELECT COALESCE(AVG(rating)::FLOAT8, 0) AS rating_avg,
                   COUNT(*)                          AS total_reviews
              FROM reviews
             WHERE restaurant_id = $1
            "#,
        )
        .bind(restaurant_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(stats)
    }
}
