use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Review {
    pub id: Uuid,
    pub user_id: Uuid,
    pub restaurant_id: Uuid,
    pub rating: i32, // 1..=5 expected, not enforced on write
    pub content: String,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

/// Aggregate over a restaurant's reviews. `rating_avg` is 0 when there are none.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, FromRow, PartialEq)]
pub struct ReviewStats {
    pub rating_avg: f64,
    pub total_reviews: i64,
}

impl ReviewStats {
    pub const EMPTY: ReviewStats = ReviewStats {
        rating_avg: 0.0,
        total_reviews: 0,
    };
}
