use tracing::info;
use uuid::Uuid;

use super::repo_types::{Review, ReviewStats};
use crate::{
    auth::repo_types::User,
    error::AppResult,
    restaurants::{
        repo_types::Restaurant,
        services::{find_restaurant, parse_id},
    },
    store::Store,
};

/// Stores a review. `rating` is taken as given; the 1..=5 range is not enforced.
pub async fn create_review(
    store: &dyn Store,
    author: &User,
    restaurant_id: &str,
    rating: i32,
    content: &str,
) -> AppResult<(Review, Restaurant)> {
    let restaurant = find_restaurant(store, parse_id(restaurant_id, "restaurant")?).await?;
    let review = store
        .insert_review(author.id, restaurant.id, rating, content)
        .await?;
    info!(review_id = %review.id, restaurant_id = %restaurant.id, rating, "review created");
    Ok((review, restaurant))
}

/// Average rating and review count; `(0, 0)` when the restaurant has none.
pub async fn aggregate(store: &dyn Store, restaurant_id: Uuid) -> AppResult<ReviewStats> {
    let stats = store.review_stats(restaurant_id).await?;
    if stats.total_reviews == 0 {
        return Ok(ReviewStats::EMPTY);
    }
    Ok(stats)
}
