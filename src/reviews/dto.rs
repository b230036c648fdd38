use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
pub struct CreateReviewRequest {
    pub restaurant_id: String,
    pub rating: i32,
    #[serde(default)]
    pub content: String,
}

#[derive(Debug, Serialize)]
pub struct ReviewResponse {
    pub content: String,
    pub rating: i32,
    pub user: String,
    pub restaurant: String,
}
