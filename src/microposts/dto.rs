use serde::{Deserialize, Serialize};

use crate::microposts::repo_types::Micropost;

#[derive(Debug, Deserialize)]
pub struct CreateMicropostRequest {
    pub content: String,
}

#[derive(Debug, Serialize)]
pub struct FeedResponse {
    pub microposts: Vec<Micropost>,
}
