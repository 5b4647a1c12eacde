//! Copyright (c) 2025-2026, Kirky.X
//!
//! MIT License
//!
//! 评论服务，单键读穿透。

use crate::backend::FastCache;
use crate::cache_aside::{MissPolicy, ReadThrough, RecordLoader};
use crate::error::Result;
use crate::model::Review;
use crate::serialization::JsonSerializer;
use crate::store::CatalogStore;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::instrument;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewRequest {
    pub hotel_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewResult {
    pub reviews: Vec<Review>,
}

pub struct ReviewLoader {
    store: Arc<dyn CatalogStore>,
}

#[async_trait]
impl RecordLoader for ReviewLoader {
    type Id = String;
    type Value = Vec<Review>;

    fn cache_key(&self, id: &String) -> String {
        format!("reviews:{}", id)
    }

    async fn load(&self, id: &String) -> Result<Option<Vec<Review>>> {
        Ok(Some(self.store.find_reviews(id).await?))
    }
}

pub struct ReviewService {
    reviews: ReadThrough<ReviewLoader, JsonSerializer>,
}

impl ReviewService {
    pub fn new(cache: Arc<dyn FastCache>, store: Arc<dyn CatalogStore>) -> Self {
        Self {
            reviews: ReadThrough::new(
                "review",
                cache,
                ReviewLoader { store },
                JsonSerializer,
                MissPolicy::Degrade,
            ),
        }
    }

    /// 存储读取失败时返回空列表
    #[instrument(skip(self), level = "info")]
    pub async fn get_reviews(&self, request: &ReviewRequest) -> Result<ReviewResult> {
        let reviews = self
            .reviews
            .fetch_one(&request.hotel_id)
            .await?
            .unwrap_or_default();
        Ok(ReviewResult { reviews })
    }
}
