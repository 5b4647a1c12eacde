//! Copyright (c) 2025-2026, Kirky.X
//!
//! MIT License
//!
//! 酒店资料服务。

use crate::backend::FastCache;
use crate::cache_aside::{MissPolicy, ReadThrough, RecordLoader};
use crate::error::Result;
use crate::model::HotelProfile;
use crate::serialization::JsonSerializer;
use crate::store::CatalogStore;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::instrument;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileRequest {
    pub hotel_ids: Vec<String>,
    #[serde(default)]
    pub locale: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileResult {
    pub hotels: Vec<HotelProfile>,
}

pub struct ProfileLoader {
    store: Arc<dyn CatalogStore>,
}

#[async_trait]
impl RecordLoader for ProfileLoader {
    type Id = String;
    type Value = HotelProfile;

    fn cache_key(&self, id: &String) -> String {
        format!("profile:{}", id)
    }

    async fn load(&self, id: &String) -> Result<Option<HotelProfile>> {
        self.store.find_profile(id).await
    }
}

/// 酒店资料服务
pub struct ProfileService {
    profiles: ReadThrough<ProfileLoader, JsonSerializer>,
}

impl ProfileService {
    pub fn new(cache: Arc<dyn FastCache>, store: Arc<dyn CatalogStore>) -> Self {
        Self {
            profiles: ReadThrough::new(
                "profile",
                cache,
                ProfileLoader { store },
                JsonSerializer,
                MissPolicy::Degrade,
            ),
        }
    }

    /// 按请求顺序返回资料，存储无法提供的酒店被跳过
    #[instrument(skip(self, request), level = "info", fields(count = request.hotel_ids.len()))]
    pub async fn get_profiles(&self, request: &ProfileRequest) -> Result<ProfileResult> {
        let mut found = self.profiles.fetch_many(&request.hotel_ids).await?;
        let hotels = request
            .hotel_ids
            .iter()
            .filter_map(|id| found.remove(id))
            .collect();
        Ok(ProfileResult { hotels })
    }
}
