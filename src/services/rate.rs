//! Copyright (c) 2025-2026, Kirky.X
//!
//! MIT License
//!
//! 价格计划服务。

use crate::backend::FastCache;
use crate::cache_aside::{MissPolicy, ReadThrough, RecordLoader};
use crate::error::Result;
use crate::model::RatePlan;
use crate::serialization::JsonSerializer;
use crate::store::CatalogStore;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, instrument};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RateRequest {
    pub hotel_ids: Vec<String>,
    pub in_date: String,
    pub out_date: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RateResult {
    pub rate_plans: Vec<RatePlan>,
}

pub struct RatePlanLoader {
    store: Arc<dyn CatalogStore>,
}

#[async_trait]
impl RecordLoader for RatePlanLoader {
    type Id = String;
    type Value = Vec<RatePlan>;

    fn cache_key(&self, id: &String) -> String {
        format!("rates:{}", id)
    }

    // 没有价格计划的酒店也缓存为空列表
    async fn load(&self, id: &String) -> Result<Option<Vec<RatePlan>>> {
        Ok(Some(self.store.find_rate_plans(id).await?))
    }
}

/// 价格计划服务
pub struct RateService {
    rates: ReadThrough<RatePlanLoader, JsonSerializer>,
}

impl RateService {
    pub fn new(cache: Arc<dyn FastCache>, store: Arc<dyn CatalogStore>) -> Self {
        Self {
            rates: ReadThrough::new(
                "rate",
                cache,
                RatePlanLoader { store },
                JsonSerializer,
                MissPolicy::Degrade,
            ),
        }
    }

    /// 返回所请求酒店的全部价格计划，按总价降序，总价相同时保持请求顺序
    #[instrument(skip(self, request), level = "info", fields(count = request.hotel_ids.len()))]
    pub async fn get_rates(&self, request: &RateRequest) -> Result<RateResult> {
        debug!(
            "Rate lookup for {} to {}",
            request.in_date, request.out_date
        );
        let mut found = self.rates.fetch_many(&request.hotel_ids).await?;
        let mut rate_plans: Vec<RatePlan> = request
            .hotel_ids
            .iter()
            .filter_map(|id| found.remove(id))
            .flatten()
            .collect();
        sort_by_total_rate(&mut rate_plans);
        Ok(RateResult { rate_plans })
    }
}

/// 稳定排序，总价降序
pub fn sort_by_total_rate(plans: &mut [RatePlan]) {
    plans.sort_by(|a, b| b.room_type.total_rate.total_cmp(&a.room_type.total_rate));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::RoomType;

    fn plan(hotel_id: &str, code: &str, total_rate: f64) -> RatePlan {
        RatePlan {
            hotel_id: hotel_id.to_string(),
            code: code.to_string(),
            in_date: "2015-04-09".to_string(),
            out_date: "2015-04-10".to_string(),
            room_type: RoomType {
                bookable_rate: total_rate,
                total_rate,
                total_rate_inclusive: total_rate,
                code: "KNG".to_string(),
                currency: "USD".to_string(),
                room_description: "King sized bed".to_string(),
            },
        }
    }

    #[test]
    fn test_sort_is_descending_and_stable() {
        let mut plans = vec![
            plan("1", "a", 100.0),
            plan("2", "b", 250.5),
            plan("3", "c", 100.0),
            plan("4", "d", 300.0),
        ];
        sort_by_total_rate(&mut plans);
        let codes: Vec<&str> = plans.iter().map(|p| p.code.as_str()).collect();
        assert_eq!(codes, vec!["d", "b", "a", "c"]);
    }
}
