//! Copyright (c) 2025-2026, Kirky.X
//!
//! MIT License
//!
//! 推荐服务：在启动时加载的只读表上线性扫描。

use crate::error::{ReservationError, Result};
use crate::model::RecommendationEntry;
use crate::store::CatalogStore;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use tracing::{info, instrument, warn};

const EARTH_RADIUS_KM: f64 = 6371.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecommendRequest {
    pub require: String,
    #[serde(default)]
    pub lat: f64,
    #[serde(default)]
    pub lon: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecommendResult {
    pub hotel_ids: Vec<String>,
}

/// 推荐依据
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Require {
    /// 距离最近
    Distance,
    /// 评分最高
    Rate,
    /// 价格最低
    Price,
}

impl FromStr for Require {
    type Err = ReservationError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "dis" => Ok(Require::Distance),
            "rate" => Ok(Require::Rate),
            "price" => Ok(Require::Price),
            other => Err(ReservationError::InvalidRequest(format!(
                "unknown recommendation requirement '{}'",
                other
            ))),
        }
    }
}

/// 两点间的大圆距离（公里）
pub fn haversine_km(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let (phi1, phi2) = (lat1.to_radians(), lat2.to_radians());
    let d_phi = (lat2 - lat1).to_radians();
    let d_lambda = (lon2 - lon1).to_radians();
    let a = (d_phi / 2.0).sin().powi(2) + phi1.cos() * phi2.cos() * (d_lambda / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_KM * a.sqrt().asin()
}

/// 推荐服务
#[derive(Debug, Default)]
pub struct RecommendationService {
    hotels: Vec<RecommendationEntry>,
}

impl RecommendationService {
    /// 从持久存储加载推荐表
    pub async fn load(store: &dyn CatalogStore) -> Result<Self> {
        let hotels = store.load_recommendations().await?;
        info!("Loaded {} recommendation entries", hotels.len());
        Ok(Self::from_entries(hotels))
    }

    pub fn from_entries(hotels: Vec<RecommendationEntry>) -> Self {
        Self { hotels }
    }

    /// 返回在所选维度上取得最优值的全部酒店
    ///
    /// 未知的 `require` 只记录警告并返回空结果。
    #[instrument(skip(self), level = "debug")]
    pub fn get_recommendations(&self, request: &RecommendRequest) -> RecommendResult {
        let require = match request.require.parse::<Require>() {
            Ok(require) => require,
            Err(e) => {
                warn!("{}", e);
                return RecommendResult {
                    hotel_ids: Vec::new(),
                };
            }
        };

        let score = |h: &RecommendationEntry| match require {
            Require::Distance => haversine_km(request.lat, request.lon, h.lat, h.lon),
            // 评分越高越好，取反后统一按最小值挑选
            Require::Rate => -h.rate,
            Require::Price => h.price,
        };

        let best = self
            .hotels
            .iter()
            .map(score)
            .fold(f64::INFINITY, f64::min);
        let hotel_ids = self
            .hotels
            .iter()
            .filter(|h| score(*h) == best)
            .map(|h| h.hotel_id.clone())
            .collect();
        RecommendResult { hotel_ids }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_require_parsing() {
        assert_eq!("dis".parse::<Require>().unwrap(), Require::Distance);
        assert_eq!("rate".parse::<Require>().unwrap(), Require::Rate);
        assert_eq!("price".parse::<Require>().unwrap(), Require::Price);
        assert!("cheap".parse::<Require>().is_err());
    }

    #[test]
    fn test_haversine_known_distance() {
        // 旧金山到洛杉矶约 559 公里
        let d = haversine_km(37.7749, -122.4194, 34.0522, -118.2437);
        assert!((d - 559.0).abs() < 5.0, "distance was {}", d);
        assert_eq!(haversine_km(10.0, 10.0, 10.0, 10.0), 0.0);
    }
}
