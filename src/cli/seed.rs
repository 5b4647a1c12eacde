//! Copyright (c) 2025-2026, Kirky.X
//!
//! MIT License
//!
//! 建表与种子数据导入。

use super::{InitDbArgs, SeedCapacityArgs};
use crate::config::Config;
use crate::error::{ReservationError, Result};
use crate::manager::connect_store;
use crate::model::{
    HotelCapacity, HotelProfile, RatePlan, RecommendationEntry, Review, UserCredential,
};
use crate::services::user::hash_password;
use crate::store::{BookingStore, CatalogStore};
use serde::{Deserialize, Serialize};
use tracing::info;

/// 种子文件中的用户，密码为明文，导入时转换为摘要
#[derive(Debug, Clone, Deserialize)]
pub struct SeedUser {
    pub username: String,
    pub password: String,
}

/// JSON 种子文件
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SeedData {
    pub capacities: Vec<HotelCapacity>,
    pub profiles: Vec<HotelProfile>,
    pub rate_plans: Vec<RatePlan>,
    pub reviews: Vec<Review>,
    pub users: Vec<SeedUser>,
    pub recommendations: Vec<RecommendationEntry>,
}

/// 导入的记录数
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SeedSummary {
    pub capacities: usize,
    pub profiles: usize,
    pub rate_plans: usize,
    pub reviews: usize,
    pub users: usize,
    pub recommendations: usize,
}

impl SeedData {
    pub fn from_json(text: &str) -> Result<Self> {
        serde_json::from_str(text).map_err(|e| ReservationError::Serialization(e.to_string()))
    }

    /// 写入存储，已有的同键记录被覆盖
    pub async fn apply<S>(&self, store: &S) -> Result<SeedSummary>
    where
        S: BookingStore + CatalogStore + ?Sized,
    {
        for capacity in &self.capacities {
            store.put_capacity(capacity).await?;
        }
        for profile in &self.profiles {
            store.put_profile(profile).await?;
        }
        for plan in &self.rate_plans {
            store.put_rate_plan(plan).await?;
        }
        for review in &self.reviews {
            store.put_review(review).await?;
        }
        for user in &self.users {
            store
                .put_user(&UserCredential {
                    username: user.username.clone(),
                    password_hash: hash_password(&user.password),
                })
                .await?;
        }
        for entry in &self.recommendations {
            store.put_recommendation(entry).await?;
        }

        Ok(SeedSummary {
            capacities: self.capacities.len(),
            profiles: self.profiles.len(),
            rate_plans: self.rate_plans.len(),
            reviews: self.reviews.len(),
            users: self.users.len(),
            recommendations: self.recommendations.len(),
        })
    }
}

pub async fn init_db(config: &Config, args: &InitDbArgs) -> anyhow::Result<()> {
    let store = connect_store(&config.store).await?;
    let summary = match &args.seed {
        Some(path) => {
            let text = std::fs::read_to_string(path)?;
            SeedData::from_json(&text)?.apply(&store).await?
        }
        None => SeedSummary::default(),
    };
    info!("Database initialized: {:?}", summary);
    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}

pub async fn seed_capacity(config: &Config, args: &SeedCapacityArgs) -> anyhow::Result<()> {
    let store = connect_store(&config.store).await?;
    let capacity = HotelCapacity {
        hotel_id: args.hotel.clone(),
        total_rooms: args.rooms,
    };
    store.put_capacity(&capacity).await?;
    println!("{}", serde_json::to_string_pretty(&capacity)?);
    Ok(())
}
