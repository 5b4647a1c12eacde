//! Copyright (c) 2025-2026, Kirky.X
//!
//! MIT License
//!
//! 持久存储适配器
//!
//! 持久存储是数据的唯一可信来源。预订引擎只依赖 [`BookingStore`]，
//! 资料、价格、评论、用户和推荐服务依赖 [`CatalogStore`]。

pub mod memory;
pub mod sql;

use crate::error::Result;
use crate::model::{
    Booking, HotelCapacity, HotelProfile, RatePlan, RecommendationEntry, Review, UserCredential,
};
use async_trait::async_trait;
use chrono::NaiveDate;

pub use memory::MemoryStore;
pub use sql::SqlStore;

/// 容量与预订记录的存取接口
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait BookingStore: Send + Sync {
    /// 按酒店ID查找容量记录
    async fn find_capacity(&self, hotel_id: &str) -> Result<Option<HotelCapacity>>;

    /// 批量查找容量记录，缺失的酒店不出现在结果中
    async fn find_capacities(&self, hotel_ids: &[String]) -> Result<Vec<HotelCapacity>>;

    /// 按酒店ID与入住/离店日期精确匹配预订记录
    async fn find_bookings(
        &self,
        hotel_id: &str,
        in_date: NaiveDate,
        out_date: NaiveDate,
    ) -> Result<Vec<Booking>>;

    /// 插入一条预订记录
    async fn insert_booking(&self, booking: &Booking) -> Result<()>;

    /// 写入或覆盖容量记录
    async fn put_capacity(&self, capacity: &HotelCapacity) -> Result<()>;
}

/// 酒店目录数据的存取接口
#[async_trait]
pub trait CatalogStore: Send + Sync {
    async fn find_profile(&self, hotel_id: &str) -> Result<Option<HotelProfile>>;

    async fn find_rate_plans(&self, hotel_id: &str) -> Result<Vec<RatePlan>>;

    async fn find_reviews(&self, hotel_id: &str) -> Result<Vec<Review>>;

    /// 加载全部用户凭据（启动时调用一次）
    async fn load_users(&self) -> Result<Vec<UserCredential>>;

    /// 加载全部推荐属性（启动时调用一次）
    async fn load_recommendations(&self) -> Result<Vec<RecommendationEntry>>;

    async fn put_profile(&self, profile: &HotelProfile) -> Result<()>;

    async fn put_rate_plan(&self, plan: &RatePlan) -> Result<()>;

    async fn put_review(&self, review: &Review) -> Result<()>;

    async fn put_user(&self, user: &UserCredential) -> Result<()>;

    async fn put_recommendation(&self, entry: &RecommendationEntry) -> Result<()>;
}
