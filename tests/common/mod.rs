//! Copyright (c) 2025, Kirky.X
//!
//! MIT License
//!
//! 该模块定义了测试的通用工具函数、数据夹具和故障模拟实现。

#![allow(dead_code)]

use async_trait::async_trait;
use chrono::NaiveDate;
use hotel_reservation::backend::{FastCache, MemoryCache};
use hotel_reservation::booking::dates::parse_date;
use hotel_reservation::booking::BookingEngine;
use hotel_reservation::config::ReservationConfig;
use hotel_reservation::error::{ReservationError, Result};
use hotel_reservation::model::{
    Booking, HotelCapacity, HotelProfile, RatePlan, RecommendationEntry, Review, UserCredential,
};
use hotel_reservation::store::{BookingStore, CatalogStore, MemoryStore};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Once};
use std::time::Duration;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::EnvFilter;

static INIT: Once = Once::new();

pub fn setup_logging() {
    INIT.call_once(|| {
        tracing_subscriber::fmt()
            .with_span_events(FmtSpan::CLOSE)
            .with_env_filter(EnvFilter::new("debug"))
            .try_init()
            .ok();
    });
}

pub fn date(text: &str) -> NaiveDate {
    parse_date(text).expect("valid test date")
}

/// 轮询缓存直到键出现，超时返回 `None`
pub async fn wait_for_key(cache: &dyn FastCache, key: &str) -> Option<Vec<u8>> {
    let deadline = tokio::time::Instant::now() + Duration::from_secs(2);
    loop {
        if let Some(blob) = cache.get(key).await.expect("cache get") {
            return Some(blob);
        }
        if tokio::time::Instant::now() >= deadline {
            return None;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
}

/// 预订测试夹具：进程内缓存、进程内存储与引擎
pub struct Fixture {
    pub cache: Arc<MemoryCache>,
    pub store: Arc<MemoryStore>,
    pub engine: Arc<BookingEngine>,
}

impl Fixture {
    pub async fn new(capacities: &[(&str, u32)]) -> Self {
        Self::with_config(capacities, ReservationConfig::default()).await
    }

    pub async fn with_config(capacities: &[(&str, u32)], config: ReservationConfig) -> Self {
        setup_logging();
        let cache = Arc::new(MemoryCache::new(10_000));
        let store = Arc::new(MemoryStore::new());
        for (hotel_id, total_rooms) in capacities {
            store
                .put_capacity(&HotelCapacity {
                    hotel_id: hotel_id.to_string(),
                    total_rooms: *total_rooms,
                })
                .await
                .expect("seed capacity");
        }
        let engine = Arc::new(BookingEngine::new(cache.clone(), store.clone(), config));
        Self {
            cache,
            store,
            engine,
        }
    }

    /// 直接写入存储，绕过缓存
    pub async fn seed_booking(&self, hotel_id: &str, night: &str, number: u32) {
        let night = date(night);
        self.store
            .insert_booking(&Booking {
                hotel_id: hotel_id.to_string(),
                customer_name: "seed".to_string(),
                in_date: night,
                out_date: night.succ_opt().expect("next day"),
                number,
            })
            .await
            .expect("seed booking");
    }

    pub async fn cached(&self, key: &str) -> Option<String> {
        self.cache
            .get(key)
            .await
            .expect("memory cache never fails")
            .map(|blob| String::from_utf8(blob).expect("utf8 cache value"))
    }

    /// 等待后台回写落地后读取
    pub async fn wait_cached(&self, key: &str) -> Option<String> {
        wait_for_key(&*self.cache, key)
            .await
            .map(|blob| String::from_utf8(blob).expect("utf8 cache value"))
    }
}

pub fn hotels(ids: &[&str]) -> Vec<String> {
    ids.iter().map(|id| id.to_string()).collect()
}

/// 所有操作都返回传输错误的快速缓存
#[derive(Debug, Default)]
pub struct FailingCache;

#[async_trait]
impl FastCache for FailingCache {
    async fn get(&self, _key: &str) -> Result<Option<Vec<u8>>> {
        Err(ReservationError::Cache("模拟连接失败".to_string()))
    }

    async fn get_multi(&self, _keys: &[String]) -> Result<HashMap<String, Vec<u8>>> {
        Err(ReservationError::Cache("模拟连接失败".to_string()))
    }

    async fn set(&self, _key: &str, _value: Vec<u8>) -> Result<()> {
        Err(ReservationError::Cache("模拟连接失败".to_string()))
    }

    async fn try_lock(&self, _key: &str, _token: &str, _ttl_ms: u64) -> Result<bool> {
        Err(ReservationError::Cache("模拟连接失败".to_string()))
    }

    async fn unlock(&self, _key: &str, _token: &str) -> Result<bool> {
        Err(ReservationError::Cache("模拟连接失败".to_string()))
    }
}

/// 第一次写入指定键时延迟落地的快速缓存，模拟晚到的后台回写
#[derive(Debug)]
pub struct DelayedCache {
    pub inner: MemoryCache,
    key: String,
    delay: Duration,
    delayed: AtomicBool,
}

impl DelayedCache {
    pub fn new(key: &str, delay: Duration) -> Self {
        Self {
            inner: MemoryCache::new(10_000),
            key: key.to_string(),
            delay,
            delayed: AtomicBool::new(false),
        }
    }
}

#[async_trait]
impl FastCache for DelayedCache {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        self.inner.get(key).await
    }

    async fn get_multi(&self, keys: &[String]) -> Result<HashMap<String, Vec<u8>>> {
        self.inner.get_multi(keys).await
    }

    async fn set(&self, key: &str, value: Vec<u8>) -> Result<()> {
        if key == self.key && !self.delayed.swap(true, Ordering::SeqCst) {
            tokio::time::sleep(self.delay).await;
        }
        self.inner.set(key, value).await
    }

    async fn try_lock(&self, key: &str, token: &str, ttl_ms: u64) -> Result<bool> {
        self.inner.try_lock(key, token, ttl_ms).await
    }

    async fn unlock(&self, key: &str, token: &str) -> Result<bool> {
        self.inner.unlock(key, token).await
    }
}

/// 读正常、写失败的快速缓存
#[derive(Debug, Default)]
pub struct ReadOnlyCache {
    pub inner: MemoryCache,
}

#[async_trait]
impl FastCache for ReadOnlyCache {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        self.inner.get(key).await
    }

    async fn get_multi(&self, keys: &[String]) -> Result<HashMap<String, Vec<u8>>> {
        self.inner.get_multi(keys).await
    }

    async fn set(&self, _key: &str, _value: Vec<u8>) -> Result<()> {
        Err(ReservationError::Cache("read-only".to_string()))
    }

    async fn try_lock(&self, key: &str, token: &str, ttl_ms: u64) -> Result<bool> {
        self.inner.try_lock(key, token, ttl_ms).await
    }

    async fn unlock(&self, key: &str, token: &str) -> Result<bool> {
        self.inner.unlock(key, token).await
    }
}

/// 对指定酒店读取失败的存储包装
#[derive(Debug, Default)]
pub struct FlakyStore {
    pub inner: MemoryStore,
    pub broken_hotels: HashSet<String>,
    pub bookings_down: AtomicBool,
}

impl FlakyStore {
    pub fn breaking(hotels: &[&str]) -> Self {
        Self {
            broken_hotels: hotels.iter().map(|h| h.to_string()).collect(),
            ..Default::default()
        }
    }

    pub fn set_bookings_down(&self, down: bool) {
        self.bookings_down.store(down, Ordering::SeqCst);
    }

    fn check(&self, hotel_id: &str) -> Result<()> {
        if self.broken_hotels.contains(hotel_id) {
            return Err(ReservationError::StoreError(format!(
                "{} unreachable",
                hotel_id
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl BookingStore for FlakyStore {
    async fn find_capacity(&self, hotel_id: &str) -> Result<Option<HotelCapacity>> {
        self.check(hotel_id)?;
        self.inner.find_capacity(hotel_id).await
    }

    async fn find_capacities(&self, hotel_ids: &[String]) -> Result<Vec<HotelCapacity>> {
        for id in hotel_ids {
            self.check(id)?;
        }
        self.inner.find_capacities(hotel_ids).await
    }

    async fn find_bookings(
        &self,
        hotel_id: &str,
        in_date: NaiveDate,
        out_date: NaiveDate,
    ) -> Result<Vec<Booking>> {
        if self.bookings_down.load(Ordering::SeqCst) {
            return Err(ReservationError::StoreError("booking table down".to_string()));
        }
        self.check(hotel_id)?;
        self.inner.find_bookings(hotel_id, in_date, out_date).await
    }

    async fn insert_booking(&self, booking: &Booking) -> Result<()> {
        self.inner.insert_booking(booking).await
    }

    async fn put_capacity(&self, capacity: &HotelCapacity) -> Result<()> {
        self.inner.put_capacity(capacity).await
    }
}

#[async_trait]
impl CatalogStore for FlakyStore {
    async fn find_profile(&self, hotel_id: &str) -> Result<Option<HotelProfile>> {
        self.check(hotel_id)?;
        self.inner.find_profile(hotel_id).await
    }

    async fn find_rate_plans(&self, hotel_id: &str) -> Result<Vec<RatePlan>> {
        self.check(hotel_id)?;
        self.inner.find_rate_plans(hotel_id).await
    }

    async fn find_reviews(&self, hotel_id: &str) -> Result<Vec<Review>> {
        self.check(hotel_id)?;
        self.inner.find_reviews(hotel_id).await
    }

    async fn load_users(&self) -> Result<Vec<UserCredential>> {
        self.inner.load_users().await
    }

    async fn load_recommendations(&self) -> Result<Vec<RecommendationEntry>> {
        self.inner.load_recommendations().await
    }

    async fn put_profile(&self, profile: &HotelProfile) -> Result<()> {
        self.inner.put_profile(profile).await
    }

    async fn put_rate_plan(&self, plan: &RatePlan) -> Result<()> {
        self.inner.put_rate_plan(plan).await
    }

    async fn put_review(&self, review: &Review) -> Result<()> {
        self.inner.put_review(review).await
    }

    async fn put_user(&self, user: &UserCredential) -> Result<()> {
        self.inner.put_user(user).await
    }

    async fn put_recommendation(&self, entry: &RecommendationEntry) -> Result<()> {
        self.inner.put_recommendation(entry).await
    }
}
