//! Copyright (c) 2025-2026, Kirky.X
//!
//! MIT License
//!
//! 预订引擎的回源加载器：酒店容量与每晚已订房间数。

use super::dates::next_day;
use super::keys::{capacity_key, night_key};
use crate::cache_aside::{LoadStrategy, RecordLoader};
use crate::error::Result;
use crate::store::BookingStore;
use async_trait::async_trait;
use chrono::NaiveDate;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

/// 容量加载器，未命中的酒店合并为一次 `IN` 查询
pub struct CapacityLoader {
    store: Arc<dyn BookingStore>,
}

impl CapacityLoader {
    pub fn new(store: Arc<dyn BookingStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl RecordLoader for CapacityLoader {
    type Id = String;
    type Value = u32;

    fn cache_key(&self, id: &String) -> String {
        capacity_key(id)
    }

    async fn load(&self, id: &String) -> Result<Option<u32>> {
        Ok(self.store.find_capacity(id).await?.map(|c| c.total_rooms))
    }

    async fn load_batch(&self, ids: &[String]) -> Result<HashMap<String, u32>> {
        Ok(self
            .store
            .find_capacities(ids)
            .await?
            .into_iter()
            .map(|c| (c.hotel_id, c.total_rooms))
            .collect())
    }

    fn strategy(&self) -> LoadStrategy {
        LoadStrategy::Batched
    }
}

/// 某酒店的某一晚
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NightId {
    pub hotel_id: String,
    pub night: NaiveDate,
}

impl NightId {
    pub fn new(hotel_id: &str, night: NaiveDate) -> Self {
        Self {
            hotel_id: hotel_id.to_string(),
            night,
        }
    }
}

/// 每晚已订房间数加载器
///
/// 对该晚的所有预订记录求和；没有记录时为0，因此总能得到一个值。
pub struct NightCountLoader {
    store: Arc<dyn BookingStore>,
}

impl NightCountLoader {
    pub fn new(store: Arc<dyn BookingStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl RecordLoader for NightCountLoader {
    type Id = NightId;
    type Value = u32;

    fn cache_key(&self, id: &NightId) -> String {
        night_key(&id.hotel_id, id.night)
    }

    async fn load(&self, id: &NightId) -> Result<Option<u32>> {
        let bookings = self
            .store
            .find_bookings(&id.hotel_id, id.night, next_day(id.night)?)
            .await?;
        let booked = bookings
            .iter()
            .fold(0u32, |sum, b| sum.saturating_add(b.number));
        debug!(
            "{} on {}: {} rooms across {} bookings",
            id.hotel_id,
            id.night,
            booked,
            bookings.len()
        );
        Ok(Some(booked))
    }
}
