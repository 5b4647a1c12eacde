//! Copyright (c) 2025-2026, Kirky.X
//!
//! MIT License
//!
//! 单酒店的两阶段预订。
//!
//! 检查阶段解析每晚的已订房间数并计算 `已订 + 请求`，任意一晚超出容量即拒绝，
//! 不写存储。提交阶段先把新计数写入缓存，再为每晚插入一条预订记录。
//! 存储写入失败时缓存中的计数不会回滚。
//!
//! `serialized` 模式在持锁期间直接从存储读取每晚计数并覆盖缓存，
//! 可用性检查留下的过期回写不会影响准入结果。

use super::dates::{self, next_day};
use super::keys;
use super::loaders::NightId;
use super::BookingEngine;
use crate::cache_aside::RecordLoader;
use crate::config::AdmissionMode;
use crate::error::{ReservationError, Result};
use crate::metrics::GLOBAL_METRICS;
use crate::model::Booking;
use crate::serialization::{Codec, DecimalCodec};
use chrono::NaiveDate;
use std::collections::HashMap;
use std::time::Instant;
use tokio::time::{sleep, Duration};
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

/// 检查阶段每晚计数的来源
#[derive(Debug, Clone, Copy)]
enum CountSource {
    /// 读穿透缓存
    Cache,
    /// 直接读取存储，只在持有酒店锁时使用
    Store,
}

impl BookingEngine {
    /// 预订 `[in_date, out_date)` 的每一晚各 `room_number` 间房
    ///
    /// # 返回值
    ///
    /// 提交成功返回 `true`；容量不足返回 `false`（不是错误）。
    #[instrument(skip(self, customer_name), level = "info")]
    pub async fn make_reservation(
        &self,
        hotel_id: &str,
        customer_name: &str,
        in_date: NaiveDate,
        out_date: NaiveDate,
        room_number: u32,
    ) -> Result<bool> {
        if hotel_id.trim().is_empty() {
            return Err(ReservationError::InvalidRequest(
                "hotel id cannot be empty".to_string(),
            ));
        }
        let nights = dates::nights(in_date, out_date)?;
        let started = Instant::now();

        let committed = match self.config.admission {
            AdmissionMode::BestEffort => {
                self.admit(hotel_id, customer_name, &nights, room_number, CountSource::Cache)
                    .await?
            }
            AdmissionMode::Serialized => {
                self.admit_serialized(hotel_id, customer_name, &nights, room_number)
                    .await?
            }
        };

        let outcome = if committed { "admit" } else { "reject" };
        GLOBAL_METRICS.record_request("booking", "engine", "reserve", outcome);
        GLOBAL_METRICS.record_duration(
            "booking",
            "engine",
            "reserve",
            started.elapsed().as_secs_f64(),
        );
        Ok(committed)
    }

    /// 在每酒店锁内执行两阶段预订
    async fn admit_serialized(
        &self,
        hotel_id: &str,
        customer_name: &str,
        nights: &[NaiveDate],
        room_number: u32,
    ) -> Result<bool> {
        let key = keys::lock_key(hotel_id);
        let token = Uuid::new_v4().to_string();
        self.acquire_lock(&key, &token).await?;

        let result = self
            .admit(hotel_id, customer_name, nights, room_number, CountSource::Store)
            .await;

        match self.cache.unlock(&key, &token).await {
            Ok(true) => debug!("Released admission lock {}", key),
            Ok(false) => warn!("Admission lock {} expired before release", key),
            Err(e) => warn!("Failed to release admission lock {}: {}", key, e),
        }
        result
    }

    async fn acquire_lock(&self, key: &str, token: &str) -> Result<()> {
        let deadline = tokio::time::Instant::now() + Duration::from_millis(self.config.lock_wait_ms);
        let mut attempts = 0u32;
        loop {
            attempts += 1;
            if self
                .cache
                .try_lock(key, token, self.config.lock_ttl_ms)
                .await?
            {
                debug!("Acquired admission lock {} after {} attempts", key, attempts);
                return Ok(());
            }
            if tokio::time::Instant::now() >= deadline {
                GLOBAL_METRICS.record_request("booking", "engine", "lock", "timeout");
                return Err(ReservationError::LockTimeout(key.to_string()));
            }
            sleep(Duration::from_millis(self.config.lock_retry_interval_ms)).await;
        }
    }

    /// 持锁时从存储读取计数，并把结果写回缓存
    async fn store_counts(&self, ids: &[NightId]) -> Result<HashMap<NightId, u32>> {
        let counts = self.admission_counts.loader().load_batch(ids).await?;
        for (id, booked) in &counts {
            self.admission_counts.populate(id, booked).await;
        }
        Ok(counts)
    }

    async fn admit(
        &self,
        hotel_id: &str,
        customer_name: &str,
        nights: &[NaiveDate],
        room_number: u32,
        source: CountSource,
    ) -> Result<bool> {
        let hotel = hotel_id.to_string();
        let capacity = self
            .resolve_capacities(std::slice::from_ref(&hotel))
            .await?
            .get(hotel_id)
            .copied()
            .ok_or_else(|| ReservationError::NotFound(format!("capacity of {}", hotel_id)))?;

        // 检查阶段
        let ids: Vec<NightId> = nights
            .iter()
            .map(|night| NightId::new(hotel_id, *night))
            .collect();
        let booked = match source {
            CountSource::Cache => self.admission_counts.fetch_many(&ids).await?,
            CountSource::Store => self.store_counts(&ids).await?,
        };

        let mut pending = Vec::with_capacity(ids.len());
        for id in ids {
            let current = booked.get(&id).copied().ok_or_else(|| {
                ReservationError::NotFound(format!(
                    "booked count of {} on {}",
                    id.hotel_id, id.night
                ))
            })?;
            match current
                .checked_add(room_number)
                .filter(|total| *total <= capacity)
            {
                Some(total) => pending.push((id, total)),
                None => {
                    info!(
                        "Rejecting {} rooms at {} on {}: {} of {} booked",
                        room_number, hotel_id, id.night, current, capacity
                    );
                    return Ok(false);
                }
            }
        }

        // 提交阶段：先缓存，后存储
        for (id, total) in &pending {
            let key = keys::night_key(&id.hotel_id, id.night);
            self.cache.set(&key, DecimalCodec.encode(total)?).await?;
        }
        for (id, _) in &pending {
            let booking = Booking {
                hotel_id: hotel_id.to_string(),
                customer_name: customer_name.to_string(),
                in_date: id.night,
                out_date: next_day(id.night)?,
                number: room_number,
            };
            self.store.insert_booking(&booking).await?;
        }

        info!(
            "Committed {} rooms at {} for {} nights",
            room_number,
            hotel_id,
            pending.len()
        );
        Ok(true)
    }
}
