//! Copyright (c) 2025-2026, Kirky.X
//!
//! MIT License
//!
//! 多酒店可用性检查。
//!
//! 每个（酒店，晚）的已订房间数并发解析，结果经由同一个通道汇入单个消费者：
//! 一个生产者发送已命中缓存的结果，一组生产者发送回源得到的结果。
//! 两组生产者全部结束后，由独立的关闭任务释放原始发送端，通道只关闭一次。

use super::dates;
use super::loaders::NightId;
use super::{unique_hotels, BookingEngine};
use crate::error::Result;
use crate::metrics::GLOBAL_METRICS;
use chrono::NaiveDate;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tracing::{debug, instrument};

/// 单晚检查结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NightCheck {
    pub hotel_id: String,
    pub night: NaiveDate,
    pub booked: u32,
    pub available: bool,
}

impl NightCheck {
    fn evaluate(
        id: NightId,
        booked: u32,
        requested: u32,
        capacities: &HashMap<String, u32>,
    ) -> Self {
        let capacity = capacities.get(&id.hotel_id).copied().unwrap_or(0);
        Self {
            available: fits(booked, requested, capacity),
            booked,
            hotel_id: id.hotel_id,
            night: id.night,
        }
    }
}

/// `booked + requested <= capacity`，不会溢出
pub fn fits(booked: u32, requested: u32, capacity: u32) -> bool {
    u64::from(booked) + u64::from(requested) <= u64::from(capacity)
}

impl BookingEngine {
    /// 返回在 `[in_date, out_date)` 每一晚都能容纳 `room_number` 间房的酒店
    ///
    /// 结果保持请求顺序（重复的酒店只出现一次）。任何一家酒店缺少容量记录、
    /// 任何缓存或存储错误都会使整个请求失败。
    #[instrument(skip(self, hotel_ids), level = "info", fields(hotels = hotel_ids.len()))]
    pub async fn check_availability(
        &self,
        hotel_ids: &[String],
        in_date: NaiveDate,
        out_date: NaiveDate,
        room_number: u32,
    ) -> Result<Vec<String>> {
        let started = Instant::now();
        let nights = dates::nights(in_date, out_date)?;
        let hotels = unique_hotels(hotel_ids)?;
        let capacities = Arc::new(self.resolve_capacities(&hotels).await?);

        if nights.is_empty() {
            return Ok(hotels);
        }

        let ids: Vec<NightId> = hotels
            .iter()
            .flat_map(|hotel| nights.iter().map(move |night| NightId::new(hotel, *night)))
            .collect();
        let (cached, missing) = self.night_counts.lookup_cached(&ids).await?;
        debug!(
            "{} hotel-nights: {} cached, {} from store",
            ids.len(),
            cached.len(),
            missing.len()
        );

        let (tx, mut rx) = mpsc::unbounded_channel::<Result<NightCheck>>();

        let cached_producer = {
            let tx = tx.clone();
            let capacities = Arc::clone(&capacities);
            tokio::spawn(async move {
                for (id, booked) in cached {
                    let check = NightCheck::evaluate(id, booked, room_number, &capacities);
                    if tx.send(Ok(check)).is_err() {
                        break;
                    }
                }
            })
        };

        let mut store_producers = JoinSet::new();
        for id in missing {
            let tx = tx.clone();
            let capacities = Arc::clone(&capacities);
            let counts = self.night_counts.clone();
            store_producers.spawn(async move {
                let loaded = counts.load_one(&id).await;
                let message = loaded.map(|booked| {
                    NightCheck::evaluate(id, booked.unwrap_or(0), room_number, &capacities)
                });
                let _ = tx.send(message);
            });
        }

        // 唯一的关闭者：等待两组生产者结束后丢弃原始发送端
        tokio::spawn(async move {
            if let Err(e) = cached_producer.await {
                let _ = tx.send(Err(e.into()));
            }
            while let Some(joined) = store_producers.join_next().await {
                if let Err(e) = joined {
                    let _ = tx.send(Err(e.into()));
                }
            }
            drop(tx);
        });

        let mut verdicts: HashMap<String, bool> =
            hotels.iter().map(|hotel| (hotel.clone(), true)).collect();
        while let Some(message) = rx.recv().await {
            let check = message?;
            if !check.available {
                debug!(
                    "{} full on {}: {} booked, {} requested",
                    check.hotel_id, check.night, check.booked, room_number
                );
                verdicts.insert(check.hotel_id, false);
            }
        }

        let available: Vec<String> = hotels
            .into_iter()
            .filter(|hotel| verdicts.get(hotel).copied().unwrap_or(false))
            .collect();

        GLOBAL_METRICS.record_request("booking", "engine", "check", "ok");
        GLOBAL_METRICS.record_duration(
            "booking",
            "engine",
            "check",
            started.elapsed().as_secs_f64(),
        );
        Ok(available)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fits_boundaries() {
        assert!(fits(5, 5, 10));
        assert!(!fits(5, 6, 10));
        assert!(fits(0, 0, 0));
        assert!(!fits(u32::MAX, 1, u32::MAX));
    }
}
