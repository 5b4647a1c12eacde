//! Copyright (c) 2025-2026, Kirky.X
//!
//! MIT License
//!
//! 预订与可用性引擎
//!
//! 容量与每晚已订房间数都通过读穿透组件解析，缓存中以十进制字符串存放。
//! 可用性检查在多家酒店、多晚之间并发执行；预订是单酒店的两阶段操作
//! （先检查，后提交）。默认准入模式下检查与提交之间不加锁，
//! 并发预订同一酒店同一晚可能超出容量；串行准入模式在共享缓存上持有每酒店锁。

pub mod availability;
pub mod dates;
pub mod keys;
pub mod loaders;
pub mod reservation;

use crate::backend::FastCache;
use crate::cache_aside::{MissPolicy, ReadThrough, WriteBack};
use crate::config::ReservationConfig;
use crate::error::{ReservationError, Result};
use crate::serialization::DecimalCodec;
use crate::store::BookingStore;
use loaders::{CapacityLoader, NightCountLoader};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::info;

pub use availability::NightCheck;
pub use loaders::NightId;

/// 预订与可用性引擎
pub struct BookingEngine {
    cache: Arc<dyn FastCache>,
    store: Arc<dyn BookingStore>,
    capacities: ReadThrough<CapacityLoader, DecimalCodec>,
    night_counts: ReadThrough<NightCountLoader, DecimalCodec>,
    // 预订的检查阶段等待自身的回写完成
    admission_counts: ReadThrough<NightCountLoader, DecimalCodec>,
    config: ReservationConfig,
}

impl BookingEngine {
    /// 创建预订引擎
    ///
    /// # 参数
    ///
    /// * `cache` - 所有实例共享的快速缓存
    /// * `store` - 持久存储
    /// * `config` - 准入模式与锁参数
    pub fn new(
        cache: Arc<dyn FastCache>,
        store: Arc<dyn BookingStore>,
        config: ReservationConfig,
    ) -> Self {
        let capacities = ReadThrough::new(
            "capacity",
            Arc::clone(&cache),
            CapacityLoader::new(Arc::clone(&store)),
            DecimalCodec,
            MissPolicy::Abort,
        );
        let night_counts = ReadThrough::new(
            "night_count",
            Arc::clone(&cache),
            NightCountLoader::new(Arc::clone(&store)),
            DecimalCodec,
            MissPolicy::Abort,
        );
        let admission_counts = night_counts.clone().with_write_back(WriteBack::Awaited);

        info!("BookingEngine ready, admission={:?}", config.admission);
        Self {
            cache,
            store,
            capacities,
            night_counts,
            admission_counts,
            config,
        }
    }

    /// 解析一组酒店的容量，任何一家没有容量记录都视为错误
    async fn resolve_capacities(&self, hotel_ids: &[String]) -> Result<HashMap<String, u32>> {
        let capacities = self.capacities.fetch_many(hotel_ids).await?;
        if let Some(unknown) = hotel_ids.iter().find(|id| !capacities.contains_key(*id)) {
            return Err(ReservationError::NotFound(format!(
                "no capacity record for hotel {}",
                unknown
            )));
        }
        Ok(capacities)
    }
}

/// 去重并保持请求顺序，拒绝空的酒店ID
fn unique_hotels(hotel_ids: &[String]) -> Result<Vec<String>> {
    let mut seen = HashSet::with_capacity(hotel_ids.len());
    let mut hotels = Vec::with_capacity(hotel_ids.len());
    for id in hotel_ids {
        if id.trim().is_empty() {
            return Err(ReservationError::InvalidRequest(
                "hotel id cannot be empty".to_string(),
            ));
        }
        if seen.insert(id.as_str()) {
            hotels.push(id.clone());
        }
    }
    Ok(hotels)
}
