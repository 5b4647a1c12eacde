//! Copyright (c) 2025-2026, Kirky.X
//!
//! MIT License
//!
//! 轮询负载均衡。

use super::{ServiceInstance, ServiceRegistry};
use crate::error::{ReservationError, Result};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tracing::debug;

/// 把逻辑服务名解析为下一个存活实例
pub struct RoundRobin {
    registry: Arc<dyn ServiceRegistry>,
    name: String,
    cursor: AtomicUsize,
}

impl RoundRobin {
    pub fn new(registry: Arc<dyn ServiceRegistry>, name: &str) -> Self {
        Self {
            registry,
            name: name.to_string(),
            cursor: AtomicUsize::new(0),
        }
    }

    pub fn service_name(&self) -> &str {
        &self.name
    }

    /// 每次调用重新查询实例列表，因此注销的实例不会再被选中
    pub async fn next_instance(&self) -> Result<ServiceInstance> {
        let instances = self.registry.instances(&self.name).await?;
        if instances.is_empty() {
            return Err(ReservationError::Registry(format!(
                "no live instance of {}",
                self.name
            )));
        }
        let index = self.cursor.fetch_add(1, Ordering::Relaxed) % instances.len();
        let picked = instances[index].clone();
        debug!("{} -> {} ({})", self.name, picked.endpoint(), picked.id);
        Ok(picked)
    }
}
