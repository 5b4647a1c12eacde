//! Copyright (c) 2025-2026, Kirky.X
//!
//! MIT License
//!
//! 进程内服务注册中心。

use super::{ServiceInstance, ServiceRegistry};
use crate::error::{ReservationError, Result};
use async_trait::async_trait;
use dashmap::DashMap;
use tracing::debug;

/// 基于DashMap的注册中心，键为实例ID
#[derive(Debug, Default)]
pub struct MemoryRegistry {
    instances: DashMap<String, ServiceInstance>,
}

impl MemoryRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.instances.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }
}

#[async_trait]
impl ServiceRegistry for MemoryRegistry {
    async fn register(&self, instance: ServiceInstance) -> Result<()> {
        if instance.name.is_empty() {
            return Err(ReservationError::Registry(
                "service name cannot be empty".to_string(),
            ));
        }
        if self.instances.contains_key(&instance.id) {
            return Err(ReservationError::Registry(format!(
                "instance {} already registered",
                instance.id
            )));
        }
        debug!("Registering {} ({})", instance.name, instance.id);
        self.instances.insert(instance.id.clone(), instance);
        Ok(())
    }

    async fn deregister(&self, instance_id: &str) -> Result<bool> {
        Ok(self.instances.remove(instance_id).is_some())
    }

    async fn instances(&self, name: &str) -> Result<Vec<ServiceInstance>> {
        let mut found: Vec<ServiceInstance> = self
            .instances
            .iter()
            .filter(|entry| entry.value().name == name)
            .map(|entry| entry.value().clone())
            .collect();
        // 保证轮询顺序稳定
        found.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(found)
    }
}
