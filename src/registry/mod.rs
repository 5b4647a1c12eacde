//! Copyright (c) 2025-2026, Kirky.X
//!
//! MIT License
//!
//! 服务注册、发现与客户端负载均衡。
//!
//! 每个服务实例以稳定的服务名加随机生成的实例ID注册，关闭时注销；
//! 客户端按服务名解析到存活实例集合，并以轮询方式选择实例。

pub mod balancer;
pub mod memory;

use crate::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

pub use balancer::RoundRobin;
pub use memory::MemoryRegistry;

/// 已注册的服务实例
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceInstance {
    pub name: String,
    pub id: String,
    pub address: String,
    pub port: u16,
}

impl ServiceInstance {
    /// 以新生成的实例ID创建
    pub fn new(name: &str, address: &str, port: u16) -> Self {
        Self {
            name: name.to_string(),
            id: Uuid::new_v4().to_string(),
            address: address.to_string(),
            port,
        }
    }

    pub fn endpoint(&self) -> String {
        format!("{}:{}", self.address, self.port)
    }
}

/// 服务注册中心接口
#[async_trait]
pub trait ServiceRegistry: Send + Sync {
    async fn register(&self, instance: ServiceInstance) -> Result<()>;

    /// 注销实例，返回实例是否存在
    async fn deregister(&self, instance_id: &str) -> Result<bool>;

    /// 某服务名下的全部存活实例
    async fn instances(&self, name: &str) -> Result<Vec<ServiceInstance>>;
}

/// 实例注册句柄，`shutdown` 时注销
pub struct ServiceHandle {
    registry: Arc<dyn ServiceRegistry>,
    instance: ServiceInstance,
}

impl ServiceHandle {
    /// 注册实例并返回句柄
    pub async fn register(
        registry: Arc<dyn ServiceRegistry>,
        instance: ServiceInstance,
    ) -> Result<Self> {
        registry.register(instance.clone()).await?;
        info!(
            "Registered {} as {} at {}",
            instance.name,
            instance.id,
            instance.endpoint()
        );
        Ok(Self { registry, instance })
    }

    pub fn instance(&self) -> &ServiceInstance {
        &self.instance
    }

    pub async fn shutdown(self) -> Result<()> {
        if self.registry.deregister(&self.instance.id).await? {
            info!("Deregistered {} ({})", self.instance.name, self.instance.id);
        } else {
            warn!(
                "Instance {} of {} was already gone from the registry",
                self.instance.id, self.instance.name
            );
        }
        Ok(())
    }
}
