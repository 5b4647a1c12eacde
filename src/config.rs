//! Copyright (c) 2025, Kirky.X
//!
//! MIT License
//!
//! 该模块定义了预订服务的配置结构和解析逻辑。

use crate::error::{ReservationError, Result};
use secrecy::SecretString;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub global: GlobalConfig,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub reservation: ReservationConfig,
    /// 各服务实例的注册信息，键为服务名（例如 `srv-reservation`）
    #[serde(default)]
    pub services: HashMap<String, ServiceConfig>,
}

/// 全局配置
#[derive(Deserialize, Clone, Debug)]
#[serde(default)]
pub struct GlobalConfig {
    /// tracing 过滤表达式，例如 `info` 或 `hotel_reservation=debug`
    pub log_level: String,
    /// 注册到服务发现时使用的地址
    pub advertise_address: String,
}

impl Default for GlobalConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            advertise_address: "127.0.0.1".to_string(),
        }
    }
}

/// 快速缓存后端类型
#[derive(Deserialize, Clone, Copy, Debug, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum CacheBackendType {
    /// 共享的 Redis
    #[default]
    Redis,
    /// 进程内 moka 缓存
    Memory,
}

/// Redis模式枚举
#[derive(Deserialize, Clone, Copy, Debug, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum RedisMode {
    /// 单机模式
    #[default]
    Standalone,
    /// 集群模式
    Cluster,
}

/// 快速缓存配置
#[derive(Deserialize, Clone, Debug)]
#[serde(default)]
pub struct CacheConfig {
    pub backend: CacheBackendType,
    /// Redis模式
    pub mode: RedisMode,
    /// 连接字符串
    pub connection_string: SecretString,
    /// 集群配置
    pub cluster: Option<ClusterConfig>,
    /// 连接超时时间（毫秒）
    pub connection_timeout_ms: u64,
    /// 命令执行超时时间（毫秒）
    pub command_timeout_ms: u64,
    /// 内存后端的最大条目数
    pub max_capacity: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            backend: CacheBackendType::Redis,
            mode: RedisMode::Standalone,
            connection_string: SecretString::new("redis://localhost:6379".to_string().into()),
            cluster: None,
            connection_timeout_ms: 5000,
            command_timeout_ms: 3000,
            max_capacity: 100_000,
        }
    }
}

/// 集群配置
#[derive(Deserialize, Clone, Debug)]
pub struct ClusterConfig {
    /// 初始节点列表
    pub nodes: Vec<String>,
}

/// 持久存储配置
#[derive(Deserialize, Clone, Debug)]
#[serde(default)]
pub struct StoreConfig {
    /// 数据库连接串（sqlite / postgres / mysql）
    pub url: SecretString,
    pub max_connections: u32,
    pub min_connections: u32,
    pub connect_timeout_secs: u64,
    pub sqlx_logging: bool,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            url: SecretString::new("sqlite://hotel-reservation.db?mode=rwc".to_string().into()),
            max_connections: 10,
            min_connections: 1,
            connect_timeout_secs: 30,
            sqlx_logging: false,
        }
    }
}

/// 准入模式
#[derive(Deserialize, Clone, Copy, Debug, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum AdmissionMode {
    /// 先检查后提交，不跨请求加锁；并发时可能超订
    #[default]
    BestEffort,
    /// 在共享缓存上持有每酒店锁，串行化检查与提交
    Serialized,
}

/// 预订引擎配置
#[derive(Deserialize, Clone, Debug)]
#[serde(default)]
pub struct ReservationConfig {
    pub admission: AdmissionMode,
    /// 准入锁的过期时间（毫秒）
    pub lock_ttl_ms: u64,
    /// 获取准入锁的最长等待时间（毫秒）
    pub lock_wait_ms: u64,
    /// 获取准入锁的重试间隔（毫秒）
    pub lock_retry_interval_ms: u64,
}

impl Default for ReservationConfig {
    fn default() -> Self {
        Self {
            admission: AdmissionMode::BestEffort,
            lock_ttl_ms: 5000,
            lock_wait_ms: 2000,
            lock_retry_interval_ms: 20,
        }
    }
}

/// 服务实例配置
#[derive(Deserialize, Clone, Debug)]
pub struct ServiceConfig {
    pub port: u16,
}

impl Config {
    /// 从TOML文本解析配置并校验
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: Config =
            toml::from_str(text).map_err(|e| ReservationError::Config(e.to_string()))?;
        config.validate().map_err(ReservationError::Config)?;
        Ok(config)
    }

    /// 从TOML文件加载配置并校验
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path.as_ref())?;
        Self::from_toml_str(&text)
    }

    /// 验证配置
    ///
    /// 检查配置的有效性，确保所有必需的字段都已设置，并且值在合理范围内
    pub fn validate(&self) -> std::result::Result<(), String> {
        if self.global.log_level.trim().is_empty() {
            return Err("Global log_level cannot be empty".to_string());
        }

        if self.cache.backend == CacheBackendType::Redis {
            let timeout = self.cache.connection_timeout_ms;
            if !(100..=30000).contains(&timeout) {
                return Err("Cache connection_timeout_ms must be between 100 and 30000 ms".to_string());
            }

            let timeout = self.cache.command_timeout_ms;
            if !(100..=60000).contains(&timeout) {
                return Err("Cache command_timeout_ms must be between 100 and 60000 ms".to_string());
            }

            if self.cache.mode == RedisMode::Cluster {
                match &self.cache.cluster {
                    Some(cluster) if !cluster.nodes.is_empty() => {}
                    _ => return Err("Cluster mode requires at least one cluster node".to_string()),
                }
            }
        }

        if self.cache.backend == CacheBackendType::Memory && self.cache.max_capacity == 0 {
            return Err("Cache max_capacity cannot be zero".to_string());
        }

        if self.store.max_connections == 0 {
            return Err("Store max_connections cannot be zero".to_string());
        }

        if self.store.min_connections > self.store.max_connections {
            return Err(format!(
                "Store min_connections ({}) must be <= max_connections ({})",
                self.store.min_connections, self.store.max_connections
            ));
        }

        if self.reservation.admission == AdmissionMode::Serialized {
            if self.reservation.lock_ttl_ms == 0 {
                return Err("Reservation lock_ttl_ms cannot be zero".to_string());
            }

            if self.reservation.lock_retry_interval_ms == 0 {
                return Err("Reservation lock_retry_interval_ms cannot be zero".to_string());
            }

            // 锁的过期时间必须大于等待时间
            if self.reservation.lock_ttl_ms <= self.reservation.lock_wait_ms {
                return Err(format!(
                    "Reservation lock_ttl_ms ({}) must be > lock_wait_ms ({})",
                    self.reservation.lock_ttl_ms, self.reservation.lock_wait_ms
                ));
            }
        }

        for (name, service) in &self.services {
            if name.is_empty() {
                return Err("Service name cannot be empty".to_string());
            }

            if name.len() > 64 {
                return Err(format!(
                    "Service name '{}' exceeds maximum length of 64 characters",
                    name
                ));
            }

            if service.port == 0 {
                return Err(format!("Service '{}' port cannot be zero", name));
            }
        }

        Ok(())
    }
}
