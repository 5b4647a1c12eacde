//! Copyright (c) 2025, Kirky.X
//!
//! MIT License
//!
//! 该模块定义了共享快速缓存的实现，基于Redis。

use super::redis_provider::{DefaultRedisProvider, RedisProvider};
use super::FastCache;
use crate::config::{CacheConfig, RedisMode};
use crate::error::{ReservationError, Result};
use async_trait::async_trait;
use futures::future::try_join_all;
use redis::aio::ConnectionManager;
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, instrument};

/// Redis快速缓存
///
/// 所有服务实例共享同一个Redis，客户端不做任何加锁
#[derive(Clone)]
pub enum RedisCache {
    Standalone {
        manager: ConnectionManager,
        command_timeout_ms: u64,
    },
    Cluster {
        client: redis::cluster::ClusterClient,
        command_timeout_ms: u64,
    },
}

impl std::fmt::Debug for RedisCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Standalone { .. } => write!(f, "RedisCache::Standalone"),
            Self::Cluster { .. } => write!(f, "RedisCache::Cluster"),
        }
    }
}

const UNLOCK_SCRIPT: &str = r#"
if redis.call("get", KEYS[1]) == ARGV[1] then
    return redis.call("del", KEYS[1])
else
    return 0
end
"#;

impl RedisCache {
    /// 根据配置连接Redis
    #[instrument(skip(config), level = "info", name = "init_redis_cache")]
    pub async fn new(config: &CacheConfig) -> Result<Self> {
        Self::new_with_provider(config, Arc::new(DefaultRedisProvider)).await
    }

    /// 使用指定的Redis提供者连接
    #[instrument(skip(config, provider), level = "info", fields(mode = ?config.mode))]
    pub async fn new_with_provider(
        config: &CacheConfig,
        provider: Arc<dyn RedisProvider>,
    ) -> Result<Self> {
        debug!("Initializing RedisCache with mode: {:?}", config.mode);
        match config.mode {
            RedisMode::Standalone => {
                let manager = provider.get_standalone_client(config).await?;
                Ok(RedisCache::Standalone {
                    manager,
                    command_timeout_ms: config.command_timeout_ms,
                })
            }
            RedisMode::Cluster => {
                let client = provider.get_cluster_client(config).await?;
                Ok(RedisCache::Cluster {
                    client,
                    command_timeout_ms: config.command_timeout_ms,
                })
            }
        }
    }

    /// 获取命令超时时间（毫秒）
    pub fn command_timeout_ms(&self) -> u64 {
        match self {
            RedisCache::Standalone {
                command_timeout_ms, ..
            } => *command_timeout_ms,
            RedisCache::Cluster {
                command_timeout_ms, ..
            } => *command_timeout_ms,
        }
    }

    /// 为单条命令加上超时
    async fn bounded<T, F>(&self, op: &str, fut: F) -> Result<T>
    where
        F: Future<Output = redis::RedisResult<T>>,
    {
        let timeout_ms = self.command_timeout_ms();
        match tokio::time::timeout(Duration::from_millis(timeout_ms), fut).await {
            Ok(result) => result.map_err(ReservationError::from),
            Err(_) => Err(ReservationError::Cache(format!(
                "{} timed out after {}ms",
                op, timeout_ms
            ))),
        }
    }

    /// 检查连接是否正常
    #[instrument(skip(self), level = "debug")]
    pub async fn ping(&self) -> Result<()> {
        match self {
            RedisCache::Standalone { manager, .. } => {
                let mut conn = manager.clone();
                self.bounded("PING", redis::cmd("PING").query_async::<String>(&mut conn))
                    .await?;
            }
            RedisCache::Cluster { client, .. } => {
                let mut conn = client.get_async_connection().await?;
                self.bounded("PING", redis::cmd("PING").query_async::<String>(&mut conn))
                    .await?;
            }
        }
        Ok(())
    }
}

#[async_trait]
impl FastCache for RedisCache {
    #[instrument(skip(self), level = "debug")]
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let value: Option<Vec<u8>> = match self {
            RedisCache::Standalone { manager, .. } => {
                let mut conn = manager.clone();
                self.bounded("GET", redis::cmd("GET").arg(key).query_async(&mut conn))
                    .await?
            }
            RedisCache::Cluster { client, .. } => {
                let mut conn = client.get_async_connection().await?;
                self.bounded("GET", redis::cmd("GET").arg(key).query_async(&mut conn))
                    .await?
            }
        };
        debug!("Redis get: key={}, found={}", key, value.is_some());
        Ok(value)
    }

    #[instrument(skip(self, keys), level = "debug", fields(key_count = keys.len()))]
    async fn get_multi(&self, keys: &[String]) -> Result<HashMap<String, Vec<u8>>> {
        if keys.is_empty() {
            return Ok(HashMap::new());
        }

        let values: Vec<Option<Vec<u8>>> = match self {
            RedisCache::Standalone { manager, .. } => {
                let mut conn = manager.clone();
                let mut cmd = redis::cmd("MGET");
                for key in keys {
                    cmd.arg(key.as_str());
                }
                self.bounded("MGET", cmd.query_async(&mut conn)).await?
            }
            RedisCache::Cluster { client, .. } => {
                // 集群中的键可能分布在不同槽位，逐键并发 GET
                let conn = client.get_async_connection().await?;
                let gets = keys.iter().map(|key| {
                    let mut conn = conn.clone();
                    async move {
                        redis::cmd("GET")
                            .arg(key)
                            .query_async::<Option<Vec<u8>>>(&mut conn)
                            .await
                    }
                });
                self.bounded("GET", try_join_all(gets)).await?
            }
        };

        let found: HashMap<String, Vec<u8>> = keys
            .iter()
            .zip(values)
            .filter_map(|(key, value)| value.map(|v| (key.clone(), v)))
            .collect();
        debug!("Redis get_multi: {}/{} hit", found.len(), keys.len());
        Ok(found)
    }

    #[instrument(skip(self, value), level = "debug", fields(value_len = value.len()))]
    async fn set(&self, key: &str, value: Vec<u8>) -> Result<()> {
        match self {
            RedisCache::Standalone { manager, .. } => {
                let mut conn = manager.clone();
                self.bounded(
                    "SET",
                    redis::cmd("SET").arg(key).arg(value).query_async::<()>(&mut conn),
                )
                .await
            }
            RedisCache::Cluster { client, .. } => {
                let mut conn = client.get_async_connection().await?;
                self.bounded(
                    "SET",
                    redis::cmd("SET").arg(key).arg(value).query_async::<()>(&mut conn),
                )
                .await
            }
        }
    }

    /// 使用 SET NX PX 实现
    #[instrument(skip(self), level = "debug")]
    async fn try_lock(&self, key: &str, token: &str, ttl_ms: u64) -> Result<bool> {
        let mut cmd = redis::cmd("SET");
        cmd.arg(key).arg(token).arg("NX").arg("PX").arg(ttl_ms);
        let result: Option<String> = match self {
            RedisCache::Standalone { manager, .. } => {
                let mut conn = manager.clone();
                self.bounded("SET NX", cmd.query_async(&mut conn)).await?
            }
            RedisCache::Cluster { client, .. } => {
                let mut conn = client.get_async_connection().await?;
                self.bounded("SET NX", cmd.query_async(&mut conn)).await?
            }
        };
        debug!("Lock acquisition result: key={}, success={}", key, result.is_some());
        Ok(result.is_some())
    }

    /// 使用 Lua 脚本保证比较与删除的原子性
    #[instrument(skip(self), level = "debug")]
    async fn unlock(&self, key: &str, token: &str) -> Result<bool> {
        let script = redis::Script::new(UNLOCK_SCRIPT);
        let result: i32 = match self {
            RedisCache::Standalone { manager, .. } => {
                let mut conn = manager.clone();
                self.bounded(
                    "UNLOCK",
                    script.key(key).arg(token).invoke_async(&mut conn),
                )
                .await?
            }
            RedisCache::Cluster { client, .. } => {
                let mut conn = client.get_async_connection().await?;
                self.bounded(
                    "UNLOCK",
                    script.key(key).arg(token).invoke_async(&mut conn),
                )
                .await?
            }
        };
        Ok(result == 1)
    }
}
