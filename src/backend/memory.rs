//! Copyright (c) 2025-2026, Kirky.X
//!
//! MIT License
//!
//! 该模块定义了进程内快速缓存的实现，基于moka。

use super::FastCache;
use crate::error::Result;
use async_trait::async_trait;
use dashmap::DashMap;
use moka::future::Cache;
use std::collections::HashMap;
use std::time::{Duration, Instant};
use tracing::{debug, instrument};

/// 进程内快速缓存
///
/// 适用于单进程部署和测试。条目不过期，只在超出容量时由moka淘汰。
#[derive(Clone)]
pub struct MemoryCache {
    cache: Cache<String, Vec<u8>>,
    // 锁: 键 -> (持有者, 过期时刻)
    locks: std::sync::Arc<DashMap<String, (String, Instant)>>,
}

impl std::fmt::Debug for MemoryCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryCache")
            .field("entries", &self.cache.entry_count())
            .finish()
    }
}

impl MemoryCache {
    /// 创建新的进程内缓存
    ///
    /// # 参数
    ///
    /// * `capacity` - 最大条目数
    pub fn new(capacity: u64) -> Self {
        Self {
            cache: Cache::builder().max_capacity(capacity).build(),
            locks: std::sync::Arc::new(DashMap::new()),
        }
    }

    /// 清空缓存
    pub fn clear(&self) {
        debug!("MemoryCache clear: 清空所有缓存项");
        self.cache.invalidate_all();
    }
}

impl Default for MemoryCache {
    fn default() -> Self {
        Self::new(100_000)
    }
}

#[async_trait]
impl FastCache for MemoryCache {
    #[instrument(skip(self), level = "debug")]
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let value = self.cache.get(key).await;
        debug!("MemoryCache get: key={}, found={}", key, value.is_some());
        Ok(value)
    }

    #[instrument(skip(self, keys), level = "debug", fields(key_count = keys.len()))]
    async fn get_multi(&self, keys: &[String]) -> Result<HashMap<String, Vec<u8>>> {
        let mut found = HashMap::with_capacity(keys.len());
        for key in keys {
            if let Some(value) = self.cache.get(key.as_str()).await {
                found.insert(key.clone(), value);
            }
        }
        debug!("MemoryCache get_multi: {}/{} hit", found.len(), keys.len());
        Ok(found)
    }

    #[instrument(skip(self, value), level = "debug", fields(value_len = value.len()))]
    async fn set(&self, key: &str, value: Vec<u8>) -> Result<()> {
        self.cache.insert(key.to_string(), value).await;
        Ok(())
    }

    async fn try_lock(&self, key: &str, token: &str, ttl_ms: u64) -> Result<bool> {
        let now = Instant::now();
        let expire_at = now + Duration::from_millis(ttl_ms);
        let mut acquired = false;
        self.locks
            .entry(key.to_string())
            .and_modify(|(holder, deadline)| {
                if *deadline <= now {
                    *holder = token.to_string();
                    *deadline = expire_at;
                    acquired = true;
                }
            })
            .or_insert_with(|| {
                acquired = true;
                (token.to_string(), expire_at)
            });
        debug!("MemoryCache try_lock: key={}, acquired={}", key, acquired);
        Ok(acquired)
    }

    async fn unlock(&self, key: &str, token: &str) -> Result<bool> {
        let removed = self
            .locks
            .remove_if(key, |_, (holder, _)| holder == token)
            .is_some();
        Ok(removed)
    }
}
