//! Copyright (c) 2025-2026, Kirky.X
//!
//! MIT License
//!
//! 该模块定义了快速缓存适配器，包括共享的Redis后端和进程内的moka后端。

pub mod memory;
pub mod redis;
pub mod redis_provider;

use crate::error::Result;
use async_trait::async_trait;
use std::collections::HashMap;

pub use self::memory::MemoryCache;
pub use self::redis::RedisCache;

/// 快速缓存接口
///
/// 以字符串为键、字节串为值；未命中不是错误，而是 `None` 或结果中缺失该键。
/// 本系统不设置过期时间，条目写入后一直有效，后写者覆盖先写者。
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait FastCache: Send + Sync {
    /// 获取单个键
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>>;

    /// 批量获取，返回值只包含命中的键
    async fn get_multi(&self, keys: &[String]) -> Result<HashMap<String, Vec<u8>>>;

    /// 设置键值，不带过期时间
    async fn set(&self, key: &str, value: Vec<u8>) -> Result<()>;

    /// 尝试获取锁（仅串行准入模式使用）
    ///
    /// # 参数
    ///
    /// * `key` - 锁的键
    /// * `token` - 持有者标识，释放时必须匹配
    /// * `ttl_ms` - 锁的过期时间（毫秒）
    async fn try_lock(&self, key: &str, token: &str, ttl_ms: u64) -> Result<bool>;

    /// 释放锁，仅当 `token` 匹配时删除
    async fn unlock(&self, key: &str, token: &str) -> Result<bool>;
}
