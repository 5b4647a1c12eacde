//! Copyright (c) 2025-2026, Kirky.X
//!
//! MIT License
//!
//! 该模块定义了读穿透组件使用的回源加载器接口。

use crate::error::Result;
use async_trait::async_trait;
use std::collections::HashMap;
use std::fmt::Debug;
use std::hash::Hash;

/// 未命中键的回源方式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadStrategy {
    /// 每个未命中的键一个并发任务
    PerKey,
    /// 所有未命中的键合并为一次批量查询
    Batched,
}

/// 回源加载器
///
/// 把一个业务标识映射为缓存键，并能从持久存储中加载对应的值。
#[async_trait]
pub trait RecordLoader: Send + Sync + 'static {
    /// 记录标识（例如酒店ID）
    type Id: Clone + Eq + Hash + Debug + Send + Sync + 'static;
    /// 缓存与返回的值类型
    type Value: Send + Sync + 'static;

    /// 标识对应的缓存键
    fn cache_key(&self, id: &Self::Id) -> String;

    /// 加载单个记录，存储中不存在时返回 `None`
    async fn load(&self, id: &Self::Id) -> Result<Option<Self::Value>>;

    /// 批量加载，结果只包含存储中存在的记录
    ///
    /// 默认逐个调用 [`RecordLoader::load`]
    async fn load_batch(&self, ids: &[Self::Id]) -> Result<HashMap<Self::Id, Self::Value>> {
        let mut values = HashMap::with_capacity(ids.len());
        for id in ids {
            if let Some(value) = self.load(id).await? {
                values.insert(id.clone(), value);
            }
        }
        Ok(values)
    }

    fn strategy(&self) -> LoadStrategy {
        LoadStrategy::PerKey
    }
}
