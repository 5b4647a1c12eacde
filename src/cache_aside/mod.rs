//! Copyright (c) 2025-2026, Kirky.X
//!
//! MIT License
//!
//! 读穿透组件
//!
//! 先批量查询快速缓存，未命中的键回源到持久存储，再把回源得到的值写回缓存。
//! 缓存传输错误对整个请求是致命的；回源错误按 [`MissPolicy`] 处理。

pub mod loader;

use crate::backend::FastCache;
use crate::error::Result;
use crate::metrics::GLOBAL_METRICS;
use crate::serialization::Codec;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio::task::JoinSet;
use tracing::{debug, instrument, warn};

pub use loader::{LoadStrategy, RecordLoader};

/// 回源失败时的处理策略
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MissPolicy {
    /// 记录日志并从结果中省略该键
    Degrade,
    /// 错误向调用方传播
    Abort,
}

/// 回写缓存的方式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteBack {
    /// 后台任务写入，不等待结果
    Detached,
    /// 在当前请求中等待写入完成，失败仍只记录日志
    Awaited,
}

/// 读穿透组件
pub struct ReadThrough<L: RecordLoader, C> {
    name: Arc<str>,
    cache: Arc<dyn FastCache>,
    loader: Arc<L>,
    codec: Arc<C>,
    policy: MissPolicy,
    write_back: WriteBack,
}

impl<L: RecordLoader, C> Clone for ReadThrough<L, C> {
    fn clone(&self) -> Self {
        Self {
            name: Arc::clone(&self.name),
            cache: Arc::clone(&self.cache),
            loader: Arc::clone(&self.loader),
            codec: Arc::clone(&self.codec),
            policy: self.policy,
            write_back: self.write_back,
        }
    }
}

impl<L, C> ReadThrough<L, C>
where
    L: RecordLoader,
    C: Codec<L::Value>,
{
    /// 创建读穿透组件，默认后台回写
    ///
    /// # 参数
    ///
    /// * `name` - 组件名称，用于日志和指标
    /// * `cache` - 快速缓存
    /// * `loader` - 回源加载器
    /// * `codec` - 值的编解码器
    /// * `policy` - 回源失败策略
    pub fn new(
        name: &str,
        cache: Arc<dyn FastCache>,
        loader: L,
        codec: C,
        policy: MissPolicy,
    ) -> Self {
        Self {
            name: Arc::from(name),
            cache,
            loader: Arc::new(loader),
            codec: Arc::new(codec),
            policy,
            write_back: WriteBack::Detached,
        }
    }

    pub fn with_write_back(mut self, write_back: WriteBack) -> Self {
        self.write_back = write_back;
        self
    }

    pub fn loader(&self) -> &L {
        &self.loader
    }

    /// 批量读取，返回每个能解析到的键及其值
    ///
    /// 重复的标识只查询一次；回源失败的键在 `Degrade` 策略下被省略。
    #[instrument(skip(self, ids), level = "debug", fields(name = %self.name, count = ids.len()))]
    pub async fn fetch_many(&self, ids: &[L::Id]) -> Result<HashMap<L::Id, L::Value>> {
        let mut seen = HashSet::with_capacity(ids.len());
        let unique: Vec<L::Id> = ids
            .iter()
            .filter(|id| seen.insert((*id).clone()))
            .cloned()
            .collect();

        let (mut found, missing) = self.lookup_cached(&unique).await?;
        debug!(
            "{}: {} cached, {} to load",
            self.name,
            found.len(),
            missing.len()
        );
        found.extend(self.load_missing(missing).await?);
        Ok(found)
    }

    /// 单键读取
    #[instrument(skip(self), level = "debug", fields(name = %self.name))]
    pub async fn fetch_one(&self, id: &L::Id) -> Result<Option<L::Value>> {
        let key = self.loader.cache_key(id);
        if let Some(blob) = self.cache.get(&key).await? {
            if let Some(value) = self.decode_hit(&key, &blob) {
                return Ok(Some(value));
            }
        } else {
            GLOBAL_METRICS.record_request(&self.name, "cache", "get", "miss");
        }

        match self.load_one(id).await {
            Ok(value) => Ok(value),
            Err(e) => self.tolerate(id, e).map(|_| None),
        }
    }

    /// 只查询缓存，返回命中的值和仍需回源的标识
    ///
    /// 无法解码的缓存值按未命中处理。
    pub async fn lookup_cached(
        &self,
        ids: &[L::Id],
    ) -> Result<(HashMap<L::Id, L::Value>, Vec<L::Id>)> {
        if ids.is_empty() {
            return Ok((HashMap::new(), Vec::new()));
        }

        let keys: Vec<String> = ids.iter().map(|id| self.loader.cache_key(id)).collect();
        let blobs = self.cache.get_multi(&keys).await?;

        let mut found = HashMap::with_capacity(blobs.len());
        let mut missing = Vec::new();
        for (id, key) in ids.iter().zip(keys.iter()) {
            match blobs.get(key) {
                Some(blob) => match self.decode_hit(key, blob) {
                    Some(value) => {
                        found.insert(id.clone(), value);
                    }
                    None => missing.push(id.clone()),
                },
                None => {
                    GLOBAL_METRICS.record_request(&self.name, "cache", "get", "miss");
                    missing.push(id.clone());
                }
            }
        }
        Ok((found, missing))
    }

    /// 回源加载一组未命中的标识并回写缓存
    pub async fn load_missing(&self, ids: Vec<L::Id>) -> Result<HashMap<L::Id, L::Value>> {
        if ids.is_empty() {
            return Ok(HashMap::new());
        }
        match self.loader.strategy() {
            LoadStrategy::Batched => self.load_batched(ids).await,
            LoadStrategy::PerKey => self.load_per_key(ids).await,
        }
    }

    /// 回源加载单个标识并回写缓存，错误原样返回
    pub async fn load_one(&self, id: &L::Id) -> Result<Option<L::Value>> {
        match self.loader.load(id).await {
            Ok(Some(value)) => {
                GLOBAL_METRICS.record_request(&self.name, "store", "load", "hit");
                self.populate(id, &value).await;
                Ok(Some(value))
            }
            Ok(None) => {
                GLOBAL_METRICS.record_request(&self.name, "store", "load", "miss");
                debug!("{}: {:?} not present in store", self.name, id);
                Ok(None)
            }
            Err(e) => {
                GLOBAL_METRICS.record_request(&self.name, "store", "load", "error");
                Err(e)
            }
        }
    }

    /// 把值写回缓存，失败只记录警告
    pub async fn populate(&self, id: &L::Id, value: &L::Value) {
        let key = self.loader.cache_key(id);
        let blob = match self.codec.encode(value) {
            Ok(blob) => blob,
            Err(e) => {
                warn!("{}: failed to encode {} for write-back: {}", self.name, key, e);
                return;
            }
        };

        match self.write_back {
            WriteBack::Detached => {
                let cache = Arc::clone(&self.cache);
                let name = Arc::clone(&self.name);
                tokio::spawn(async move {
                    if let Err(e) = cache.set(&key, blob).await {
                        warn!("{}: cache write-back for {} failed: {}", name, key, e);
                    }
                });
            }
            WriteBack::Awaited => {
                if let Err(e) = self.cache.set(&key, blob).await {
                    warn!("{}: cache write-back for {} failed: {}", self.name, key, e);
                }
            }
        }
    }

    fn decode_hit(&self, key: &str, blob: &[u8]) -> Option<L::Value> {
        match self.codec.decode(blob) {
            Ok(value) => {
                GLOBAL_METRICS.record_request(&self.name, "cache", "get", "hit");
                Some(value)
            }
            Err(e) => {
                GLOBAL_METRICS.record_request(&self.name, "cache", "get", "corrupt");
                warn!("{}: ignoring undecodable cache entry {}: {}", self.name, key, e);
                None
            }
        }
    }

    fn tolerate(&self, id: &L::Id, e: crate::error::ReservationError) -> Result<()> {
        match self.policy {
            MissPolicy::Degrade => {
                warn!("{}: omitting {:?} after store error: {}", self.name, id, e);
                Ok(())
            }
            MissPolicy::Abort => Err(e),
        }
    }

    async fn load_batched(&self, ids: Vec<L::Id>) -> Result<HashMap<L::Id, L::Value>> {
        let values = match self.loader.load_batch(&ids).await {
            Ok(values) => values,
            Err(e) => {
                GLOBAL_METRICS.record_request(&self.name, "store", "load", "error");
                return match self.policy {
                    MissPolicy::Degrade => {
                        warn!(
                            "{}: omitting {} keys after batch store error: {}",
                            self.name,
                            ids.len(),
                            e
                        );
                        Ok(HashMap::new())
                    }
                    MissPolicy::Abort => Err(e),
                };
            }
        };

        for id in &ids {
            match values.get(id) {
                Some(value) => {
                    GLOBAL_METRICS.record_request(&self.name, "store", "load", "hit");
                    self.populate(id, value).await;
                }
                None => GLOBAL_METRICS.record_request(&self.name, "store", "load", "miss"),
            }
        }
        Ok(values)
    }

    async fn load_per_key(&self, ids: Vec<L::Id>) -> Result<HashMap<L::Id, L::Value>> {
        let accumulator = Arc::new(Mutex::new(HashMap::with_capacity(ids.len())));
        let mut tasks = JoinSet::new();

        for id in ids {
            let this = self.clone();
            let accumulator = Arc::clone(&accumulator);
            tasks.spawn(async move {
                match this.load_one(&id).await {
                    Ok(Some(value)) => {
                        accumulator.lock().await.insert(id, value);
                        Ok(())
                    }
                    Ok(None) => Ok(()),
                    Err(e) => this.tolerate(&id, e),
                }
            });
        }

        // 所有任务结束后才读取累加结果
        while let Some(joined) = tasks.join_next().await {
            joined??;
        }

        let values = match Arc::try_unwrap(accumulator) {
            Ok(values) => values.into_inner(),
            Err(shared) => std::mem::take(&mut *shared.lock().await),
        };
        Ok(values)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{MemoryCache, MockFastCache};
    use crate::error::ReservationError;
    use crate::serialization::JsonSerializer;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct TableLoader {
        rows: HashMap<String, String>,
        failing: HashSet<String>,
        loads: Arc<AtomicUsize>,
        batches: Arc<AtomicUsize>,
        batched: bool,
    }

    impl TableLoader {
        fn with_rows(rows: &[(&str, &str)]) -> Self {
            Self {
                rows: rows
                    .iter()
                    .map(|(k, v)| (k.to_string(), v.to_string()))
                    .collect(),
                ..Default::default()
            }
        }
    }

    #[async_trait]
    impl RecordLoader for TableLoader {
        type Id = String;
        type Value = String;

        fn cache_key(&self, id: &String) -> String {
            format!("t:{}", id)
        }

        async fn load(&self, id: &String) -> Result<Option<String>> {
            self.loads.fetch_add(1, Ordering::SeqCst);
            if self.failing.contains(id) {
                return Err(ReservationError::StoreError(format!("{} unavailable", id)));
            }
            Ok(self.rows.get(id).cloned())
        }

        async fn load_batch(&self, ids: &[String]) -> Result<HashMap<String, String>> {
            self.batches.fetch_add(1, Ordering::SeqCst);
            Ok(ids
                .iter()
                .filter_map(|id| self.rows.get(id).map(|v| (id.clone(), v.clone())))
                .collect())
        }

        fn strategy(&self) -> LoadStrategy {
            if self.batched {
                LoadStrategy::Batched
            } else {
                LoadStrategy::PerKey
            }
        }
    }

    fn ids(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    fn read_through(
        cache: Arc<dyn FastCache>,
        loader: TableLoader,
        policy: MissPolicy,
    ) -> ReadThrough<TableLoader, JsonSerializer> {
        ReadThrough::new("test", cache, loader, JsonSerializer, policy)
            .with_write_back(WriteBack::Awaited)
    }

    #[tokio::test]
    async fn cold_read_loads_and_populates_cache() {
        let cache = Arc::new(MemoryCache::new(100));
        let loader = TableLoader::with_rows(&[("a", "alpha"), ("b", "beta")]);
        let loads = Arc::clone(&loader.loads);
        let rt = read_through(cache.clone(), loader, MissPolicy::Degrade);

        let values = rt.fetch_many(&ids(&["a", "b"])).await.unwrap();
        assert_eq!(values.len(), 2);
        assert_eq!(values["a"], "alpha");
        assert_eq!(loads.load(Ordering::SeqCst), 2);
        assert_eq!(
            cache.get("t:a").await.unwrap(),
            Some(b"\"alpha\"".to_vec())
        );

        // 第二次读取全部命中缓存
        let again = rt.fetch_many(&ids(&["a", "b"])).await.unwrap();
        assert_eq!(again, values);
        assert_eq!(loads.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn degrade_policy_omits_failed_keys() {
        let cache = Arc::new(MemoryCache::new(100));
        let mut loader = TableLoader::with_rows(&[("a", "alpha"), ("b", "beta")]);
        loader.failing.insert("b".to_string());
        let rt = read_through(cache, loader, MissPolicy::Degrade);

        let values = rt.fetch_many(&ids(&["a", "b", "c"])).await.unwrap();
        assert_eq!(values.len(), 1);
        assert_eq!(values["a"], "alpha");
    }

    #[tokio::test]
    async fn abort_policy_propagates_store_errors() {
        let cache = Arc::new(MemoryCache::new(100));
        let mut loader = TableLoader::with_rows(&[("a", "alpha")]);
        loader.failing.insert("a".to_string());
        let rt = read_through(cache, loader, MissPolicy::Abort);

        let result = rt.fetch_many(&ids(&["a"])).await;
        assert!(matches!(result, Err(ReservationError::StoreError(_))));
    }

    #[tokio::test]
    async fn cache_transport_error_is_fatal() {
        let mut cache = MockFastCache::new();
        cache
            .expect_get_multi()
            .returning(|_| Err(ReservationError::Cache("connection reset".to_string())));
        let loader = TableLoader::with_rows(&[("a", "alpha")]);
        let loads = Arc::clone(&loader.loads);
        let rt = read_through(Arc::new(cache), loader, MissPolicy::Degrade);

        let result = rt.fetch_many(&ids(&["a"])).await;
        assert!(matches!(result, Err(ReservationError::Cache(_))));
        assert_eq!(loads.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn undecodable_entry_falls_back_to_store() {
        let cache = Arc::new(MemoryCache::new(100));
        cache.set("t:a", b"{not json".to_vec()).await.unwrap();
        let rt = read_through(
            cache.clone(),
            TableLoader::with_rows(&[("a", "alpha")]),
            MissPolicy::Degrade,
        );

        let value = rt.fetch_one(&"a".to_string()).await.unwrap();
        assert_eq!(value.as_deref(), Some("alpha"));
        assert_eq!(
            cache.get("t:a").await.unwrap(),
            Some(b"\"alpha\"".to_vec())
        );
    }

    #[tokio::test]
    async fn duplicate_ids_load_once() {
        let cache = Arc::new(MemoryCache::new(100));
        let loader = TableLoader::with_rows(&[("a", "alpha")]);
        let loads = Arc::clone(&loader.loads);
        let rt = read_through(cache, loader, MissPolicy::Degrade);

        let values = rt.fetch_many(&ids(&["a", "a", "a"])).await.unwrap();
        assert_eq!(values.len(), 1);
        assert_eq!(loads.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn batched_strategy_issues_single_query() {
        let cache = Arc::new(MemoryCache::new(100));
        let mut loader = TableLoader::with_rows(&[("a", "alpha"), ("b", "beta")]);
        loader.batched = true;
        let batches = Arc::clone(&loader.batches);
        let loads = Arc::clone(&loader.loads);
        let rt = read_through(cache, loader, MissPolicy::Abort);

        let values = rt.fetch_many(&ids(&["a", "b", "c"])).await.unwrap();
        assert_eq!(values.len(), 2);
        assert_eq!(batches.load(Ordering::SeqCst), 1);
        assert_eq!(loads.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn fetch_one_missing_record_is_none() {
        let cache = Arc::new(MemoryCache::new(100));
        let rt = read_through(cache.clone(), TableLoader::default(), MissPolicy::Abort);

        assert_eq!(rt.fetch_one(&"zzz".to_string()).await.unwrap(), None);
        assert_eq!(cache.get("t:zzz").await.unwrap(), None);
    }
}
