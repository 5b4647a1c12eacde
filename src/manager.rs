//! Copyright (c) 2025-2026, Kirky.X
//!
//! MIT License
//!
//! 该模块定义了服务管理器，负责按配置组装缓存、存储与各服务，并管理服务注册。

use crate::backend::{FastCache, MemoryCache, RedisCache};
use crate::booking::BookingEngine;
use crate::config::{CacheBackendType, CacheConfig, Config, StoreConfig};
use crate::error::{ReservationError, Result};
use crate::registry::{ServiceHandle, ServiceInstance, ServiceRegistry};
use crate::services::{
    ProfileService, RateService, RecommendationService, ReservationService, ReviewService,
    UserService, ALL_SERVICES,
};
use crate::store::{BookingStore, CatalogStore, SqlStore};
use std::sync::Arc;
use tracing::{info, instrument, warn};

/// 服务管理器
///
/// 持有所有服务实例共享的快速缓存与持久存储
pub struct ServiceManager {
    config: Config,
    cache: Arc<dyn FastCache>,
    reservation: ReservationService,
    profile: ProfileService,
    rate: RateService,
    review: ReviewService,
    user: UserService,
    recommendation: RecommendationService,
    registry: Arc<dyn ServiceRegistry>,
    handles: Vec<ServiceHandle>,
}

/// 按配置连接快速缓存
#[instrument(skip(config), level = "info", fields(backend = ?config.backend))]
pub async fn connect_cache(config: &CacheConfig) -> Result<Arc<dyn FastCache>> {
    match config.backend {
        CacheBackendType::Redis => {
            let cache = RedisCache::new(config).await?;
            cache.ping().await?;
            Ok(Arc::new(cache))
        }
        CacheBackendType::Memory => Ok(Arc::new(MemoryCache::new(config.max_capacity))),
    }
}

/// 按配置连接持久存储并建表
#[instrument(skip(config), level = "info")]
pub async fn connect_store(config: &StoreConfig) -> Result<SqlStore> {
    let store = SqlStore::connect(config).await?;
    store.ensure_schema().await?;
    Ok(store)
}

impl ServiceManager {
    /// 初始化服务管理器
    ///
    /// 校验配置，连接缓存与存储，加载用户与推荐表
    #[instrument(skip(config, registry), level = "info", fields(service_count = config.services.len()))]
    pub async fn init(config: Config, registry: Arc<dyn ServiceRegistry>) -> Result<Self> {
        config.validate().map_err(ReservationError::Config)?;

        let cache = connect_cache(&config.cache).await?;
        let store = Arc::new(connect_store(&config.store).await?);
        let booking_store: Arc<dyn BookingStore> = store.clone();
        let catalog_store: Arc<dyn CatalogStore> = store;

        Self::build(config, cache, booking_store, catalog_store, registry).await
    }

    /// 使用已有的缓存与存储组装服务
    pub async fn build(
        config: Config,
        cache: Arc<dyn FastCache>,
        booking_store: Arc<dyn BookingStore>,
        catalog_store: Arc<dyn CatalogStore>,
        registry: Arc<dyn ServiceRegistry>,
    ) -> Result<Self> {
        let engine = Arc::new(BookingEngine::new(
            Arc::clone(&cache),
            booking_store,
            config.reservation.clone(),
        ));
        let user = UserService::load(catalog_store.as_ref()).await?;
        let recommendation = RecommendationService::load(catalog_store.as_ref()).await?;

        info!(
            "ServiceManager ready: {} users, cache backend {:?}",
            user.len(),
            config.cache.backend
        );
        Ok(Self {
            reservation: ReservationService::new(engine),
            profile: ProfileService::new(Arc::clone(&cache), Arc::clone(&catalog_store)),
            rate: RateService::new(Arc::clone(&cache), Arc::clone(&catalog_store)),
            review: ReviewService::new(Arc::clone(&cache), catalog_store),
            user,
            recommendation,
            cache,
            config,
            registry,
            handles: Vec::new(),
        })
    }

    /// 注册 `[services]` 中配置的实例
    ///
    /// 未知的服务名视为配置错误
    pub async fn register_services(&mut self) -> Result<()> {
        let mut names: Vec<&String> = self.config.services.keys().collect();
        names.sort();
        for name in names {
            if !ALL_SERVICES.contains(&name.as_str()) {
                return Err(ReservationError::Config(format!(
                    "unknown service '{}'",
                    name
                )));
            }
            let port = self.config.services[name].port;
            let instance =
                ServiceInstance::new(name, &self.config.global.advertise_address, port);
            let handle = ServiceHandle::register(Arc::clone(&self.registry), instance).await?;
            self.handles.push(handle);
        }
        Ok(())
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn cache(&self) -> &Arc<dyn FastCache> {
        &self.cache
    }

    pub fn registry(&self) -> &Arc<dyn ServiceRegistry> {
        &self.registry
    }

    pub fn registered(&self) -> Vec<&ServiceInstance> {
        self.handles.iter().map(|h| h.instance()).collect()
    }

    pub fn reservation(&self) -> &ReservationService {
        &self.reservation
    }

    pub fn profile(&self) -> &ProfileService {
        &self.profile
    }

    pub fn rate(&self) -> &RateService {
        &self.rate
    }

    pub fn review(&self) -> &ReviewService {
        &self.review
    }

    pub fn user(&self) -> &UserService {
        &self.user
    }

    pub fn recommendation(&self) -> &RecommendationService {
        &self.recommendation
    }

    /// 注销所有已注册的实例
    #[instrument(skip(self), level = "info")]
    pub async fn shutdown(self) -> Result<()> {
        let mut errors = Vec::new();
        for handle in self.handles {
            let name = handle.instance().name.clone();
            if let Err(e) = handle.shutdown().await {
                warn!("Failed to deregister {}: {}", name, e);
                errors.push(format!("{}: {}", name, e));
            }
        }

        if errors.is_empty() {
            info!("All service instances deregistered");
            Ok(())
        } else {
            Err(ReservationError::Registry(format!(
                "failed to deregister: {}",
                errors.join(", ")
            )))
        }
    }
}
