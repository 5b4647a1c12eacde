//! Copyright (c) 2025, Kirky.X
//!
//! MIT License
//!
//! 该模块定义了Redis提供者接口和默认实现。

use crate::{
    config::CacheConfig,
    error::{ReservationError, Result},
};
use async_trait::async_trait;
use redis::{aio::ConnectionManager, Client};
use secrecy::ExposeSecret;
use tokio::time::{timeout, Duration};

#[async_trait]
pub trait RedisProvider: Send + Sync {
    async fn get_standalone_client(&self, config: &CacheConfig) -> Result<ConnectionManager>;
    async fn get_cluster_client(&self, config: &CacheConfig)
        -> Result<redis::cluster::ClusterClient>;
}

pub struct DefaultRedisProvider;

#[async_trait]
impl RedisProvider for DefaultRedisProvider {
    async fn get_standalone_client(&self, config: &CacheConfig) -> Result<ConnectionManager> {
        let connection_string = config.connection_string.expose_secret();
        let client = Client::open(connection_string)?;
        match timeout(
            Duration::from_millis(config.connection_timeout_ms),
            client.get_connection_manager(),
        )
        .await
        {
            Ok(res) => Ok(res?),
            Err(_) => Err(ReservationError::Cache(format!(
                "Connection timed out after {}ms",
                config.connection_timeout_ms
            ))),
        }
    }

    async fn get_cluster_client(
        &self,
        config: &CacheConfig,
    ) -> Result<redis::cluster::ClusterClient> {
        let cluster_config = config.cluster.as_ref().ok_or_else(|| {
            ReservationError::Config("Cluster configuration is missing".to_string())
        })?;

        let client =
            redis::cluster::ClusterClient::builder(cluster_config.nodes.clone()).build()?;

        timeout(
            Duration::from_millis(config.connection_timeout_ms),
            client.get_async_connection(),
        )
        .await
        .map_err(|_| {
            ReservationError::Cache(format!(
                "Connection timed out after {}ms",
                config.connection_timeout_ms
            ))
        })??;
        Ok(client)
    }
}
