//! Copyright (c) 2025-2026, Kirky.X
//!
//! MIT License
//!
//! 该模块定义了预订系统的错误类型和处理机制。

use thiserror::Error;

/// 预订系统错误类型枚举
///
/// 缓存未命中与容量不足都不是错误：前者返回 `None`，后者返回空结果。
#[derive(Error, Debug)]
pub enum ReservationError {
    /// 序列化错误
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// 快速缓存传输失败（非未命中）
    #[error("Cache operation failed: {0}")]
    Cache(String),

    /// Redis错误
    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),

    /// Sea-ORM数据库错误
    #[error("Store error: {0}")]
    Store(#[from] sea_orm::DbErr),

    /// 持久存储的其他错误
    #[error("Store operation failed: {0}")]
    StoreError(String),

    /// 引用的记录不存在（例如酒店没有容量记录）
    #[error("Not found: {0}")]
    NotFound(String),

    /// 请求参数不合法
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// 日期格式错误
    #[error("Invalid date '{0}', expected YYYY-MM-DD")]
    InvalidDate(String),

    /// 配置错误
    #[error("Configuration error: {0}")]
    Config(String),

    /// 服务注册/发现错误
    #[error("Registry error: {0}")]
    Registry(String),

    /// 在等待时间内未能获取准入锁
    #[error("Timed out acquiring admission lock for {0}")]
    LockTimeout(String),

    /// 并发子任务失败
    #[error("Task failed: {0}")]
    Task(String),

    /// IO错误
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// RPC 边界上的状态分类
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RpcStatus {
    /// 请求本身不合法
    InvalidArgument,
    /// 基础设施故障或存储不一致
    Internal,
}

impl ReservationError {
    /// 将错误映射为 RPC 状态
    ///
    /// not-found 在预订路径上视为存储不一致，按内部错误处理。
    pub fn status(&self) -> RpcStatus {
        match self {
            ReservationError::InvalidRequest(_) | ReservationError::InvalidDate(_) => {
                RpcStatus::InvalidArgument
            }
            _ => RpcStatus::Internal,
        }
    }
}

impl From<tokio::task::JoinError> for ReservationError {
    fn from(e: tokio::task::JoinError) -> Self {
        ReservationError::Task(e.to_string())
    }
}

/// 预订操作结果类型别名
pub type Result<T> = std::result::Result<T, ReservationError>;
