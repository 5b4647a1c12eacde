//! hotel-reservation - 酒店预订与可用性引擎
//!
//! 以共享快速缓存加持久存储的读穿透方式解析酒店容量与每晚已订房间数，
//! 并发检查多家酒店的可用性，以两阶段方式提交预订。
//! 同一套读穿透组件也服务于酒店资料、价格计划和评论查询。

#![doc(html_root_url = "https://docs.rs/hotel-reservation/0.1.0")]

pub mod backend;
pub mod booking;
pub mod cache_aside;
pub mod cli;
pub mod config;
pub mod error;
pub mod manager;
pub mod metrics;
pub mod model;
pub mod registry;
pub mod serialization;
pub mod services;
pub mod store;
pub mod telemetry;

// Re-export commonly used items
pub use booking::BookingEngine;
pub use config::Config;
pub use error::{ReservationError, Result};
pub use manager::ServiceManager;

/// hotel-reservation 版本号
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
