//! Copyright (c) 2025-2026, Kirky.X
//!
//! MIT License
//!
//! 该模块定义了缓存值的编解码机制。
//!
//! 记录类的值（酒店资料、价格计划、评论）以 JSON 存放；
//! 计数类的值（容量、每晚已订房间数）以十进制字符串存放。

pub mod decimal;
pub mod json;

use crate::error::Result;
use serde::{de::DeserializeOwned, Serialize};

pub use decimal::DecimalCodec;
pub use json::JsonSerializer;

/// 序列化器特征
///
/// 定义序列化和反序列化操作的接口
pub trait Serializer: Send + Sync {
    /// 序列化值为字节数组
    fn serialize<T: Serialize>(&self, value: &T) -> Result<Vec<u8>>;

    /// 从字节数组反序列化值
    fn deserialize<T: DeserializeOwned>(&self, data: &[u8]) -> Result<T>;
}

/// 单一值类型的编解码器
///
/// 读穿透组件按值类型持有一个编解码器
pub trait Codec<V>: Send + Sync + 'static {
    fn encode(&self, value: &V) -> Result<Vec<u8>>;

    fn decode(&self, data: &[u8]) -> Result<V>;
}

impl<V> Codec<V> for JsonSerializer
where
    V: Serialize + DeserializeOwned,
{
    fn encode(&self, value: &V) -> Result<Vec<u8>> {
        self.serialize(value)
    }

    fn decode(&self, data: &[u8]) -> Result<V> {
        self.deserialize(data)
    }
}
