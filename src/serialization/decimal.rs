//! Copyright (c) 2025-2026, Kirky.X
//!
//! MIT License
//!
//! 十进制字符串编解码器，用于容量与已订房间数。

use super::Codec;
use crate::error::{ReservationError, Result};

/// 十进制计数编解码器
///
/// 缓存中的计数以 ASCII 十进制字符串存放，例如 `b"10"`。
#[derive(Clone, Debug, Default)]
pub struct DecimalCodec;

impl Codec<u32> for DecimalCodec {
    fn encode(&self, value: &u32) -> Result<Vec<u8>> {
        Ok(value.to_string().into_bytes())
    }

    fn decode(&self, data: &[u8]) -> Result<u32> {
        let text = std::str::from_utf8(data)
            .map_err(|e| ReservationError::Serialization(e.to_string()))?;
        text.trim()
            .parse::<u32>()
            .map_err(|e| ReservationError::Serialization(format!("'{}': {}", text, e)))
    }
}
