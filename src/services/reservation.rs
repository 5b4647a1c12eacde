//! Copyright (c) 2025-2026, Kirky.X
//!
//! MIT License
//!
//! 预订服务的RPC入口：解析请求并调用预订引擎。

use crate::booking::dates::parse_date;
use crate::booking::BookingEngine;
use crate::error::{ReservationError, Result};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::instrument;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReservationRequest {
    #[serde(default)]
    pub customer_name: String,
    pub hotel_id: Vec<String>,
    pub in_date: String,
    pub out_date: String,
    pub room_number: u32,
}

/// 可用性检查返回可用的酒店；预订成功返回该酒店，被拒绝时为空
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReservationResult {
    pub hotel_id: Vec<String>,
}

pub struct ReservationService {
    engine: Arc<BookingEngine>,
}

impl ReservationService {
    pub fn new(engine: Arc<BookingEngine>) -> Self {
        Self { engine }
    }

    #[instrument(skip(self), level = "info")]
    pub async fn check_availability(
        &self,
        request: &ReservationRequest,
    ) -> Result<ReservationResult> {
        let in_date = parse_date(&request.in_date)?;
        let out_date = parse_date(&request.out_date)?;
        let hotel_id = self
            .engine
            .check_availability(&request.hotel_id, in_date, out_date, request.room_number)
            .await?;
        Ok(ReservationResult { hotel_id })
    }

    /// 使用 `hotel_id` 中的第一家酒店
    #[instrument(skip(self), level = "info")]
    pub async fn make_reservation(
        &self,
        request: &ReservationRequest,
    ) -> Result<ReservationResult> {
        let hotel = request.hotel_id.first().ok_or_else(|| {
            ReservationError::InvalidRequest("reservation requires a hotel id".to_string())
        })?;
        let in_date = parse_date(&request.in_date)?;
        let out_date = parse_date(&request.out_date)?;

        let committed = self
            .engine
            .make_reservation(
                hotel,
                &request.customer_name,
                in_date,
                out_date,
                request.room_number,
            )
            .await?;
        let hotel_id = if committed {
            vec![hotel.clone()]
        } else {
            Vec::new()
        };
        Ok(ReservationResult { hotel_id })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_wire_names() {
        let request: ReservationRequest = serde_json::from_str(
            r#"{"customerName":"Alice","hotelId":["1"],"inDate":"2015-04-09","outDate":"2015-04-10","roomNumber":1}"#,
        )
        .unwrap();
        assert_eq!(request.hotel_id, vec!["1"]);
        assert_eq!(request.room_number, 1);

        let result = serde_json::to_value(ReservationResult {
            hotel_id: vec!["1".to_string()],
        })
        .unwrap();
        assert_eq!(result, serde_json::json!({"hotelId": ["1"]}));
    }
}
