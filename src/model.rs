//! Copyright (c) 2025-2026, Kirky.X
//!
//! MIT License
//!
//! 该模块定义了持久存储中的记录类型。

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// 酒店容量记录
///
/// 初始加载后不再变化，缓存于 `<hotelId>_cap`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HotelCapacity {
    pub hotel_id: String,
    pub total_rooms: u32,
}

/// 预订记录
///
/// 多晚入住按每晚一条记录持久化，`out_date` 总是 `in_date` 的下一天
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Booking {
    pub hotel_id: String,
    pub customer_name: String,
    pub in_date: NaiveDate,
    pub out_date: NaiveDate,
    pub number: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Address {
    pub street_number: String,
    pub street_name: String,
    pub city: String,
    pub state: String,
    pub country: String,
    pub postal_code: String,
    pub lat: f32,
    pub lon: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Image {
    pub url: String,
    #[serde(default)]
    pub default: bool,
}

/// 酒店资料
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HotelProfile {
    pub id: String,
    pub name: String,
    pub phone_number: String,
    pub description: String,
    pub address: Option<Address>,
    #[serde(default)]
    pub images: Vec<Image>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomType {
    pub bookable_rate: f64,
    pub total_rate: f64,
    pub total_rate_inclusive: f64,
    pub code: String,
    pub currency: String,
    pub room_description: String,
}

/// 价格计划
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RatePlan {
    pub hotel_id: String,
    pub code: String,
    pub in_date: String,
    pub out_date: String,
    pub room_type: RoomType,
}

/// 评论
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Review {
    pub review_id: String,
    pub hotel_id: String,
    pub name: String,
    pub rating: f32,
    pub description: String,
    pub images: Option<Image>,
}

/// 用户凭据，`password_hash` 为密码的 SHA-256 十六进制串
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserCredential {
    pub username: String,
    pub password_hash: String,
}

/// 推荐服务使用的酒店属性
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecommendationEntry {
    pub hotel_id: String,
    pub lat: f64,
    pub lon: f64,
    pub rate: f64,
    pub price: f64,
}
