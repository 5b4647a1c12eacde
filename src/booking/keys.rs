//! Copyright (c) 2025-2026, Kirky.X
//!
//! MIT License
//!
//! 预订引擎使用的缓存键。检查路径与提交路径必须使用同一组键。

use chrono::NaiveDate;

/// 酒店容量的缓存键：`<hotelId>_cap`
pub fn capacity_key(hotel_id: &str) -> String {
    format!("{}_cap", hotel_id)
}

/// 某晚已订房间数的缓存键：`<hotelId>_<night>_<night>`
pub fn night_key(hotel_id: &str, night: NaiveDate) -> String {
    format!("{}_{}_{}", hotel_id, night, night)
}

/// 串行准入模式下的酒店锁
pub fn lock_key(hotel_id: &str) -> String {
    format!("{}_lock", hotel_id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_layout() {
        let night = NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
        assert_eq!(capacity_key("H1"), "H1_cap");
        assert_eq!(night_key("H1", night), "H1_2024-01-02_2024-01-02");
        assert_eq!(lock_key("H1"), "H1_lock");
    }
}
