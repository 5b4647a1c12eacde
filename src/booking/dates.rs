//! Copyright (c) 2025-2026, Kirky.X
//!
//! MIT License
//!
//! 日期解析与半开区间 `[in_date, out_date)` 的逐晚展开。

use crate::error::{ReservationError, Result};
use chrono::NaiveDate;

pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// 解析 `YYYY-MM-DD` 格式的日期
pub fn parse_date(text: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(text.trim(), DATE_FORMAT)
        .map_err(|_| ReservationError::InvalidDate(text.to_string()))
}

/// 某晚的下一天，即单晚预订记录的离店日期
pub fn next_day(night: NaiveDate) -> Result<NaiveDate> {
    night
        .succ_opt()
        .ok_or_else(|| ReservationError::InvalidRequest(format!("date {} out of range", night)))
}

/// 展开区间内的每一晚，不包含 `out_date` 当晚
///
/// `out_date < in_date` 视为非法请求；两者相等时返回空列表。
pub fn nights(in_date: NaiveDate, out_date: NaiveDate) -> Result<Vec<NaiveDate>> {
    if out_date < in_date {
        return Err(ReservationError::InvalidRequest(format!(
            "outDate {} is before inDate {}",
            out_date, in_date
        )));
    }
    Ok(in_date.iter_days().take_while(|d| *d < out_date).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(text: &str) -> NaiveDate {
        parse_date(text).unwrap()
    }

    #[test]
    fn test_range_is_half_open() {
        assert_eq!(
            nights(d("2024-01-01"), d("2024-01-03")).unwrap(),
            vec![d("2024-01-01"), d("2024-01-02")]
        );
        assert!(nights(d("2024-01-01"), d("2024-01-01")).unwrap().is_empty());
    }

    #[test]
    fn test_range_crosses_month_and_leap_day() {
        let all = nights(d("2024-02-28"), d("2024-03-02")).unwrap();
        assert_eq!(all, vec![d("2024-02-28"), d("2024-02-29"), d("2024-03-01")]);
    }

    #[test]
    fn test_reversed_range_is_rejected() {
        let err = nights(d("2024-01-03"), d("2024-01-01")).unwrap_err();
        assert!(matches!(err, ReservationError::InvalidRequest(_)));
    }

    #[test]
    fn test_malformed_dates() {
        for bad in ["2024-13-01", "2024/01/01", "", "tomorrow"] {
            assert!(matches!(
                parse_date(bad),
                Err(ReservationError::InvalidDate(_))
            ));
        }
    }
}
