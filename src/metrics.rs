//! Copyright (c) 2025, Kirky.X
//!
//! MIT License
//!
//! 该模块定义了预订系统的指标收集功能。

use dashmap::DashMap;
use lazy_static::lazy_static;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{span, Level};

/// 指标收集器
///
/// 用于收集和存储预订系统的各种运行时指标
#[derive(Clone, Debug, Default)]
pub struct Metrics {
    /// 请求总数统计
    /// key: "service:layer:op:result"
    pub requests_total: Arc<DashMap<String, u64>>,
    /// 操作耗时（累积时间和计数，用于计算平均值）
    /// key: "service:layer:op" -> (total_duration_secs, count)
    pub operation_duration: Arc<DashMap<String, (f64, u64)>>,
}

lazy_static! {
    /// 全局指标实例
    pub static ref GLOBAL_METRICS: Metrics = Metrics::default();
}

impl Metrics {
    /// 记录请求指标
    ///
    /// # 参数
    ///
    /// * `service` - 读穿透组件或服务名称
    /// * `layer` - 数据层（cache/store/booking）
    /// * `op` - 操作类型（get/load/admit）
    /// * `result` - 操作结果（hit/miss/error/reject 等）
    pub fn record_request(&self, service: &str, layer: &str, op: &str, result: &str) {
        let span = span!(Level::TRACE, "reservation_request", service, layer, op, result);
        let _enter = span.enter();
        let key = format!("{}:{}:{}:{}", service, layer, op, result);
        *self.requests_total.entry(key).or_insert(0) += 1;
    }

    /// 记录操作耗时
    pub fn record_duration(&self, service: &str, layer: &str, op: &str, duration_secs: f64) {
        let key = format!("{}:{}:{}", service, layer, op);
        let mut entry = self.operation_duration.entry(key).or_insert((0.0, 0));
        entry.0 += duration_secs;
        entry.1 += 1;
    }

    /// 读取单个计数，不存在时为0
    pub fn get(&self, service: &str, layer: &str, op: &str, result: &str) -> u64 {
        let key = format!("{}:{}:{}:{}", service, layer, op, result);
        self.requests_total.get(&key).map(|v| *v).unwrap_or(0)
    }

    /// 按键排序的计数快照
    pub fn snapshot(&self) -> BTreeMap<String, u64> {
        self.requests_total
            .iter()
            .map(|entry| (entry.key().clone(), *entry.value()))
            .collect()
    }
}

/// 获取指标字符串
///
/// 将所有指标格式化为文本，每行一个指标
pub fn get_metrics_string() -> String {
    let metrics = &GLOBAL_METRICS;
    let mut output = String::new();
    for (k, v) in metrics.snapshot() {
        output.push_str(&format!(
            "reservation_requests_total{{labels=\"{}\"}} {}\n",
            k, v
        ));
    }

    let mut durations: Vec<(String, (f64, u64))> = metrics
        .operation_duration
        .iter()
        .map(|entry| (entry.key().clone(), *entry.value()))
        .collect();
    durations.sort_by(|a, b| a.0.cmp(&b.0));
    for (k, (total, count)) in durations {
        let parts: Vec<&str> = k.split(':').collect();
        if parts.len() == 3 {
            output.push_str(&format!(
                "reservation_operation_duration_seconds_sum{{service=\"{}\", layer=\"{}\", operation=\"{}\"}} {}\n",
                parts[0], parts[1], parts[2], total
            ));
            output.push_str(&format!(
                "reservation_operation_duration_seconds_count{{service=\"{}\", layer=\"{}\", operation=\"{}\"}} {}\n",
                parts[0], parts[1], parts[2], count
            ));
        }
    }
    output
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_accumulate_per_label() {
        let metrics = Metrics::default();
        metrics.record_request("profile", "cache", "get", "hit");
        metrics.record_request("profile", "cache", "get", "hit");
        metrics.record_request("profile", "cache", "get", "miss");

        assert_eq!(metrics.get("profile", "cache", "get", "hit"), 2);
        assert_eq!(metrics.get("profile", "cache", "get", "miss"), 1);
        assert_eq!(metrics.get("profile", "store", "load", "hit"), 0);
        assert_eq!(metrics.snapshot().len(), 2);
    }

    #[test]
    fn durations_track_sum_and_count() {
        let metrics = Metrics::default();
        metrics.record_duration("booking", "engine", "reserve", 0.5);
        metrics.record_duration("booking", "engine", "reserve", 0.25);

        let entry = metrics
            .operation_duration
            .get("booking:engine:reserve")
            .map(|v| *v)
            .unwrap();
        assert_eq!(entry, (0.75, 2));
    }
}
