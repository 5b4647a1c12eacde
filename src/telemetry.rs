//! Copyright (c) 2025-2026, Kirky.X
//!
//! MIT License
//!
//! 该模块定义了预订系统的日志与链路追踪初始化。

use opentelemetry::global;
use opentelemetry::trace::TracerProvider;
use opentelemetry_sdk::trace::TracerProvider as SdkTracerProvider;
use tracing_subscriber::{layer::SubscriberExt, EnvFilter, Registry};

/// 初始化 tracing
///
/// 应在进程启动时调用一次。安装由 `EnvFilter`、控制台输出层与
/// OpenTelemetry 层组成的全局 subscriber。未配置导出器，span 只在进程内流转。
///
/// # 参数
///
/// * `service_name` - 服务名称，作为 tracer 名称
/// * `filter` - 过滤表达式；设置了 `RUST_LOG` 时以环境变量为准
///
/// # 返回值
///
/// 已存在全局 subscriber 时返回 `false`
pub fn init_tracing(service_name: &str, filter: &str) -> bool {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    let provider = SdkTracerProvider::builder().build();
    global::set_tracer_provider(provider.clone());
    let tracer = provider.tracer(service_name.to_string());

    let subscriber = Registry::default()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_target(true))
        .with(tracing_opentelemetry::layer().with_tracer(tracer));

    tracing::subscriber::set_global_default(subscriber).is_ok()
}

/// 关闭全局 tracer provider
pub fn shutdown_tracing() {
    global::shutdown_tracer_provider();
}
