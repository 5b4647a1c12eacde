//! Copyright (c) 2025-2026, Kirky.X
//!
//! MIT License
//!
//! 该模块是预订服务命令行的入口点。

use anyhow::Result;

#[tokio::main]
async fn main() -> Result<()> {
    let result = hotel_reservation::cli::run().await;
    hotel_reservation::telemetry::shutdown_tracing();
    result
}
