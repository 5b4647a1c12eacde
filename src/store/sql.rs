//! Copyright (c) 2025-2026, Kirky.X
//!
//! MIT License
//!
//! 该模块定义了基于Sea-ORM的持久存储实现。
//!
//! 容量与预订按列存储；资料、价格计划、评论以JSON文档存放在 `document` 列中。

use super::{BookingStore, CatalogStore};
use crate::config::StoreConfig;
use crate::error::{ReservationError, Result};
use crate::model::{
    Booking, HotelCapacity, HotelProfile, RatePlan, RecommendationEntry, Review, UserCredential,
};
use async_trait::async_trait;
use chrono::NaiveDate;
use sea_orm::{
    ConnectOptions, ConnectionTrait, Database, DatabaseBackend, DatabaseConnection, QueryResult,
    Statement, TransactionTrait, Value,
};
use secrecy::ExposeSecret;
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::{debug, info, instrument};

const DATE_FORMAT: &str = "%Y-%m-%d";

const SCHEMA: &[&str] = &[
    "CREATE TABLE IF NOT EXISTS capacity (
        hotel_id VARCHAR(64) PRIMARY KEY,
        total_rooms BIGINT NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS booking (
        hotel_id VARCHAR(64) NOT NULL,
        customer_name VARCHAR(255) NOT NULL,
        in_date VARCHAR(10) NOT NULL,
        out_date VARCHAR(10) NOT NULL,
        room_count BIGINT NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS hotel_profile (
        hotel_id VARCHAR(64) PRIMARY KEY,
        document TEXT NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS rate_plan (
        hotel_id VARCHAR(64) NOT NULL,
        code VARCHAR(64) NOT NULL,
        document TEXT NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS review (
        review_id VARCHAR(64) PRIMARY KEY,
        hotel_id VARCHAR(64) NOT NULL,
        document TEXT NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS app_user (
        username VARCHAR(128) PRIMARY KEY,
        password_hash VARCHAR(64) NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS recommendation (
        hotel_id VARCHAR(64) PRIMARY KEY,
        lat DOUBLE PRECISION NOT NULL,
        lon DOUBLE PRECISION NOT NULL,
        rate DOUBLE PRECISION NOT NULL,
        price DOUBLE PRECISION NOT NULL
    )",
];

/// Sea-ORM持久存储
#[derive(Debug, Clone)]
pub struct SqlStore {
    connection: DatabaseConnection,
}

impl SqlStore {
    /// 按配置连接数据库
    #[instrument(skip(config), level = "info", name = "init_sql_store")]
    pub async fn connect(config: &StoreConfig) -> Result<Self> {
        let mut opt = ConnectOptions::new(config.url.expose_secret().to_string());
        opt.max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .sqlx_logging(config.sqlx_logging);

        let connection = Database::connect(opt).await.map_err(|e| {
            ReservationError::StoreError(format!("Failed to open database: {}", e))
        })?;
        Ok(Self::from_connection(connection))
    }

    /// 使用已有连接创建存储
    pub fn from_connection(connection: DatabaseConnection) -> Self {
        Self { connection }
    }

    /// 创建所需的表（已存在则跳过）
    #[instrument(skip(self), level = "info")]
    pub async fn ensure_schema(&self) -> Result<()> {
        let backend = self.backend();
        for ddl in SCHEMA {
            self.connection
                .execute(Statement::from_string(backend, ddl.to_string()))
                .await?;
        }
        // MySQL 不支持 CREATE INDEX IF NOT EXISTS
        if backend != DatabaseBackend::MySql {
            self.connection
                .execute(Statement::from_string(
                    backend,
                    "CREATE INDEX IF NOT EXISTS idx_booking_night ON booking (hotel_id, in_date, out_date)"
                        .to_string(),
                ))
                .await?;
        }
        info!("Store schema ready ({} tables)", SCHEMA.len());
        Ok(())
    }

    fn backend(&self) -> DatabaseBackend {
        self.connection.get_database_backend()
    }

    /// 生成第 `index` 个（从1开始）占位符
    fn placeholder(&self, index: usize) -> String {
        match self.backend() {
            DatabaseBackend::Postgres => format!("${}", index),
            _ => "?".to_string(),
        }
    }

    fn placeholders(&self, from: usize, count: usize) -> String {
        (from..from + count)
            .map(|i| self.placeholder(i))
            .collect::<Vec<_>>()
            .join(", ")
    }

    fn statement(&self, sql: String, values: Vec<Value>) -> Statement {
        Statement::from_sql_and_values(self.backend(), sql, values)
    }

    async fn query_all(&self, sql: String, values: Vec<Value>) -> Result<Vec<QueryResult>> {
        debug!("Executing store query: {}", sql);
        Ok(self.connection.query_all(self.statement(sql, values)).await?)
    }

    async fn execute(&self, sql: String, values: Vec<Value>) -> Result<()> {
        debug!("Executing store statement: {}", sql);
        self.connection.execute(self.statement(sql, values)).await?;
        Ok(())
    }

    /// 在同一事务中先删除再插入，用于按主键覆盖
    async fn replace(
        &self,
        delete_sql: String,
        delete_values: Vec<Value>,
        insert_sql: String,
        insert_values: Vec<Value>,
    ) -> Result<()> {
        let txn = self.connection.begin().await?;
        txn.execute(self.statement(delete_sql, delete_values))
            .await?;
        txn.execute(self.statement(insert_sql, insert_values))
            .await?;
        txn.commit().await?;
        Ok(())
    }
}

fn parse_date(text: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(text, DATE_FORMAT)
        .map_err(|e| ReservationError::StoreError(format!("Bad date '{}' in store: {}", text, e)))
}

fn to_count(value: i64, column: &str) -> Result<u32> {
    u32::try_from(value).map_err(|_| {
        ReservationError::StoreError(format!("Column {} out of range: {}", column, value))
    })
}

fn decode_document<T: DeserializeOwned>(row: &QueryResult) -> Result<T> {
    let document: String = row.try_get("", "document")?;
    serde_json::from_str(&document).map_err(|e| ReservationError::Serialization(e.to_string()))
}

fn encode_document<T: serde::Serialize>(value: &T) -> Result<String> {
    serde_json::to_string(value).map_err(|e| ReservationError::Serialization(e.to_string()))
}

fn capacity_from_row(row: &QueryResult) -> Result<HotelCapacity> {
    Ok(HotelCapacity {
        hotel_id: row.try_get("", "hotel_id")?,
        total_rooms: to_count(row.try_get("", "total_rooms")?, "total_rooms")?,
    })
}

#[async_trait]
impl BookingStore for SqlStore {
    #[instrument(skip(self), level = "debug")]
    async fn find_capacity(&self, hotel_id: &str) -> Result<Option<HotelCapacity>> {
        let sql = format!(
            "SELECT hotel_id, total_rooms FROM capacity WHERE hotel_id = {}",
            self.placeholder(1)
        );
        let rows = self.query_all(sql, vec![hotel_id.into()]).await?;
        rows.first().map(capacity_from_row).transpose()
    }

    #[instrument(skip(self, hotel_ids), level = "debug", fields(count = hotel_ids.len()))]
    async fn find_capacities(&self, hotel_ids: &[String]) -> Result<Vec<HotelCapacity>> {
        if hotel_ids.is_empty() {
            return Ok(Vec::new());
        }
        let sql = format!(
            "SELECT hotel_id, total_rooms FROM capacity WHERE hotel_id IN ({})",
            self.placeholders(1, hotel_ids.len())
        );
        let values = hotel_ids.iter().map(|id| id.as_str().into()).collect();
        self.query_all(sql, values)
            .await?
            .iter()
            .map(capacity_from_row)
            .collect()
    }

    #[instrument(skip(self), level = "debug")]
    async fn find_bookings(
        &self,
        hotel_id: &str,
        in_date: NaiveDate,
        out_date: NaiveDate,
    ) -> Result<Vec<Booking>> {
        let sql = format!(
            "SELECT hotel_id, customer_name, in_date, out_date, room_count FROM booking \
             WHERE hotel_id = {} AND in_date = {} AND out_date = {}",
            self.placeholder(1),
            self.placeholder(2),
            self.placeholder(3)
        );
        let values = vec![
            hotel_id.into(),
            in_date.format(DATE_FORMAT).to_string().into(),
            out_date.format(DATE_FORMAT).to_string().into(),
        ];
        let rows = self.query_all(sql, values).await?;
        let mut bookings = Vec::with_capacity(rows.len());
        for row in &rows {
            let in_date: String = row.try_get("", "in_date")?;
            let out_date: String = row.try_get("", "out_date")?;
            bookings.push(Booking {
                hotel_id: row.try_get("", "hotel_id")?,
                customer_name: row.try_get("", "customer_name")?,
                in_date: parse_date(&in_date)?,
                out_date: parse_date(&out_date)?,
                number: to_count(row.try_get("", "room_count")?, "room_count")?,
            });
        }
        Ok(bookings)
    }

    #[instrument(skip(self, booking), level = "debug", fields(hotel_id = %booking.hotel_id))]
    async fn insert_booking(&self, booking: &Booking) -> Result<()> {
        let sql = format!(
            "INSERT INTO booking (hotel_id, customer_name, in_date, out_date, room_count) VALUES ({})",
            self.placeholders(1, 5)
        );
        let values = vec![
            booking.hotel_id.as_str().into(),
            booking.customer_name.as_str().into(),
            booking.in_date.format(DATE_FORMAT).to_string().into(),
            booking.out_date.format(DATE_FORMAT).to_string().into(),
            i64::from(booking.number).into(),
        ];
        self.execute(sql, values).await
    }

    async fn put_capacity(&self, capacity: &HotelCapacity) -> Result<()> {
        self.replace(
            format!("DELETE FROM capacity WHERE hotel_id = {}", self.placeholder(1)),
            vec![capacity.hotel_id.as_str().into()],
            format!(
                "INSERT INTO capacity (hotel_id, total_rooms) VALUES ({})",
                self.placeholders(1, 2)
            ),
            vec![
                capacity.hotel_id.as_str().into(),
                i64::from(capacity.total_rooms).into(),
            ],
        )
        .await
    }
}

#[async_trait]
impl CatalogStore for SqlStore {
    #[instrument(skip(self), level = "debug")]
    async fn find_profile(&self, hotel_id: &str) -> Result<Option<HotelProfile>> {
        let sql = format!(
            "SELECT document FROM hotel_profile WHERE hotel_id = {}",
            self.placeholder(1)
        );
        let rows = self.query_all(sql, vec![hotel_id.into()]).await?;
        rows.first().map(decode_document).transpose()
    }

    #[instrument(skip(self), level = "debug")]
    async fn find_rate_plans(&self, hotel_id: &str) -> Result<Vec<RatePlan>> {
        let sql = format!(
            "SELECT document FROM rate_plan WHERE hotel_id = {}",
            self.placeholder(1)
        );
        self.query_all(sql, vec![hotel_id.into()])
            .await?
            .iter()
            .map(decode_document)
            .collect()
    }

    #[instrument(skip(self), level = "debug")]
    async fn find_reviews(&self, hotel_id: &str) -> Result<Vec<Review>> {
        let sql = format!(
            "SELECT document FROM review WHERE hotel_id = {} ORDER BY review_id",
            self.placeholder(1)
        );
        self.query_all(sql, vec![hotel_id.into()])
            .await?
            .iter()
            .map(decode_document)
            .collect()
    }

    async fn load_users(&self) -> Result<Vec<UserCredential>> {
        let rows = self
            .query_all(
                "SELECT username, password_hash FROM app_user".to_string(),
                Vec::new(),
            )
            .await?;
        let mut users = Vec::with_capacity(rows.len());
        for row in &rows {
            users.push(UserCredential {
                username: row.try_get("", "username")?,
                password_hash: row.try_get("", "password_hash")?,
            });
        }
        Ok(users)
    }

    async fn load_recommendations(&self) -> Result<Vec<RecommendationEntry>> {
        let rows = self
            .query_all(
                "SELECT hotel_id, lat, lon, rate, price FROM recommendation ORDER BY hotel_id"
                    .to_string(),
                Vec::new(),
            )
            .await?;
        let mut entries = Vec::with_capacity(rows.len());
        for row in &rows {
            entries.push(RecommendationEntry {
                hotel_id: row.try_get("", "hotel_id")?,
                lat: row.try_get("", "lat")?,
                lon: row.try_get("", "lon")?,
                rate: row.try_get("", "rate")?,
                price: row.try_get("", "price")?,
            });
        }
        Ok(entries)
    }

    async fn put_profile(&self, profile: &HotelProfile) -> Result<()> {
        self.replace(
            format!(
                "DELETE FROM hotel_profile WHERE hotel_id = {}",
                self.placeholder(1)
            ),
            vec![profile.id.as_str().into()],
            format!(
                "INSERT INTO hotel_profile (hotel_id, document) VALUES ({})",
                self.placeholders(1, 2)
            ),
            vec![profile.id.as_str().into(), encode_document(profile)?.into()],
        )
        .await
    }

    /// 按 `(hotel_id, code)` 覆盖
    async fn put_rate_plan(&self, plan: &RatePlan) -> Result<()> {
        self.replace(
            format!(
                "DELETE FROM rate_plan WHERE hotel_id = {} AND code = {}",
                self.placeholder(1),
                self.placeholder(2)
            ),
            vec![plan.hotel_id.as_str().into(), plan.code.as_str().into()],
            format!(
                "INSERT INTO rate_plan (hotel_id, code, document) VALUES ({})",
                self.placeholders(1, 3)
            ),
            vec![
                plan.hotel_id.as_str().into(),
                plan.code.as_str().into(),
                encode_document(plan)?.into(),
            ],
        )
        .await
    }

    async fn put_review(&self, review: &Review) -> Result<()> {
        self.replace(
            format!("DELETE FROM review WHERE review_id = {}", self.placeholder(1)),
            vec![review.review_id.as_str().into()],
            format!(
                "INSERT INTO review (review_id, hotel_id, document) VALUES ({})",
                self.placeholders(1, 3)
            ),
            vec![
                review.review_id.as_str().into(),
                review.hotel_id.as_str().into(),
                encode_document(review)?.into(),
            ],
        )
        .await
    }

    async fn put_user(&self, user: &UserCredential) -> Result<()> {
        self.replace(
            format!("DELETE FROM app_user WHERE username = {}", self.placeholder(1)),
            vec![user.username.as_str().into()],
            format!(
                "INSERT INTO app_user (username, password_hash) VALUES ({})",
                self.placeholders(1, 2)
            ),
            vec![
                user.username.as_str().into(),
                user.password_hash.as_str().into(),
            ],
        )
        .await
    }

    async fn put_recommendation(&self, entry: &RecommendationEntry) -> Result<()> {
        self.replace(
            format!(
                "DELETE FROM recommendation WHERE hotel_id = {}",
                self.placeholder(1)
            ),
            vec![entry.hotel_id.as_str().into()],
            format!(
                "INSERT INTO recommendation (hotel_id, lat, lon, rate, price) VALUES ({})",
                self.placeholders(1, 5)
            ),
            vec![
                entry.hotel_id.as_str().into(),
                entry.lat.into(),
                entry.lon.into(),
                entry.rate.into(),
                entry.price.into(),
            ],
        )
        .await
    }
}
