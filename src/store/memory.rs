//! Copyright (c) 2025-2026, Kirky.X
//!
//! MIT License
//!
//! 基于DashMap的进程内持久存储，用于单进程部署和测试。

use super::{BookingStore, CatalogStore};
use crate::error::Result;
use crate::model::{
    Booking, HotelCapacity, HotelProfile, RatePlan, RecommendationEntry, Review, UserCredential,
};
use async_trait::async_trait;
use chrono::NaiveDate;
use dashmap::DashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

#[derive(Debug, Default)]
pub struct MemoryStore {
    capacities: DashMap<String, u32>,
    // hotel_id -> 预订记录（按插入顺序）
    bookings: DashMap<String, Vec<Booking>>,
    profiles: DashMap<String, HotelProfile>,
    rate_plans: DashMap<String, Vec<RatePlan>>,
    reviews: DashMap<String, Vec<Review>>,
    users: DashMap<String, UserCredential>,
    recommendations: DashMap<String, RecommendationEntry>,
    /// 读操作计数，测试用它判断是否回源
    reads: AtomicUsize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// 已执行的读操作次数
    pub fn read_count(&self) -> usize {
        self.reads.load(Ordering::Relaxed)
    }

    /// 某酒店的全部预订记录
    pub fn bookings_for(&self, hotel_id: &str) -> Vec<Booking> {
        self.bookings
            .get(hotel_id)
            .map(|b| b.value().clone())
            .unwrap_or_default()
    }

    /// 某酒店某晚已订的房间总数
    pub fn booked_rooms(&self, hotel_id: &str, night: NaiveDate) -> u32 {
        self.bookings
            .get(hotel_id)
            .map(|b| {
                b.iter()
                    .filter(|r| r.in_date == night)
                    .map(|r| r.number)
                    .sum()
            })
            .unwrap_or(0)
    }

    fn touch(&self) {
        self.reads.fetch_add(1, Ordering::Relaxed);
    }
}

#[async_trait]
impl BookingStore for MemoryStore {
    async fn find_capacity(&self, hotel_id: &str) -> Result<Option<HotelCapacity>> {
        self.touch();
        Ok(self.capacities.get(hotel_id).map(|c| HotelCapacity {
            hotel_id: hotel_id.to_string(),
            total_rooms: *c.value(),
        }))
    }

    async fn find_capacities(&self, hotel_ids: &[String]) -> Result<Vec<HotelCapacity>> {
        self.touch();
        Ok(hotel_ids
            .iter()
            .filter_map(|id| {
                self.capacities.get(id).map(|c| HotelCapacity {
                    hotel_id: id.clone(),
                    total_rooms: *c.value(),
                })
            })
            .collect())
    }

    async fn find_bookings(
        &self,
        hotel_id: &str,
        in_date: NaiveDate,
        out_date: NaiveDate,
    ) -> Result<Vec<Booking>> {
        self.touch();
        Ok(self
            .bookings
            .get(hotel_id)
            .map(|b| {
                b.iter()
                    .filter(|r| r.in_date == in_date && r.out_date == out_date)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn insert_booking(&self, booking: &Booking) -> Result<()> {
        self.bookings
            .entry(booking.hotel_id.clone())
            .or_default()
            .push(booking.clone());
        Ok(())
    }

    async fn put_capacity(&self, capacity: &HotelCapacity) -> Result<()> {
        self.capacities
            .insert(capacity.hotel_id.clone(), capacity.total_rooms);
        Ok(())
    }
}

#[async_trait]
impl CatalogStore for MemoryStore {
    async fn find_profile(&self, hotel_id: &str) -> Result<Option<HotelProfile>> {
        self.touch();
        Ok(self.profiles.get(hotel_id).map(|p| p.value().clone()))
    }

    async fn find_rate_plans(&self, hotel_id: &str) -> Result<Vec<RatePlan>> {
        self.touch();
        Ok(self
            .rate_plans
            .get(hotel_id)
            .map(|p| p.value().clone())
            .unwrap_or_default())
    }

    async fn find_reviews(&self, hotel_id: &str) -> Result<Vec<Review>> {
        self.touch();
        Ok(self
            .reviews
            .get(hotel_id)
            .map(|r| r.value().clone())
            .unwrap_or_default())
    }

    async fn load_users(&self) -> Result<Vec<UserCredential>> {
        self.touch();
        Ok(self.users.iter().map(|u| u.value().clone()).collect())
    }

    async fn load_recommendations(&self) -> Result<Vec<RecommendationEntry>> {
        self.touch();
        let mut entries: Vec<RecommendationEntry> = self
            .recommendations
            .iter()
            .map(|e| e.value().clone())
            .collect();
        entries.sort_by(|a, b| a.hotel_id.cmp(&b.hotel_id));
        Ok(entries)
    }

    async fn put_profile(&self, profile: &HotelProfile) -> Result<()> {
        self.profiles.insert(profile.id.clone(), profile.clone());
        Ok(())
    }

    async fn put_rate_plan(&self, plan: &RatePlan) -> Result<()> {
        let mut plans = self.rate_plans.entry(plan.hotel_id.clone()).or_default();
        match plans.iter_mut().find(|p| p.code == plan.code) {
            Some(existing) => *existing = plan.clone(),
            None => plans.push(plan.clone()),
        }
        Ok(())
    }

    async fn put_review(&self, review: &Review) -> Result<()> {
        let mut reviews = self.reviews.entry(review.hotel_id.clone()).or_default();
        match reviews.iter_mut().find(|r| r.review_id == review.review_id) {
            Some(existing) => *existing = review.clone(),
            None => reviews.push(review.clone()),
        }
        Ok(())
    }

    async fn put_user(&self, user: &UserCredential) -> Result<()> {
        self.users.insert(user.username.clone(), user.clone());
        Ok(())
    }

    async fn put_recommendation(&self, entry: &RecommendationEntry) -> Result<()> {
        self.recommendations
            .insert(entry.hotel_id.clone(), entry.clone());
        Ok(())
    }
}
