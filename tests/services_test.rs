//! Copyright (c) 2025-2026, Kirky.X
//!
//! MIT License
//!
//! 资料、价格、评论、用户与推荐服务集成测试

mod common;

use common::{hotels, setup_logging, wait_for_key, FailingCache, FlakyStore, ReadOnlyCache};
use hotel_reservation::backend::{FastCache, MemoryCache};
use hotel_reservation::error::ReservationError;
use hotel_reservation::model::{
    Address, HotelProfile, Image, RatePlan, RecommendationEntry, Review, RoomType,
    UserCredential,
};
use hotel_reservation::services::user::hash_password;
use hotel_reservation::services::{
    LoginRequest, ProfileRequest, ProfileService, RateRequest, RateService, RecommendRequest,
    RecommendationService, ReviewRequest, ReviewService, UserService,
};
use hotel_reservation::store::{CatalogStore, MemoryStore};
use std::sync::Arc;

fn profile(id: &str) -> HotelProfile {
    HotelProfile {
        id: id.to_string(),
        name: format!("Hotel {}", id),
        phone_number: "(415) 284-40".to_string(),
        description: "A 6-minute walk from Union Square".to_string(),
        address: Some(Address {
            street_number: "235".to_string(),
            street_name: "Mason St".to_string(),
            city: "San Francisco".to_string(),
            state: "CA".to_string(),
            country: "United States".to_string(),
            postal_code: "94102".to_string(),
            lat: 37.7867,
            lon: -122.4112,
        }),
        images: vec![Image {
            url: format!("https://example.com/{}.jpg", id),
            default: true,
        }],
    }
}

fn rate_plan(hotel_id: &str, code: &str, total_rate: f64) -> RatePlan {
    RatePlan {
        hotel_id: hotel_id.to_string(),
        code: code.to_string(),
        in_date: "2015-04-09".to_string(),
        out_date: "2015-04-10".to_string(),
        room_type: RoomType {
            bookable_rate: total_rate,
            total_rate,
            total_rate_inclusive: total_rate * 1.1,
            code: "KNG".to_string(),
            currency: "USD".to_string(),
            room_description: "King sized bed".to_string(),
        },
    }
}

fn review(hotel_id: &str, review_id: &str, rating: f32) -> Review {
    Review {
        review_id: review_id.to_string(),
        hotel_id: hotel_id.to_string(),
        name: "Person 1".to_string(),
        rating,
        description: "A nice stay".to_string(),
        images: None,
    }
}

#[tokio::test]
async fn test_profiles_follow_request_order_and_skip_missing() {
    setup_logging();
    let cache = Arc::new(MemoryCache::new(100));
    let store = Arc::new(MemoryStore::new());
    for id in ["1", "2", "3"] {
        store.put_profile(&profile(id)).await.unwrap();
    }
    let service = ProfileService::new(cache.clone(), store.clone());

    let request = ProfileRequest {
        hotel_ids: hotels(&["3", "404", "1"]),
        locale: "en".to_string(),
    };
    let result = service.get_profiles(&request).await.unwrap();
    let ids: Vec<&str> = result.hotels.iter().map(|h| h.id.as_str()).collect();
    assert_eq!(ids, vec!["3", "1"]);

    assert!(wait_for_key(&*cache, "profile:3").await.is_some());
    assert!(wait_for_key(&*cache, "profile:1").await.is_some());
    assert!(cache.get("profile:404").await.unwrap().is_none());

    // 热缓存时不再回源
    let reads = store.read_count();
    let again = service.get_profiles(&request).await.unwrap();
    assert_eq!(again, result);
    // 不存在的酒店每次都会回源
    assert_eq!(store.read_count(), reads + 1);
}

#[tokio::test]
async fn test_profile_store_errors_degrade_to_partial_results() {
    setup_logging();
    let store = Arc::new(FlakyStore::breaking(&["2"]));
    for id in ["1", "2"] {
        store.put_profile(&profile(id)).await.unwrap();
    }
    let service = ProfileService::new(Arc::new(MemoryCache::new(100)), store);

    let result = service
        .get_profiles(&ProfileRequest {
            hotel_ids: hotels(&["1", "2"]),
            locale: String::new(),
        })
        .await
        .unwrap();
    assert_eq!(result.hotels.len(), 1);
    assert_eq!(result.hotels[0].id, "1");
}

#[tokio::test]
async fn test_profile_cache_transport_error_is_fatal() {
    setup_logging();
    let store = Arc::new(MemoryStore::new());
    store.put_profile(&profile("1")).await.unwrap();
    let service = ProfileService::new(Arc::new(FailingCache), store);

    let result = service
        .get_profiles(&ProfileRequest {
            hotel_ids: hotels(&["1"]),
            locale: String::new(),
        })
        .await;
    assert!(matches!(result, Err(ReservationError::Cache(_))));
}

#[tokio::test]
async fn test_failed_write_back_does_not_fail_read() {
    setup_logging();
    let store = Arc::new(MemoryStore::new());
    store.put_profile(&profile("1")).await.unwrap();
    let service = ProfileService::new(Arc::new(ReadOnlyCache::default()), store);

    let result = service
        .get_profiles(&ProfileRequest {
            hotel_ids: hotels(&["1"]),
            locale: String::new(),
        })
        .await
        .unwrap();
    assert_eq!(result.hotels.len(), 1);
}

#[tokio::test]
async fn test_rates_sorted_descending_across_hotels() {
    setup_logging();
    let cache = Arc::new(MemoryCache::new(100));
    let store = Arc::new(MemoryStore::new());
    store.put_rate_plan(&rate_plan("1", "RACK", 109.0)).await.unwrap();
    store.put_rate_plan(&rate_plan("1", "PROMO", 250.0)).await.unwrap();
    store.put_rate_plan(&rate_plan("2", "RACK", 109.0)).await.unwrap();
    store.put_rate_plan(&rate_plan("3", "SUITE", 420.0)).await.unwrap();
    let service = RateService::new(cache.clone(), store);

    let request = RateRequest {
        hotel_ids: hotels(&["1", "2", "3", "9"]),
        in_date: "2015-04-09".to_string(),
        out_date: "2015-04-10".to_string(),
    };
    let result = service.get_rates(&request).await.unwrap();
    let order: Vec<(&str, &str)> = result
        .rate_plans
        .iter()
        .map(|p| (p.hotel_id.as_str(), p.code.as_str()))
        .collect();
    assert_eq!(
        order,
        vec![("3", "SUITE"), ("1", "PROMO"), ("1", "RACK"), ("2", "RACK")]
    );

    // 没有价格计划的酒店缓存为空列表
    assert_eq!(
        wait_for_key(&*cache, "rates:9").await,
        Some(b"[]".to_vec())
    );

    let warm = service.get_rates(&request).await.unwrap();
    assert_eq!(warm, result);
}

#[tokio::test]
async fn test_reviews_single_key_read_through() {
    setup_logging();
    let cache = Arc::new(MemoryCache::new(100));
    let store = Arc::new(MemoryStore::new());
    store.put_review(&review("1", "r1", 4.5)).await.unwrap();
    store.put_review(&review("1", "r2", 3.0)).await.unwrap();
    let service = ReviewService::new(cache.clone(), store.clone());

    let request = ReviewRequest {
        hotel_id: "1".to_string(),
    };
    let first = service.get_reviews(&request).await.unwrap();
    assert_eq!(first.reviews.len(), 2);
    assert!(wait_for_key(&*cache, "reviews:1").await.is_some());

    let reads = store.read_count();
    let second = service.get_reviews(&request).await.unwrap();
    assert_eq!(second, first);
    assert_eq!(store.read_count(), reads);

    let none = service
        .get_reviews(&ReviewRequest {
            hotel_id: "2".to_string(),
        })
        .await
        .unwrap();
    assert!(none.reviews.is_empty());
}

#[tokio::test]
async fn test_review_store_error_yields_empty_list() {
    setup_logging();
    let store = Arc::new(FlakyStore::breaking(&["1"]));
    store.put_review(&review("1", "r1", 5.0)).await.unwrap();
    let service = ReviewService::new(Arc::new(MemoryCache::new(100)), store);

    let result = service
        .get_reviews(&ReviewRequest {
            hotel_id: "1".to_string(),
        })
        .await
        .unwrap();
    assert!(result.reviews.is_empty());
}

#[tokio::test]
async fn test_user_login_against_preloaded_table() {
    setup_logging();
    let store = MemoryStore::new();
    for i in 0..3 {
        let username = format!("Cornell_{}", i);
        let password = i.to_string().repeat(10);
        store
            .put_user(&UserCredential {
                username,
                password_hash: hash_password(&password),
            })
            .await
            .unwrap();
    }
    let users = UserService::load(&store).await.unwrap();
    assert_eq!(users.len(), 3);

    let login = |username: &str, password: &str| {
        users
            .check_user(&LoginRequest {
                username: username.to_string(),
                password: password.to_string(),
            })
            .correct
    };
    assert!(login("Cornell_1", "1111111111"));
    assert!(!login("Cornell_1", "0000000000"));
    assert!(!login("Nobody", "1111111111"));
}

#[tokio::test]
async fn test_recommendations_by_distance_rate_and_price() {
    setup_logging();
    let store = MemoryStore::new();
    let entries = [
        ("1", 37.7867, -122.4112, 109.0, 150.0),
        ("2", 37.7854, -122.4005, 139.0, 120.0),
        ("3", 37.7834, -122.4071, 109.0, 120.0),
        ("4", 37.7936, -122.3930, 139.0, 180.0),
    ];
    for (id, lat, lon, rate, price) in entries {
        store
            .put_recommendation(&RecommendationEntry {
                hotel_id: id.to_string(),
                lat,
                lon,
                rate,
                price,
            })
            .await
            .unwrap();
    }
    let service = RecommendationService::load(&store).await.unwrap();

    let ask = |require: &str, lat: f64, lon: f64| {
        service
            .get_recommendations(&RecommendRequest {
                require: require.to_string(),
                lat,
                lon,
            })
            .hotel_ids
    };
    assert_eq!(ask("dis", 37.7867, -122.4112), vec!["1"]);
    assert_eq!(ask("dis", 37.7936, -122.3930), vec!["4"]);
    assert_eq!(ask("rate", 0.0, 0.0), vec!["2", "4"]);
    assert_eq!(ask("price", 0.0, 0.0), vec!["2", "3"]);
    assert!(ask("stars", 0.0, 0.0).is_empty());
}
