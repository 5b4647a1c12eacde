//! Copyright (c) 2025-2026, Kirky.X
//!
//! MIT License
//!
//! 面向RPC的服务层。
//!
//! 预订服务包装预订引擎；资料、价格、评论服务是读穿透组件的直接使用者；
//! 用户与推荐服务在启动时加载只读表。

pub mod profile;
pub mod rate;
pub mod recommendation;
pub mod reservation;
pub mod review;
pub mod user;

pub use profile::{ProfileRequest, ProfileResult, ProfileService};
pub use rate::{RateRequest, RateResult, RateService};
pub use recommendation::{RecommendRequest, RecommendResult, RecommendationService, Require};
pub use reservation::{ReservationRequest, ReservationResult, ReservationService};
pub use review::{ReviewRequest, ReviewResult, ReviewService};
pub use user::{LoginRequest, LoginResult, UserService};

/// 注册到服务发现时使用的服务名
pub const SRV_RESERVATION: &str = "srv-reservation";
pub const SRV_PROFILE: &str = "srv-profile";
pub const SRV_RATE: &str = "srv-rate";
pub const SRV_REVIEW: &str = "srv-review";
pub const SRV_USER: &str = "srv-user";
pub const SRV_RECOMMENDATION: &str = "srv-recommendation";

/// 所有服务名
pub const ALL_SERVICES: &[&str] = &[
    SRV_RESERVATION,
    SRV_PROFILE,
    SRV_RATE,
    SRV_REVIEW,
    SRV_USER,
    SRV_RECOMMENDATION,
];
