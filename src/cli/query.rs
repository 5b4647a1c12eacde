//! Copyright (c) 2025-2026, Kirky.X
//!
//! MIT License
//!
//! 调用各服务的查询与预订命令。

use super::Commands;
use crate::config::Config;
use crate::manager::ServiceManager;
use crate::registry::MemoryRegistry;
use crate::services::{
    LoginRequest, ProfileRequest, RateRequest, RecommendRequest, ReservationRequest,
    ReviewRequest,
};
use anyhow::{bail, Result};
use serde::Serialize;
use std::sync::Arc;

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

pub async fn execute(config: Config, command: &Commands) -> Result<()> {
    let mut manager = ServiceManager::init(config, Arc::new(MemoryRegistry::new())).await?;
    manager.register_services().await?;

    let outcome = dispatch(&manager, command).await;
    manager.shutdown().await?;
    outcome
}

async fn dispatch(manager: &ServiceManager, command: &Commands) -> Result<()> {
    match command {
        Commands::Check(args) => {
            let request = ReservationRequest {
                customer_name: String::new(),
                hotel_id: args.hotels.clone(),
                in_date: args.in_date.clone(),
                out_date: args.out_date.clone(),
                room_number: args.rooms,
            };
            print_json(&manager.reservation().check_availability(&request).await?)
        }
        Commands::Reserve(args) => {
            let request = ReservationRequest {
                customer_name: args.customer.clone(),
                hotel_id: vec![args.hotel.clone()],
                in_date: args.in_date.clone(),
                out_date: args.out_date.clone(),
                room_number: args.rooms,
            };
            print_json(&manager.reservation().make_reservation(&request).await?)
        }
        Commands::Profiles(args) => {
            let request = ProfileRequest {
                hotel_ids: args.hotels.clone(),
                locale: args.locale.clone(),
            };
            print_json(&manager.profile().get_profiles(&request).await?)
        }
        Commands::Rates(args) => {
            let request = RateRequest {
                hotel_ids: args.hotels.clone(),
                in_date: args.in_date.clone(),
                out_date: args.out_date.clone(),
            };
            print_json(&manager.rate().get_rates(&request).await?)
        }
        Commands::Reviews(args) => {
            let request = ReviewRequest {
                hotel_id: args.hotel.clone(),
            };
            print_json(&manager.review().get_reviews(&request).await?)
        }
        Commands::Recommend(args) => {
            let request = RecommendRequest {
                require: args.require.clone(),
                lat: args.lat,
                lon: args.lon,
            };
            print_json(&manager.recommendation().get_recommendations(&request))
        }
        Commands::Login(args) => {
            let request = LoginRequest {
                username: args.username.clone(),
                password: args.password.clone(),
            };
            print_json(&manager.user().check_user(&request))
        }
        Commands::InitDb(_) | Commands::SeedCapacity(_) => {
            bail!("{:?} does not run against the services", command)
        }
    }
}
