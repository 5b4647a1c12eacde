//! Copyright (c) 2025-2026, Kirky.X
//!
//! MIT License
//!
//! 该模块定义了运维命令行接口。

use crate::config::Config;
use crate::metrics::get_metrics_string;
use crate::telemetry::init_tracing;
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod query;
mod seed;

pub use seed::SeedData;

#[derive(Parser, Debug)]
#[command(name = "hotel-reservation")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[arg(short, long, global = true, help = "Path to the TOML configuration file")]
    pub config: Option<PathBuf>,

    #[arg(long, global = true, help = "Print request counters after the command")]
    pub metrics: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    #[command(name = "init-db", about = "Create tables and optionally load a JSON seed file")]
    InitDb(InitDbArgs),

    #[command(name = "seed-capacity", about = "Set the room capacity of a hotel")]
    SeedCapacity(SeedCapacityArgs),

    #[command(name = "check", about = "Check availability across hotels")]
    Check(CheckArgs),

    #[command(name = "reserve", about = "Reserve rooms at one hotel")]
    Reserve(ReserveArgs),

    #[command(name = "profiles", about = "Look up hotel profiles")]
    Profiles(ProfilesArgs),

    #[command(name = "rates", about = "Look up rate plans")]
    Rates(RatesArgs),

    #[command(name = "reviews", about = "Look up reviews of a hotel")]
    Reviews(ReviewsArgs),

    #[command(name = "recommend", about = "Recommend hotels by distance, rate or price")]
    Recommend(RecommendArgs),

    #[command(name = "login", about = "Check user credentials")]
    Login(LoginArgs),
}

#[derive(Parser, Debug)]
pub struct InitDbArgs {
    #[arg(short, long, help = "JSON seed file")]
    pub seed: Option<PathBuf>,
}

#[derive(Parser, Debug)]
pub struct SeedCapacityArgs {
    #[arg(long, help = "Hotel id")]
    pub hotel: String,

    #[arg(long, help = "Total rooms")]
    pub rooms: u32,
}

#[derive(Parser, Debug)]
pub struct CheckArgs {
    #[arg(long, value_delimiter = ',', required = true, help = "Comma separated hotel ids")]
    pub hotels: Vec<String>,

    #[arg(long = "in", help = "Check-in date (YYYY-MM-DD)")]
    pub in_date: String,

    #[arg(long = "out", help = "Check-out date (YYYY-MM-DD)")]
    pub out_date: String,

    #[arg(long, default_value_t = 1)]
    pub rooms: u32,
}

#[derive(Parser, Debug)]
pub struct ReserveArgs {
    #[arg(long)]
    pub hotel: String,

    #[arg(long)]
    pub customer: String,

    #[arg(long = "in", help = "Check-in date (YYYY-MM-DD)")]
    pub in_date: String,

    #[arg(long = "out", help = "Check-out date (YYYY-MM-DD)")]
    pub out_date: String,

    #[arg(long, default_value_t = 1)]
    pub rooms: u32,
}

#[derive(Parser, Debug)]
pub struct ProfilesArgs {
    #[arg(long, value_delimiter = ',', required = true)]
    pub hotels: Vec<String>,

    #[arg(long, default_value = "en")]
    pub locale: String,
}

#[derive(Parser, Debug)]
pub struct RatesArgs {
    #[arg(long, value_delimiter = ',', required = true)]
    pub hotels: Vec<String>,

    #[arg(long = "in")]
    pub in_date: String,

    #[arg(long = "out")]
    pub out_date: String,
}

#[derive(Parser, Debug)]
pub struct ReviewsArgs {
    #[arg(long)]
    pub hotel: String,
}

#[derive(Parser, Debug)]
pub struct RecommendArgs {
    #[arg(long, help = "dis, rate or price")]
    pub require: String,

    #[arg(long, default_value_t = 0.0, allow_hyphen_values = true)]
    pub lat: f64,

    #[arg(long, default_value_t = 0.0, allow_hyphen_values = true)]
    pub lon: f64,
}

#[derive(Parser, Debug)]
pub struct LoginArgs {
    #[arg(long)]
    pub username: String,

    #[arg(long)]
    pub password: String,
}

fn load_config(path: Option<&PathBuf>) -> Result<Config> {
    match path {
        Some(path) => Config::from_file(path)
            .with_context(|| format!("Failed to load config from {}", path.display())),
        None => Ok(Config::default()),
    }
}

pub async fn run() -> Result<()> {
    let cli = Cli::parse();
    let config = load_config(cli.config.as_ref())?;
    init_tracing("hotel-reservation", &config.global.log_level);

    match &cli.command {
        Commands::InitDb(args) => seed::init_db(&config, args).await?,
        Commands::SeedCapacity(args) => seed::seed_capacity(&config, args).await?,
        command => query::execute(config, command).await?,
    }

    if cli.metrics {
        print!("{}", get_metrics_string());
    }
    Ok(())
}
