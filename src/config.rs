use std::env;
use std::fmt::Display;
use std::str::FromStr;

use log::{info, warn};

pub const DEFAULT_SHARD_COUNT: u32 = 10;

pub struct Config {
    pub bind_addr: String,
    pub database_url: String,
    // Shards per option; threaded through initialization, increment and
    // aggregation so the three never disagree
    pub shard_count: u32,
    pub generation_url: String,
    pub generation_token: String,
    pub tally_refresh_secs: u64,
}

impl Config {
    pub fn from_env() -> Self {
        let shard_count: u32 = parse_or("SHARD_COUNT", DEFAULT_SHARD_COUNT);
        let shard_count = if shard_count == 0 {
            warn!("SHARD_COUNT must be at least 1, using {DEFAULT_SHARD_COUNT}");
            DEFAULT_SHARD_COUNT
        } else {
            shard_count
        };

        let generation_token = env::var("GENERATION_API_TOKEN").unwrap_or_else(|_| {
            warn!("GENERATION_API_TOKEN not set, generation requests will be unauthenticated");
            String::new()
        });

        Self {
            bind_addr: env_or("BIND_ADDR", "0.0.0.0:8080"),
            database_url: env_or("DATABASE_URL", "sqlite:storyvote.db"),
            shard_count,
            generation_url: env_or(
                "GENERATION_API_URL",
                "https://api-inference.huggingface.co/models/google/gemma-2-2b-it",
            ),
            generation_token,
            tally_refresh_secs: parse_or("TALLY_REFRESH_SECONDS", 60),
        }
    }
}

fn env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| {
        info!("{key} not set, using default: {default}");
        default.to_string()
    })
}

fn parse_or<T: FromStr + Display + Copy>(key: &str, default: T) -> T
where
    T::Err: Display,
{
    match env::var(key) {
        Ok(value) => value.parse().unwrap_or_else(|e| {
            warn!("Invalid {key} value ({e}), using default: {default}");
            default
        }),
        Err(_) => {
            info!("{key} not set, using default: {default}");
            default
        }
    }
}
