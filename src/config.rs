use dotenvy::dotenv;
use std::env;

#[derive(Clone)]
pub struct Config {
    pub server_addr: String,
    pub database_url: String,
    pub api_prefix: String,

    // Rate limiting
    pub rate_mutate_per_min: u32,
    pub rate_read_per_min: u32,

    /// How often the carry-forward task wakes up. The job itself is
    /// idempotent, so the cadence only bounds how stale the new year's
    /// rows can be.
    pub carry_forward_interval_hours: u64,
}

impl Config {
    pub fn from_env() -> Self {
        dotenv().ok();

        Self {
            server_addr: env::var("SERVER_ADDR").expect("SERVER_ADDR must be set"),
            database_url: env::var("DATABASE_URL").expect("DATABASE_URL must be set"),
            api_prefix: env::var("API_PREFIX").unwrap_or_else(|_| "/api".to_string()),

            rate_mutate_per_min: env::var("RATE_MUTATE_PER_MIN")
                .unwrap_or_else(|_| "60".to_string())
                .parse()
                .unwrap(),
            rate_read_per_min: env::var("RATE_READ_PER_MIN")
                .unwrap_or_else(|_| "600".to_string())
                .parse()
                .unwrap(),

            carry_forward_interval_hours: env::var("CARRY_FORWARD_INTERVAL_HOURS")
                .unwrap_or_else(|_| "24".to_string())
                .parse()
                .unwrap(),
        }
    }
}
