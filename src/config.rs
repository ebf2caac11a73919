use std::env;

use crate::error::AppError;

#[derive(Debug, Clone)]
pub struct Config {
    pub backend_base_url: String,
    pub routing_base_url: String,
    pub routing_api_key: String,
    pub driver_id: i64,
    pub http_port: u16,
    pub log_level: String,
    pub report_interval_ms: u64,
    pub job_poll_interval_ms: u64,
    pub follower_speed_kmh: f64,
}

impl Config {
    pub fn from_env() -> Result<Self, AppError> {
        let _ = dotenvy::dotenv();

        Ok(Self {
            backend_base_url: env::var("BACKEND_BASE_URL")
                .unwrap_or_else(|_| "http://localhost:8080/".to_string()),
            routing_base_url: env::var("ROUTING_BASE_URL")
                .unwrap_or_else(|_| "https://graphhopper.com/api/1/".to_string()),
            routing_api_key: env::var("ROUTING_API_KEY").unwrap_or_default(),
            driver_id: parse_or_default("DRIVER_ID", 1)?,
            http_port: parse_or_default("HTTP_PORT", 3000)?,
            log_level: env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            report_interval_ms: parse_or_default("REPORT_INTERVAL_MS", 1000)?,
            job_poll_interval_ms: parse_or_default("JOB_POLL_INTERVAL_MS", 5000)?,
            follower_speed_kmh: parse_or_default("FOLLOWER_SPEED_KMH", 40.0)?,
        })
    }
}

fn parse_or_default<T>(key: &str, default: T) -> Result<T, AppError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(key) {
        Ok(raw) => raw
            .parse::<T>()
            .map_err(|err| AppError::Internal(format!("invalid {key}: {err}"))),
        Err(_) => Ok(default),
    }
}
