use std::env;

use crate::auth::DEFAULT_IDENTITY_BASE_URL;
use crate::error::AppError;
use crate::routing::google::DEFAULT_BASE_URL;

#[derive(Debug, Clone)]
pub struct Config {
    pub http_port: u16,
    pub log_level: String,
    pub event_buffer_size: usize,
    pub maps_api_key: String,
    pub maps_base_url: String,
    pub identity_api_key: String,
    pub identity_base_url: String,
}

impl Config {
    pub fn from_env() -> Result<Self, AppError> {
        let _ = dotenvy::dotenv();

        Ok(Self {
            http_port: parse_or_default("HTTP_PORT", 3001)?,
            log_level: env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            event_buffer_size: parse_or_default("EVENT_BUFFER_SIZE", 1024)?,
            maps_api_key: required("GOOGLE_MAPS_API_KEY")?,
            maps_base_url: env::var("GOOGLE_MAPS_BASE_URL")
                .unwrap_or_else(|_| DEFAULT_BASE_URL.to_string()),
            identity_api_key: required("IDENTITY_API_KEY")?,
            identity_base_url: env::var("IDENTITY_BASE_URL")
                .unwrap_or_else(|_| DEFAULT_IDENTITY_BASE_URL.to_string()),
        })
    }
}

fn required(key: &str) -> Result<String, AppError> {
    env::var(key).map_err(|_| AppError::Internal(format!("{key} is not set")))
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
