use std::net::IpAddr;

use chrono::Duration;

/// One year.
const MAX_TOKEN_TTL_MINUTES: i64 = 525_600;

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    pub host: IpAddr,
    pub port: u16,
    pub token_ttl: Duration,
    pub max_body_size: usize,
    pub log_level: String,
}

impl Config {
    pub fn from_env() -> Result<Self, String> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the config from an arbitrary variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, String> {
        let required = |key: &str| {
            lookup(key)
                .filter(|v| !v.is_empty())
                .ok_or_else(|| format!("Missing required environment variable: {key}"))
        };
        let or = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        let database_url = required("DATABASE_URL")?;
        let jwt_secret = required("JWT_SECRET")?;

        let host: IpAddr = or("STOREFRONT_HOST", "0.0.0.0")
            .parse()
            .map_err(|e| format!("Invalid STOREFRONT_HOST: {e}"))?;

        let port: u16 = or("STOREFRONT_PORT", "3000")
            .parse()
            .map_err(|e| format!("Invalid STOREFRONT_PORT: {e}"))?;

        let ttl_minutes: i64 = or("STOREFRONT_TOKEN_TTL_MINUTES", "60")
            .parse()
            .map_err(|e| format!("Invalid STOREFRONT_TOKEN_TTL_MINUTES: {e}"))?;
        if !(1..=MAX_TOKEN_TTL_MINUTES).contains(&ttl_minutes) {
            return Err(format!(
                "STOREFRONT_TOKEN_TTL_MINUTES must be between 1 and {MAX_TOKEN_TTL_MINUTES}"
            ));
        }

        let max_body_size: usize = or("STOREFRONT_MAX_BODY_SIZE", "1048576")
            .parse()
            .map_err(|e| format!("Invalid STOREFRONT_MAX_BODY_SIZE: {e}"))?;

        let log_level = or("STOREFRONT_LOG_LEVEL", "info");

        Ok(Config {
            database_url,
            jwt_secret,
            host,
            port,
            token_ttl: Duration::minutes(ttl_minutes),
            max_body_size,
            log_level,
        })
    }
}
