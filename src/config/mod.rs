use anyhow::{Context, Result};
use serde::Deserialize;
use std::env;
use std::str::FromStr;

// Top-level configuration, grouped by concern
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub app: AppConfig,
    pub database: DatabaseConfig,
    pub redis: RedisConfig,
    pub auth: AuthConfig,
    pub features: FeatureFlags,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub environment: String,
    pub rust_log: String,
    /// `json` switches the log formatter to JSON lines.
    pub log_format: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub pool_size: u32,
    pub acquire_timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RedisConfig {
    /// Catalog caching is skipped entirely when unset.
    pub url: Option<String>,
    pub catalog_ttl_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    pub bcrypt_cost: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FeatureFlags {
    pub seed_database: bool,
    pub enable_catalog_cache: bool,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Ok(Config {
            app: AppConfig {
                host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
                port: parse_var("PORT", 8000)?,
                environment: env::var("ENVIRONMENT").unwrap_or_else(|_| "development".to_string()),
                rust_log: env::var("RUST_LOG")
                    .unwrap_or_else(|_| "movie_booking=debug,tower_http=debug".to_string()),
                log_format: env::var("LOG_FORMAT").unwrap_or_else(|_| "pretty".to_string()),
            },
            database: DatabaseConfig {
                url: env::var("DATABASE_URL").context("DATABASE_URL must be set")?,
                pool_size: parse_var("DB_POOL_SIZE", 20)?,
                acquire_timeout_secs: parse_var("DB_ACQUIRE_TIMEOUT_SECS", 5)?,
            },
            redis: RedisConfig {
                url: env::var("REDIS_URL").ok().filter(|url| !url.is_empty()),
                catalog_ttl_secs: parse_var("CATALOG_CACHE_TTL_SECS", 3600)?,
            },
            auth: AuthConfig {
                bcrypt_cost: parse_var("BCRYPT_COST", bcrypt::DEFAULT_COST)?,
            },
            features: FeatureFlags {
                seed_database: parse_var("SEED_DATABASE", false)?,
                enable_catalog_cache: parse_var("ENABLE_CATALOG_CACHE", true)?,
            },
        })
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.app.host, self.app.port)
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            app: AppConfig {
                host: "0.0.0.0".to_string(),
                port: 8000,
                environment: "development".to_string(),
                rust_log: "movie_booking=debug,tower_http=debug".to_string(),
                log_format: "pretty".to_string(),
            },
            database: DatabaseConfig {
                url: "postgres://localhost/movie_booking".to_string(),
                pool_size: 20,
                acquire_timeout_secs: 5,
            },
            redis: RedisConfig { url: None, catalog_ttl_secs: 3600 },
            auth: AuthConfig { bcrypt_cost: bcrypt::DEFAULT_COST },
            features: FeatureFlags { seed_database: false, enable_catalog_cache: true },
        }
    }
}

fn parse_var<T>(name: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|e| anyhow::anyhow!("{name} must be a valid value: {e}")),
        Err(_) => Ok(default),
    }
}
