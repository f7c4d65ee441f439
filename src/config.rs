use std::env;
use std::str::FromStr;
use std::time::Duration;

use anyhow::{Context, Result};
use dotenvy::dotenv;

use crate::utils::reference_day::ReferenceZone;

#[derive(Clone, Debug)]
pub struct Config {
    pub server_addr: String,
    /// `None` runs the service on the in-memory store.
    pub database_url: Option<String>,
    pub db_max_connections: u32,
    pub store_timeout: Duration,
    pub reference_zone: ReferenceZone,
    pub api_prefix: String,

    pub log_dir: String,
    pub log_level: tracing::Level,
}

fn var_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn parse_var<T>(key: &str, default: &str) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    let raw = var_or(key, default);
    raw.trim()
        .parse()
        .with_context(|| format!("{key} has an invalid value '{raw}'"))
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenv().ok();

        let server_addr = match env::var("SERVER_ADDR") {
            Ok(addr) => addr,
            Err(_) => format!("0.0.0.0:{}", parse_var::<u16>("PORT", "3000")?),
        };

        let database_url = env::var("DATABASE_URL")
            .ok()
            .filter(|url| !url.trim().is_empty());

        let reference_zone = ReferenceZone::parse(&var_or("REFERENCE_UTC_OFFSET", "+09:00"))
            .context("REFERENCE_UTC_OFFSET")?;

        let log_level = tracing::Level::from_str(&var_or("LOG_LEVEL", "debug"))
            .map_err(|e| anyhow::anyhow!("LOG_LEVEL: {e}"))?;

        Ok(Self {
            server_addr,
            database_url,
            db_max_connections: parse_var("DB_MAX_CONNECTIONS", "10")?,
            store_timeout: Duration::from_secs(parse_var("STORE_TIMEOUT_SECS", "5")?),
            reference_zone,
            api_prefix: normalize_prefix(&var_or("API_PREFIX", "")),
            log_dir: var_or("LOG_DIR", "logs"),
            log_level,
        })
    }
}

/// `""`, `"/"` and `"api/"` become `""`, `""` and `"/api"`.
fn normalize_prefix(raw: &str) -> String {
    let trimmed = raw.trim().trim_matches('/');
    if trimmed.is_empty() {
        String::new()
    } else {
        format!("/{trimmed}")
    }
}
