use std::str::FromStr;
use std::time::Duration;

use anyhow::{Context, Result};

/// Which key-value substrate holds the persisted profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    Postgres,
    Redis,
    Memory,
}

impl FromStr for StoreBackend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "postgres" | "postgresql" => Ok(StoreBackend::Postgres),
            "redis" => Ok(StoreBackend::Redis),
            "memory" => Ok(StoreBackend::Memory),
            other => anyhow::bail!(
                "STORE_BACKEND must be one of postgres, redis, memory (got '{other}')"
            ),
        }
    }
}

/// Application configuration loaded from environment variables.
/// Fails at startup if required variables are missing.
#[derive(Debug, Clone)]
pub struct Config {
    pub store_backend: StoreBackend,
    pub database_url: Option<String>,
    pub redis_url: Option<String>,
    pub store_namespace: String,
    pub anthropic_api_key: String,
    pub llm_max_retries: u32,
    pub job_search_timeout: Duration,
    pub port: u16,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        let store_backend: StoreBackend = optional_env("STORE_BACKEND")
            .unwrap_or_else(|| "postgres".to_string())
            .parse()?;

        let database_url = match store_backend {
            StoreBackend::Postgres => Some(require_env("DATABASE_URL")?),
            _ => optional_env("DATABASE_URL"),
        };
        let redis_url = match store_backend {
            StoreBackend::Redis => Some(require_env("REDIS_URL")?),
            _ => optional_env("REDIS_URL"),
        };

        Ok(Config {
            store_backend,
            database_url,
            redis_url,
            store_namespace: optional_env("STORE_NAMESPACE")
                .unwrap_or_else(|| "vantage".to_string()),
            anthropic_api_key: require_env("ANTHROPIC_API_KEY")?,
            llm_max_retries: parse_env("LLM_MAX_RETRIES", 0)?,
            job_search_timeout: Duration::from_secs(parse_env("JOB_SEARCH_TIMEOUT_SECS", 45)?),
            port: parse_env("PORT", 8080)?,
            rust_log: optional_env("RUST_LOG").unwrap_or_else(|| "info".to_string()),
        })
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

fn optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn parse_env<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match optional_env(key) {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .with_context(|| format!("{key} must be a valid number (got '{raw}')")),
        None => Ok(default),
    }
}
