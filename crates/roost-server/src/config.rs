use std::path::PathBuf;
use std::str::FromStr;

use anyhow::{Context, Result};
use chrono::Duration;
use roost_accounts::verification::DEFAULT_TOKEN_TTL_HOURS;

pub struct Config {
    pub jwt_secret: String,
    pub db_path: PathBuf,
    pub host: String,
    pub port: u16,
    pub verify_token_ttl: Duration,
    pub access_token_ttl: Duration,
    pub refresh_token_ttl: Duration,
}

impl Config {
    /// Read `ROOST_*` variables, falling back to development defaults.
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            jwt_secret: var_or("ROOST_JWT_SECRET", "dev-secret-change-me".to_string())?,
            db_path: var_or("ROOST_DB_PATH", PathBuf::from("roost.db"))?,
            host: var_or("ROOST_HOST", "0.0.0.0".to_string())?,
            port: var_or("ROOST_PORT", 3000)?,
            verify_token_ttl: Duration::hours(var_or(
                "ROOST_VERIFY_TOKEN_TTL_HOURS",
                DEFAULT_TOKEN_TTL_HOURS,
            )?),
            access_token_ttl: Duration::minutes(var_or("ROOST_ACCESS_TOKEN_TTL_MINUTES", 60)?),
            refresh_token_ttl: Duration::days(var_or("ROOST_REFRESH_TOKEN_TTL_DAYS", 30)?),
        })
    }
}

fn var_or<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(key) {
        Ok(raw) => raw.parse().with_context(|| format!("invalid {}: {:?}", key, raw)),
        Err(_) => Ok(default),
    }
}
