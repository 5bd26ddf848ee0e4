use std::env;
use std::str::FromStr;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::models::{TierLimits, TierTable};

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub redis_url: String,
    pub jwt_secret: String,
    pub store_timeout_ms: u64,
    pub tiers: TierTable,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            redis_url: "redis://localhost:6379".to_string(),
            jwt_secret: "your-secret-key".to_string(),
            store_timeout_ms: 250,
            tiers: TierTable::default(),
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        let defaults = Self::default();
        let config = Config {
            host: env::var("HOST").unwrap_or(defaults.host),
            port: env_parse("PORT", defaults.port)?,
            redis_url: env::var("REDIS_URL").unwrap_or(defaults.redis_url),
            jwt_secret: env::var("JWT_SECRET").unwrap_or(defaults.jwt_secret),
            store_timeout_ms: env_parse("STORE_TIMEOUT_MS", defaults.store_timeout_ms)?,
            tiers: TierTable {
                free: tier_limits_from_env("FREE", defaults.tiers.free)?,
                plus: tier_limits_from_env("PLUS", defaults.tiers.plus)?,
                pro: tier_limits_from_env("PRO", defaults.tiers.pro)?,
            },
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.store_timeout_ms == 0 {
            anyhow::bail!("STORE_TIMEOUT_MS must be greater than zero");
        }
        if self.jwt_secret.is_empty() {
            anyhow::bail!("JWT_SECRET must not be empty");
        }
        self.tiers.validate().map_err(anyhow::Error::msg)?;
        Ok(())
    }

    pub fn store_timeout(&self) -> Duration {
        Duration::from_millis(self.store_timeout_ms)
    }
}

fn tier_limits_from_env(prefix: &str, defaults: TierLimits) -> Result<TierLimits> {
    Ok(TierLimits {
        barista_daily: env_parse(&format!("{prefix}_BARISTA_DAILY"), defaults.barista_daily)?,
        image_daily: env_parse(&format!("{prefix}_IMAGE_DAILY"), defaults.image_daily)?,
    })
}

fn env_parse<T>(name: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(name) {
        Ok(value) => value
            .trim()
            .parse()
            .with_context(|| format!("{name} is invalid: {value}")),
        Err(_) => Ok(default),
    }
}
