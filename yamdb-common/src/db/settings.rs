//! Runtime settings stored in the `settings` table
//!
//! Bootstrap values (paths, ports) live in the TOML config; everything the
//! service may tune while the database persists lives here. Missing or NULL
//! values are reset to their built-in defaults on startup.

use crate::{Error, Result};
use sqlx::SqlitePool;
use tracing::{info, warn};

pub const ACCESS_TOKEN_LIFETIME_SECS: &str = "access_token_lifetime_secs";
pub const DEFAULT_PAGE_LIMIT: &str = "default_page_limit";
pub const TOKEN_SIGNING_SECRET: &str = "token_signing_secret";

const DEFAULT_ACCESS_TOKEN_LIFETIME_SECS: i64 = 24 * 60 * 60;
const DEFAULT_DEFAULT_PAGE_LIMIT: i64 = 10;

/// Initialize or update default settings
pub async fn init_default_settings(pool: &SqlitePool) -> Result<()> {
    ensure_setting(
        pool,
        ACCESS_TOKEN_LIFETIME_SECS,
        &DEFAULT_ACCESS_TOKEN_LIFETIME_SECS.to_string(),
    )
    .await?;
    ensure_setting(pool, DEFAULT_PAGE_LIMIT, &DEFAULT_DEFAULT_PAGE_LIMIT.to_string()).await?;

    info!("Default settings initialized");
    Ok(())
}

/// Insert `default_value` if the key is missing or its value is NULL
pub async fn ensure_setting(pool: &SqlitePool, key: &str, default_value: &str) -> Result<()> {
    let value: Option<Option<String>> =
        sqlx::query_scalar("SELECT value FROM settings WHERE key = ?")
            .bind(key)
            .fetch_optional(pool)
            .await?;

    match value {
        Some(Some(_)) => Ok(()),
        Some(None) => {
            warn!("Setting '{}' is NULL, resetting to default: {}", key, default_value);
            set_setting(pool, key, default_value).await
        }
        None => {
            // INSERT OR IGNORE: two starting processes may both see the key missing
            sqlx::query("INSERT OR IGNORE INTO settings (key, value) VALUES (?, ?)")
                .bind(key)
                .bind(default_value)
                .execute(pool)
                .await?;
            info!("Initialized setting '{}' with default value: {}", key, default_value);
            Ok(())
        }
    }
}

pub async fn get_setting(pool: &SqlitePool, key: &str) -> Result<Option<String>> {
    let value: Option<Option<String>> =
        sqlx::query_scalar("SELECT value FROM settings WHERE key = ?")
            .bind(key)
            .fetch_optional(pool)
            .await?;

    Ok(value.flatten())
}

pub async fn set_setting(pool: &SqlitePool, key: &str, value: &str) -> Result<()> {
    sqlx::query(
        "INSERT OR REPLACE INTO settings (key, value, updated_at) VALUES (?, ?, CURRENT_TIMESTAMP)",
    )
    .bind(key)
    .bind(value)
    .execute(pool)
    .await?;

    Ok(())
}

/// Settings read once at startup and shared with request handlers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RuntimeSettings {
    pub access_token_lifetime_secs: i64,
    pub default_page_limit: i64,
}

impl Default for RuntimeSettings {
    fn default() -> Self {
        Self {
            access_token_lifetime_secs: DEFAULT_ACCESS_TOKEN_LIFETIME_SECS,
            default_page_limit: DEFAULT_DEFAULT_PAGE_LIMIT,
        }
    }
}

impl RuntimeSettings {
    pub async fn load(pool: &SqlitePool) -> Result<Self> {
        let defaults = Self::default();

        Ok(Self {
            access_token_lifetime_secs: get_positive_i64(
                pool,
                ACCESS_TOKEN_LIFETIME_SECS,
                defaults.access_token_lifetime_secs,
            )
            .await?,
            default_page_limit: get_positive_i64(pool, DEFAULT_PAGE_LIMIT, defaults.default_page_limit)
                .await?,
        })
    }
}

async fn get_positive_i64(pool: &SqlitePool, key: &str, default: i64) -> Result<i64> {
    let Some(raw) = get_setting(pool, key).await? else {
        return Ok(default);
    };

    match raw.trim().parse::<i64>() {
        Ok(value) if value > 0 => Ok(value),
        Ok(value) => Err(Error::Config(format!(
            "Setting '{}' must be positive, got {}",
            key, value
        ))),
        Err(e) => Err(Error::Config(format!("Setting '{}' is not an integer: {}", key, e))),
    }
}
