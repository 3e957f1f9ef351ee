use anyhow::{Context, Result};
use chrono::Duration;
use storage::{BookingPolicy, NoShowWindow};

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    /// Runs on the in-memory store when unset.
    pub database_url: Option<String>,
    pub api_keys: String,
    pub policy: BookingPolicy,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_source(|key| std::env::var(key).ok())
    }

    fn from_source(var: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let defaults = BookingPolicy::default();

        let noshow_limit = match var("NOSHOW_LIMIT") {
            Some(v) => v.parse().context("NOSHOW_LIMIT must be a number")?,
            None => defaults.noshow_limit,
        };
        let block_duration = match var("BLOCK_DURATION_DAYS") {
            Some(v) => Duration::days(v.parse().context("BLOCK_DURATION_DAYS must be a number")?),
            None => defaults.block_duration,
        };
        let noshow_window = match var("NOSHOW_WINDOW") {
            Some(v) => v.parse::<NoShowWindow>().map_err(anyhow::Error::msg)?,
            None => defaults.noshow_window,
        };
        let cancellation_notice = match var("CANCELLATION_NOTICE_MINUTES") {
            Some(v) => Duration::minutes(
                v.parse()
                    .context("CANCELLATION_NOTICE_MINUTES must be a number")?,
            ),
            None => defaults.cancellation_notice,
        };
        let archive_after = match var("ARCHIVE_AFTER_DAYS") {
            Some(v) => Duration::days(v.parse().context("ARCHIVE_AFTER_DAYS must be a number")?),
            None => defaults.archive_after,
        };
        let lock_timeout = match var("LOCK_TIMEOUT_MS") {
            Some(v) => std::time::Duration::from_millis(
                v.parse().context("LOCK_TIMEOUT_MS must be a number")?,
            ),
            None => defaults.lock_timeout,
        };

        if noshow_limit == 0 {
            anyhow::bail!("NOSHOW_LIMIT must be at least 1");
        }

        Ok(Self {
            host: var("HOST").context("Cannot load HOST env variable")?,
            port: var("PORT")
                .context("Cannot load PORT env variable")?
                .parse()
                .context("PORT must be a number")?,
            database_url: var("DATABASE_URL").filter(|url| !url.trim().is_empty()),
            api_keys: var("API_KEYS").unwrap_or_default(),
            policy: BookingPolicy {
                noshow_limit,
                block_duration,
                noshow_window,
                cancellation_notice,
                lock_timeout,
                archive_after,
            },
        })
    }
}
