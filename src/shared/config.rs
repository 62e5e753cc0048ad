//! Pipeline configuration
//!
//! Everything the pipeline needs is carried by [`PipelineConfig`] and handed to
//! the components at construction time. `from_env` reads an optional `.env`
//! file and `ORGSYNC_*` variables on top of the defaults.

use crate::shared::errors::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::time::Duration;
use uuid::Uuid;

/// Connection settings for the organisation registry API
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiOptions {
    pub base_url: String,
    /// Per-request timeout applied by the HTTP client
    pub request_timeout_secs: u64,
    /// Client-side request budget against the registry
    pub requests_per_second: f64,
    pub burst_size: u32,
    pub user_agent: String,
}

impl Default for ApiOptions {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:5000/api".to_string(),
            request_timeout_secs: 30,
            requests_per_second: 10.0,
            burst_size: 5,
            user_agent: "orgsync/0.1".to_string(),
        }
    }
}

/// One retry tier: exponential backoff with jitter
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryTierConfig {
    /// Retries after the first attempt
    pub max_retries: u32,
    pub initial_delay_ms: u64,
    pub max_delay_ms: u64,
    pub backoff_multiplier: f64,
    /// Upper bound of the random extra delay, as a fraction of the backoff
    pub jitter_ratio: f64,
}

impl RetryTierConfig {
    pub fn general() -> Self {
        Self {
            max_retries: 3,
            initial_delay_ms: 500,
            max_delay_ms: 10_000,
            backoff_multiplier: 2.0,
            jitter_ratio: 0.1,
        }
    }

    pub fn rate_limited() -> Self {
        Self {
            max_retries: 5,
            initial_delay_ms: 2_000,
            max_delay_ms: 60_000,
            backoff_multiplier: 2.0,
            jitter_ratio: 0.2,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResilienceConfig {
    /// Tier A: transient failures
    pub general: RetryTierConfig,
    /// Tier B: explicit throttling
    pub rate_limit: RetryTierConfig,
    /// Deadline for one call including all of its retries
    pub overall_timeout_secs: u64,
}

impl Default for ResilienceConfig {
    fn default() -> Self {
        Self {
            general: RetryTierConfig::general(),
            rate_limit: RetryTierConfig::rate_limited(),
            overall_timeout_secs: 120,
        }
    }
}

impl ResilienceConfig {
    pub fn overall_timeout(&self) -> Duration {
        Duration::from_secs(self.overall_timeout_secs)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestionOptions {
    pub delimiter: u8,
    pub max_rows: usize,
}

impl Default for IngestionOptions {
    fn default() -> Self {
        Self {
            delimiter: b',',
            max_rows: 10_000,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    pub api: ApiOptions,
    pub resilience: ResilienceConfig,
    pub ingestion: IngestionOptions,
    pub max_concurrent_units: usize,
    /// Identity recorded as creator of organisations and links
    pub system_organisation_id: Uuid,
    pub system_user_id: Uuid,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            api: ApiOptions::default(),
            resilience: ResilienceConfig::default(),
            ingestion: IngestionOptions::default(),
            max_concurrent_units: 4,
            system_organisation_id: Uuid::nil(),
            system_user_id: Uuid::nil(),
        }
    }
}

impl PipelineConfig {
    /// Load configuration from the environment (and `.env` when present)
    pub fn from_env() -> AppResult<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> AppResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(url) = lookup("ORGSYNC_API_BASE_URL") {
            config.api.base_url = url.trim_end_matches('/').to_string();
        }
        read_into(&lookup, "ORGSYNC_API_TIMEOUT_SECS", &mut config.api.request_timeout_secs)?;
        read_into(&lookup, "ORGSYNC_API_REQUESTS_PER_SECOND", &mut config.api.requests_per_second)?;
        read_into(&lookup, "ORGSYNC_API_BURST_SIZE", &mut config.api.burst_size)?;

        read_tier(&lookup, "ORGSYNC_RETRY", &mut config.resilience.general)?;
        read_tier(&lookup, "ORGSYNC_RATE_LIMIT_RETRY", &mut config.resilience.rate_limit)?;
        read_into(
            &lookup,
            "ORGSYNC_OVERALL_TIMEOUT_SECS",
            &mut config.resilience.overall_timeout_secs,
        )?;

        if let Some(delimiter) = lookup("ORGSYNC_CSV_DELIMITER") {
            config.ingestion.delimiter = match delimiter.as_bytes() {
                [byte] => *byte,
                _ => {
                    return Err(AppError::Configuration(format!(
                        "ORGSYNC_CSV_DELIMITER must be a single byte, got '{}'",
                        delimiter
                    )))
                }
            };
        }
        read_into(&lookup, "ORGSYNC_CSV_MAX_ROWS", &mut config.ingestion.max_rows)?;
        read_into(&lookup, "ORGSYNC_MAX_CONCURRENT_UNITS", &mut config.max_concurrent_units)?;

        if let Some(id) = lookup("ORGSYNC_SYSTEM_ORGANISATION_ID") {
            config.system_organisation_id = Uuid::parse_str(id.trim())?;
        }
        if let Some(id) = lookup("ORGSYNC_SYSTEM_USER_ID") {
            config.system_user_id = Uuid::parse_str(id.trim())?;
        }

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> AppResult<()> {
        if self.max_concurrent_units == 0 {
            return Err(AppError::Configuration(
                "max_concurrent_units must be at least 1".to_string(),
            ));
        }
        if self.api.requests_per_second <= 0.0 {
            return Err(AppError::Configuration(
                "requests_per_second must be positive".to_string(),
            ));
        }
        for (name, tier) in [
            ("general", &self.resilience.general),
            ("rate_limit", &self.resilience.rate_limit),
        ] {
            if tier.backoff_multiplier < 1.0 {
                return Err(AppError::Configuration(format!(
                    "{} retry backoff_multiplier must be >= 1.0",
                    name
                )));
            }
            if !(0.0..=1.0).contains(&tier.jitter_ratio) {
                return Err(AppError::Configuration(format!(
                    "{} retry jitter_ratio must be within 0.0..=1.0",
                    name
                )));
            }
        }
        Ok(())
    }
}

fn read_into<F, T>(lookup: &F, key: &str, target: &mut T) -> AppResult<()>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::fmt::Display,
{
    if let Some(raw) = lookup(key) {
        *target = raw
            .trim()
            .parse::<T>()
            .map_err(|e| AppError::Configuration(format!("Invalid {}='{}': {}", key, raw, e)))?;
    }
    Ok(())
}

fn read_tier<F>(lookup: &F, prefix: &str, tier: &mut RetryTierConfig) -> AppResult<()>
where
    F: Fn(&str) -> Option<String>,
{
    read_into(lookup, &format!("{}_MAX_RETRIES", prefix), &mut tier.max_retries)?;
    read_into(lookup, &format!("{}_INITIAL_DELAY_MS", prefix), &mut tier.initial_delay_ms)?;
    read_into(lookup, &format!("{}_MAX_DELAY_MS", prefix), &mut tier.max_delay_ms)?;
    read_into(lookup, &format!("{}_BACKOFF_MULTIPLIER", prefix), &mut tier.backoff_multiplier)?;
    read_into(lookup, &format!("{}_JITTER_RATIO", prefix), &mut tier.jitter_ratio)?;
    Ok(())
}
