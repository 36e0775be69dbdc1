use std::time::Duration;

use anyhow::{Context, Result};

use crate::api_client::DEFAULT_API_URL;

/// Cadence and bound for job status polling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollingConfig {
    pub application_interval: Duration,
    pub score_interval: Duration,
    /// `None` polls until a terminal status or until the owning flow is dropped.
    pub max_attempts: Option<u32>,
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            application_interval: Duration::from_millis(4000),
            score_interval: Duration::from_millis(3000),
            max_attempts: None,
        }
    }
}

/// Export readiness probe cadence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExportProbeConfig {
    pub interval: Duration,
    pub max_attempts: u32,
}

impl Default for ExportProbeConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_millis(2000),
            max_attempts: 10,
        }
    }
}

/// Client configuration loaded from environment variables (and `.env` if present).
#[derive(Debug, Clone)]
pub struct Config {
    pub api_url: String,
    pub access_token: Option<String>,
    pub polling: PollingConfig,
    pub export_probe: ExportProbeConfig,
    pub request_timeout: Option<Duration>,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing
        Self::from_vars(|key| std::env::var(key).ok())
    }

    pub fn from_vars<F>(var: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = PollingConfig::default();
        let probe_defaults = ExportProbeConfig::default();

        Ok(Config {
            api_url: var("TAILOR_API_URL").unwrap_or_else(|| DEFAULT_API_URL.to_string()),
            access_token: var("TAILOR_ACCESS_TOKEN").filter(|t| !t.trim().is_empty()),
            polling: PollingConfig {
                application_interval: millis(&var, "TAILOR_APPLICATION_POLL_MS")?
                    .unwrap_or(defaults.application_interval),
                score_interval: millis(&var, "TAILOR_SCORE_POLL_MS")?
                    .unwrap_or(defaults.score_interval),
                max_attempts: parsed::<u32, _>(&var, "TAILOR_MAX_POLL_ATTEMPTS")?.filter(|n| *n > 0),
            },
            export_probe: ExportProbeConfig {
                interval: millis(&var, "TAILOR_EXPORT_PROBE_MS")?
                    .unwrap_or(probe_defaults.interval),
                max_attempts: parsed::<u32, _>(&var, "TAILOR_EXPORT_PROBE_ATTEMPTS")?
                    .filter(|n| *n > 0)
                    .unwrap_or(probe_defaults.max_attempts),
            },
            request_timeout: parsed::<u64, _>(&var, "TAILOR_REQUEST_TIMEOUT_SECS")?
                .map(Duration::from_secs),
            rust_log: var("RUST_LOG").unwrap_or_else(|| "info".to_string()),
        })
    }
}

fn parsed<T, F>(var: &F, key: &str) -> Result<Option<T>>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
    F: Fn(&str) -> Option<String>,
{
    var(key)
        .map(|raw| {
            raw.trim()
                .parse::<T>()
                .with_context(|| format!("{key} must be a valid number, got '{raw}'"))
        })
        .transpose()
}

fn millis<F>(var: &F, key: &str) -> Result<Option<Duration>>
where
    F: Fn(&str) -> Option<String>,
{
    Ok(parsed::<u64, _>(var, key)?
        .filter(|ms| *ms > 0)
        .map(Duration::from_millis))
}
