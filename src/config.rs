use std::{path::PathBuf, time::Duration};

use anyhow::{Context, Result};

use crate::validate;

#[derive(Debug, Clone)]
pub struct AppConfig {
    /// JSON file holding the record list, e.g. "./shortened_urls.json"
    pub data_file: PathBuf,

    /// File holding the evaluation-service access token
    pub token_file: PathBuf,

    /// Public base URL used when generating short links, e.g. "https://go.example.com"
    /// Stored without a trailing slash.
    pub base_url: String,

    /// Root of the evaluation service (register, auth, logs)
    pub eval_service_url: String,

    /// How long a resolved link is shown before navigating
    pub redirect_delay: Duration,

    /// Validity applied when a create request doesn't give one
    pub default_validity_minutes: i64,
}

impl AppConfig {
    /// Load configuration from environment variables (populated by dotenvy before this is called).
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`AppConfig::from_env`] with an explicit variable source.
    pub fn from_lookup(var: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let redirect_delay_ms = var("REDIRECT_DELAY_MS")
            .unwrap_or_else(|| "2000".into())
            .parse::<u64>()
            .context("REDIRECT_DELAY_MS must be a whole number of milliseconds")?;

        let default_validity_minutes = var("DEFAULT_VALIDITY_MINUTES")
            .unwrap_or_else(|| "30".into())
            .parse::<i64>()
            .context("DEFAULT_VALIDITY_MINUTES must be an integer")?;

        if !validate::is_valid_validity(default_validity_minutes) {
            anyhow::bail!(
                "DEFAULT_VALIDITY_MINUTES must be between {} and {}",
                validate::MIN_VALIDITY_MINUTES,
                validate::MAX_VALIDITY_MINUTES
            );
        }

        let base_url = var("BASE_URL")
            .unwrap_or_else(|| "http://localhost:3000".into())
            .trim_end_matches('/')
            .to_owned();

        let eval_service_url = var("EVAL_SERVICE_URL")
            .unwrap_or_else(|| "http://20.244.56.144/evaluation-service".into())
            .trim_end_matches('/')
            .to_owned();

        Ok(Self {
            data_file: var("DATA_FILE")
                .unwrap_or_else(|| "./shortened_urls.json".into())
                .into(),
            token_file: var("TOKEN_FILE")
                .unwrap_or_else(|| "./.access_token".into())
                .into(),
            base_url,
            eval_service_url,
            redirect_delay: Duration::from_millis(redirect_delay_ms),
            default_validity_minutes,
        })
    }
}
