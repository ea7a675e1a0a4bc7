// src/utils/config.rs
use std::path::PathBuf;

use crate::utils::error::AppError;

pub const DEFAULT_BASE_URL: &str = "https://dailymed.nlm.nih.gov/dailymed/services/v2";
pub const DEFAULT_USER_AGENT: &str = concat!("ndc_halal/", env!("CARGO_PKG_VERSION"));
// DailyMed publishes no hard limit; stay well under a few requests per second.
pub const DEFAULT_REQUEST_DELAY_MS: u64 = 150;
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Runtime settings resolved from CLI arguments and environment overrides.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub data_dir: PathBuf,
    pub base_url: String,
    pub user_agent: String,
    pub request_delay_ms: u64,
    pub timeout_secs: u64,
}

impl AppConfig {
    /// Builds the configuration, letting `DAILYMED_BASE_URL` and
    /// `DAILYMED_REQUEST_DELAY_MS` override the built-in defaults.
    pub fn from_env(data_dir: impl Into<PathBuf>) -> Result<Self, AppError> {
        Self::from_lookup(data_dir, |key| std::env::var(key).ok())
    }

    /// Same as [`from_env`](Self::from_env) with variables read through `lookup`.
    pub fn from_lookup<F>(data_dir: impl Into<PathBuf>, lookup: F) -> Result<Self, AppError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let base_url = lookup("DAILYMED_BASE_URL").unwrap_or_else(|| DEFAULT_BASE_URL.to_string());

        let request_delay_ms = match lookup("DAILYMED_REQUEST_DELAY_MS") {
            Some(raw) => raw.trim().parse::<u64>().map_err(|_| {
                AppError::Config(format!("DAILYMED_REQUEST_DELAY_MS must be an integer, got '{}'", raw))
            })?,
            None => DEFAULT_REQUEST_DELAY_MS,
        };

        let config = Self {
            data_dir: data_dir.into(),
            base_url: base_url.trim_end_matches('/').to_string(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            request_delay_ms,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        };
        tracing::debug!("Resolved configuration: {:?}", config);
        Ok(config)
    }

    /// Configuration pointing the client at an arbitrary base URL with no delay.
    pub fn with_base_url(data_dir: impl Into<PathBuf>, base_url: &str) -> Self {
        Self {
            data_dir: data_dir.into(),
            base_url: base_url.trim_end_matches('/').to_string(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            request_delay_ms: 0,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_with_base_url_strips_trailing_slash() {
        let config = AppConfig::with_base_url("./data", "http://localhost:8080/v2/");
        assert_eq!(config.base_url, "http://localhost:8080/v2");
        assert_eq!(config.request_delay_ms, 0);
    }

    fn vars(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: std::collections::HashMap<String, String> =
            pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_apply_without_overrides() {
        let config = AppConfig::from_lookup("./data", vars(&[])).unwrap();
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.request_delay_ms, DEFAULT_REQUEST_DELAY_MS);
    }

    #[test]
    fn test_overrides_are_applied_and_base_url_trimmed() {
        let config = AppConfig::from_lookup(
            "./data",
            vars(&[
                ("DAILYMED_BASE_URL", "http://mirror.local/v2/"),
                ("DAILYMED_REQUEST_DELAY_MS", " 500 "),
            ]),
        )
        .unwrap();
        assert_eq!(config.base_url, "http://mirror.local/v2");
        assert_eq!(config.request_delay_ms, 500);
        assert_eq!(config.data_dir, PathBuf::from("./data"));
    }

    #[test]
    fn test_invalid_delay_is_a_config_error() {
        let err = AppConfig::from_lookup("./data", vars(&[("DAILYMED_REQUEST_DELAY_MS", "fast")])).unwrap_err();
        match err {
            AppError::Config(msg) => assert!(msg.contains("'fast'")),
            other => panic!("expected config error, got {:?}", other),
        }
    }
}
