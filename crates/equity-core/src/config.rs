//! Provider configuration loaded from the environment.
//!
//! [`Settings::from_env`] reads a `.env` file when present and then the
//! process environment. Every provider gets a [`ProviderConfig`]; providers
//! that need an API key are disabled when the key is absent or blank.
//!
//! Recognized variables, per provider prefix `P` in `YAHOO`,
//! `ALPHA_VANTAGE`, `NEWSAPI`, `EDGAR` and `HUGGINGFACE`:
//!
//! - `P_DAILY_CALL_CAP` - integer
//! - `P_MIN_CALL_INTERVAL_SECONDS` - float
//! - `P_REQUEST_TIMEOUT_SECONDS` - float
//!
//! plus `ALPHA_VANTAGE_API_KEY`, `NEWSAPI_KEY`, `HUGGINGFACE_API_KEY`,
//! `SEC_USER_AGENT` and `AGGREGATE_HARD_TIMEOUT_SECONDS`.

use std::fmt;
use std::time::Duration;

use thiserror::Error;
use tracing::debug;

use crate::provider::ids;
use crate::rate_limit::{RateLimiter, RatePolicy};

/// Default per-request timeout for HTTP providers.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Default overall limit for one aggregation fan-out.
pub const DEFAULT_HARD_TIMEOUT: Duration = Duration::from_secs(120);

/// User agent SEC EDGAR receives when none is configured.
pub const DEFAULT_SEC_USER_AGENT: &str = "equity-research-app contact@example.com";

/// Errors raised while reading configuration.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// A variable was set to a value that could not be parsed.
    #[error("invalid value {value:?} for {var}: {reason}")]
    Invalid {
        /// Variable name.
        var: String,
        /// Raw value.
        value: String,
        /// Why it was rejected.
        reason: String,
    },
}

/// Settings for a single provider.
#[derive(Clone, PartialEq)]
pub struct ProviderConfig {
    /// API key; `None` disables key-requiring providers.
    pub api_key: Option<String>,
    /// Maximum calls per UTC day.
    pub daily_call_cap: u32,
    /// Minimum spacing between calls.
    pub min_call_interval: Duration,
    /// Timeout for each HTTP request.
    pub request_timeout: Duration,
}

impl fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .field("daily_call_cap", &self.daily_call_cap)
            .field("min_call_interval", &self.min_call_interval)
            .field("request_timeout", &self.request_timeout)
            .finish()
    }
}

impl ProviderConfig {
    /// Creates a config with no key and the default request timeout.
    #[must_use]
    pub const fn new(daily_call_cap: u32, min_call_interval: Duration) -> Self {
        Self {
            api_key: None,
            daily_call_cap,
            min_call_interval,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }

    /// Sets the API key.
    #[must_use]
    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    /// Returns true if an API key is configured.
    #[must_use]
    pub const fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }

    /// Returns the rate policy for this provider.
    #[must_use]
    pub const fn rate_policy(&self) -> RatePolicy {
        RatePolicy::new(self.daily_call_cap, self.min_call_interval)
    }
}

/// Settings for every built-in provider.
#[derive(Clone, Debug, PartialEq)]
pub struct Settings {
    /// Yahoo Finance (no key required).
    pub yahoo: ProviderConfig,
    /// Alpha Vantage.
    pub alpha_vantage: ProviderConfig,
    /// NewsAPI.
    pub news_api: ProviderConfig,
    /// SEC EDGAR (no key required).
    pub edgar: ProviderConfig,
    /// Hugging Face inference API for the sentiment model.
    pub hugging_face: ProviderConfig,
    /// User agent sent to SEC EDGAR.
    pub sec_user_agent: String,
    /// Overall limit for one aggregation fan-out.
    pub hard_timeout: Duration,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            yahoo: ProviderConfig::new(2000, Duration::ZERO),
            alpha_vantage: ProviderConfig::new(25, Duration::from_secs(12)),
            news_api: ProviderConfig::new(1000, Duration::from_secs(1)),
            edgar: ProviderConfig::new(5000, Duration::from_millis(100)),
            hugging_face: ProviderConfig::new(1000, Duration::ZERO),
            sec_user_agent: DEFAULT_SEC_USER_AGENT.to_string(),
            hard_timeout: DEFAULT_HARD_TIMEOUT,
        }
    }
}

impl Settings {
    /// Loads settings from `.env` (if present) and the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        match dotenvy::dotenv() {
            Ok(path) => debug!(path = %path.display(), "Loaded .env file"),
            Err(e) => debug!(error = %e, "No .env file loaded"),
        }
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Builds settings from an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let lookup = |var: &str| {
            lookup(var)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let mut settings = Self::default();
        apply_overrides(&mut settings.yahoo, "YAHOO", &lookup)?;
        apply_overrides(&mut settings.alpha_vantage, "ALPHA_VANTAGE", &lookup)?;
        apply_overrides(&mut settings.news_api, "NEWSAPI", &lookup)?;
        apply_overrides(&mut settings.edgar, "EDGAR", &lookup)?;
        apply_overrides(&mut settings.hugging_face, "HUGGINGFACE", &lookup)?;

        settings.alpha_vantage.api_key = lookup("ALPHA_VANTAGE_API_KEY");
        settings.news_api.api_key = lookup("NEWSAPI_KEY");
        settings.hugging_face.api_key = lookup("HUGGINGFACE_API_KEY");

        if let Some(agent) = lookup("SEC_USER_AGENT") {
            settings.sec_user_agent = agent;
        }
        if let Some(secs) = parse_seconds(&lookup, "AGGREGATE_HARD_TIMEOUT_SECONDS")? {
            settings.hard_timeout = secs;
        }

        Ok(settings)
    }

    /// Builds a rate limiter with one budget per built-in provider endpoint.
    ///
    /// Providers with two endpoints that run in the same fan-out get one
    /// budget per endpoint, each with the provider's policy.
    #[must_use]
    pub fn rate_limiter(&self) -> RateLimiter {
        RateLimiter::builder()
            .budget(ids::YAHOO, self.yahoo.rate_policy())
            .budget(ids::YAHOO_FUNDAMENTALS, self.yahoo.rate_policy())
            .budget(ids::ALPHA_VANTAGE, self.alpha_vantage.rate_policy())
            .budget(ids::ALPHA_VANTAGE_OVERVIEW, self.alpha_vantage.rate_policy())
            .budget(ids::NEWSAPI, self.news_api.rate_policy())
            .budget(ids::EDGAR, self.edgar.rate_policy())
            .budget(ids::HUGGINGFACE, self.hugging_face.rate_policy())
            .build()
    }
}

fn apply_overrides<F>(config: &mut ProviderConfig, prefix: &str, lookup: &F) -> Result<(), ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let cap_var = format!("{prefix}_DAILY_CALL_CAP");
    if let Some(raw) = lookup(&cap_var) {
        config.daily_call_cap = raw.parse().map_err(|e: std::num::ParseIntError| {
            ConfigError::Invalid {
                var: cap_var,
                value: raw.clone(),
                reason: e.to_string(),
            }
        })?;
    }
    if let Some(interval) = parse_seconds(lookup, &format!("{prefix}_MIN_CALL_INTERVAL_SECONDS"))? {
        config.min_call_interval = interval;
    }
    if let Some(timeout) = parse_seconds(lookup, &format!("{prefix}_REQUEST_TIMEOUT_SECONDS"))? {
        config.request_timeout = timeout;
    }
    Ok(())
}

fn parse_seconds<F>(lookup: &F, var: &str) -> Result<Option<Duration>, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let Some(raw) = lookup(var) else {
        return Ok(None);
    };
    let invalid = |reason: String| ConfigError::Invalid {
        var: var.to_string(),
        value: raw.clone(),
        reason,
    };
    let secs: f64 = raw.parse().map_err(|e: std::num::ParseFloatError| invalid(e.to_string()))?;
    Duration::try_from_secs_f64(secs)
        .map(Some)
        .map_err(|e| invalid(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn settings_from(vars: &[(&str, &str)]) -> Result<Settings, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Settings::from_lookup(|var| vars.get(var).cloned())
    }

    #[test]
    fn test_defaults_without_environment() {
        let settings = settings_from(&[]).unwrap();
        assert_eq!(settings, Settings::default());
        assert!(!settings.alpha_vantage.has_api_key());
        assert!(!settings.news_api.has_api_key());
        assert_eq!(settings.alpha_vantage.daily_call_cap, 25);
        assert_eq!(settings.alpha_vantage.min_call_interval, Duration::from_secs(12));
        assert_eq!(settings.news_api.request_timeout, DEFAULT_REQUEST_TIMEOUT);
    }

    #[test]
    fn test_keys_and_overrides() {
        let settings = settings_from(&[
            ("NEWSAPI_KEY", "abc"),
            ("ALPHA_VANTAGE_API_KEY", "   "),
            ("NEWSAPI_DAILY_CALL_CAP", "50"),
            ("NEWSAPI_MIN_CALL_INTERVAL_SECONDS", "2.5"),
            ("EDGAR_REQUEST_TIMEOUT_SECONDS", "4"),
            ("SEC_USER_AGENT", "Research Bot admin@example.org"),
            ("AGGREGATE_HARD_TIMEOUT_SECONDS", "30"),
        ])
        .unwrap();

        assert_eq!(settings.news_api.api_key.as_deref(), Some("abc"));
        assert!(!settings.alpha_vantage.has_api_key());
        assert_eq!(settings.news_api.daily_call_cap, 50);
        assert_eq!(settings.news_api.min_call_interval, Duration::from_millis(2500));
        assert_eq!(settings.edgar.request_timeout, Duration::from_secs(4));
        assert_eq!(settings.sec_user_agent, "Research Bot admin@example.org");
        assert_eq!(settings.hard_timeout, Duration::from_secs(30));
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        let err = settings_from(&[("YAHOO_DAILY_CALL_CAP", "lots")]).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { ref var, .. } if var == "YAHOO_DAILY_CALL_CAP"));

        assert!(settings_from(&[("EDGAR_MIN_CALL_INTERVAL_SECONDS", "-1")]).is_err());
    }

    #[test]
    fn test_debug_redacts_api_key() {
        let config = ProviderConfig::new(1, Duration::ZERO).with_api_key("secret_key_12345");
        let debug_str = format!("{config:?}");
        assert!(!debug_str.contains("secret_key_12345"));
        assert!(debug_str.contains("[REDACTED]"));
    }

    #[test]
    fn test_rate_limiter_has_all_budgets() {
        let limiter = Settings::default().rate_limiter();
        for id in [
            ids::YAHOO,
            ids::YAHOO_FUNDAMENTALS,
            ids::ALPHA_VANTAGE,
            ids::ALPHA_VANTAGE_OVERVIEW,
            ids::NEWSAPI,
            ids::EDGAR,
            ids::HUGGINGFACE,
        ] {
            assert!(limiter.is_metered(id), "{id} should be metered");
        }
    }

    #[test]
    fn test_endpoint_budgets_are_independent() {
        let settings = settings_from(&[("YAHOO_MIN_CALL_INTERVAL_SECONDS", "1")]).unwrap();
        let limiter = settings.rate_limiter();

        limiter.try_acquire(ids::YAHOO).unwrap();
        assert!(limiter.try_acquire(ids::YAHOO).is_err());
        limiter.try_acquire(ids::YAHOO_FUNDAMENTALS).unwrap();

        limiter.try_acquire(ids::ALPHA_VANTAGE).unwrap();
        limiter.try_acquire(ids::ALPHA_VANTAGE_OVERVIEW).unwrap();
        assert!(limiter.try_acquire(ids::ALPHA_VANTAGE_OVERVIEW).is_err());
    }
}
