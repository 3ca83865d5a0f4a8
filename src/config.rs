use crate::errors::AppError;
use std::{env, str::FromStr, time::Duration};

const DEFAULT_API_URL: &str = "http://127.0.0.1:8000";

#[derive(Debug, Clone)]
pub struct Config {
    pub api_url: String,
    pub port: u16,
    pub cache_ttl: Duration,
    pub render_wait: Duration,
    pub request_timeout: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            port: 8080,
            cache_ttl: Duration::from_secs(10),
            render_wait: Duration::from_millis(1500),
            request_timeout: Duration::from_secs(10),
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, AppError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the config from any key lookup; unset keys keep their defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, AppError> {
        let defaults = Self::default();

        let api_url = lookup("API_URL")
            .map(|raw| raw.trim().trim_end_matches('/').to_string())
            .unwrap_or(defaults.api_url);
        if api_url.is_empty() {
            return Err(AppError::config("API_URL must not be empty"));
        }

        Ok(Self {
            api_url,
            port: parse_var(&lookup, "PORT")?.unwrap_or(defaults.port),
            cache_ttl: parse_var(&lookup, "CACHE_TTL_SECS")?
                .map(Duration::from_secs)
                .unwrap_or(defaults.cache_ttl),
            render_wait: parse_var(&lookup, "RENDER_WAIT_MS")?
                .map(Duration::from_millis)
                .unwrap_or(defaults.render_wait),
            request_timeout: parse_var(&lookup, "REQUEST_TIMEOUT_SECS")?
                .map(Duration::from_secs)
                .unwrap_or(defaults.request_timeout),
        })
    }
}

fn parse_var<T: FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
) -> Result<Option<T>, AppError> {
    let Some(raw) = lookup(key) else {
        return Ok(None);
    };
    raw.trim()
        .parse::<T>()
        .map(Some)
        .map_err(|_| AppError::config(format!("{key} has invalid value {raw:?}")))
}
