//! Runtime configuration loaded from environment variables.
//!
//! | Variable | Default |
//! |----------|---------|
//! | `STATISTY_OPENWEATHER_API_KEY` / `OPENWEATHER_API_KEY` | unset |
//! | `STATISTY_WAQI_API_KEY` / `WAQI_API_KEY` | unset |
//! | `STATISTY_CALORIE_NINJAS_API_KEY` / `CALORIE_NINJAS_API_KEY` | unset |
//! | `STATISTY_API_NINJAS_API_KEY` / `API_NINJAS_KEY` | unset |
//! | `STATISTY_AIR_QUALITY_ORDER` | `open_meteo,openweather,waqi` |
//! | `STATISTY_NUTRITION_ORDER` | `calorie_ninjas,api_ninjas` |
//! | `STATISTY_CACHE_TTL_SECS` | `3600` |
//! | `STATISTY_HTTP_TIMEOUT_MS` | `5000` |

use std::collections::HashMap;
use std::env;
use std::time::Duration;

use thiserror::Error;

use crate::http_client::DEFAULT_TIMEOUT_MS;
use crate::source::parse_provider_list;
use crate::{ProviderId, ValidationError};

pub const DEFAULT_CACHE_TTL_SECS: u64 = 3_600;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ConfigError {
    #[error("{var} must be a positive integer, got '{value}'")]
    InvalidNumber { var: &'static str, value: String },

    #[error("{var}: {source}")]
    InvalidOrder {
        var: &'static str,
        #[source]
        source: ValidationError,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct StatistyConfig {
    api_keys: HashMap<ProviderId, String>,
    pub air_quality_order: Vec<ProviderId>,
    pub nutrition_order: Vec<ProviderId>,
    pub cache_ttl: Duration,
    pub http_timeout_ms: u64,
}

impl Default for StatistyConfig {
    fn default() -> Self {
        Self {
            api_keys: HashMap::new(),
            air_quality_order: vec![
                ProviderId::OpenMeteo,
                ProviderId::OpenWeather,
                ProviderId::Waqi,
            ],
            nutrition_order: vec![ProviderId::CalorieNinjas, ProviderId::ApiNinjas],
            cache_ttl: Duration::from_secs(DEFAULT_CACHE_TTL_SECS),
            http_timeout_ms: DEFAULT_TIMEOUT_MS,
        }
    }
}

impl StatistyConfig {
    /// Loads `.env` when present, then reads the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Reads settings through `lookup` instead of the process environment.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let read = |name: &str| {
            lookup(name)
                .map(|value| value.trim().to_owned())
                .filter(|value| !value.is_empty())
        };

        let mut config = Self::default();
        for provider in ProviderId::ALL {
            let Some((prefixed, legacy)) = key_vars(provider) else {
                continue;
            };
            if let Some(key) = read(prefixed).or_else(|| read(legacy)) {
                config.api_keys.insert(provider, key);
            }
        }

        if let Some(raw) = read("STATISTY_AIR_QUALITY_ORDER") {
            config.air_quality_order = parse_order("STATISTY_AIR_QUALITY_ORDER", &raw)?;
        }
        if let Some(raw) = read("STATISTY_NUTRITION_ORDER") {
            config.nutrition_order = parse_order("STATISTY_NUTRITION_ORDER", &raw)?;
        }
        if let Some(raw) = read("STATISTY_CACHE_TTL_SECS") {
            config.cache_ttl = Duration::from_secs(parse_positive("STATISTY_CACHE_TTL_SECS", raw)?);
        }
        if let Some(raw) = read("STATISTY_HTTP_TIMEOUT_MS") {
            config.http_timeout_ms = parse_positive("STATISTY_HTTP_TIMEOUT_MS", raw)?;
        }

        Ok(config)
    }

    pub fn with_api_key(mut self, provider: ProviderId, key: impl Into<String>) -> Self {
        self.api_keys.insert(provider, key.into());
        self
    }

    pub fn with_cache_ttl(mut self, cache_ttl: Duration) -> Self {
        self.cache_ttl = cache_ttl;
        self
    }

    pub fn with_http_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.http_timeout_ms = timeout_ms;
        self
    }

    pub fn api_key(&self, provider: ProviderId) -> Option<&str> {
        self.api_keys.get(&provider).map(String::as_str)
    }

    /// Providers that can run with the current keys, in `ProviderId::ALL` order.
    pub fn configured_providers(&self) -> Vec<ProviderId> {
        ProviderId::ALL
            .into_iter()
            .filter(|provider| provider.is_keyless() || self.api_keys.contains_key(provider))
            .collect()
    }
}

fn key_vars(provider: ProviderId) -> Option<(&'static str, &'static str)> {
    match provider {
        ProviderId::OpenMeteo => None,
        ProviderId::OpenWeather => Some(("STATISTY_OPENWEATHER_API_KEY", "OPENWEATHER_API_KEY")),
        ProviderId::Waqi => Some(("STATISTY_WAQI_API_KEY", "WAQI_API_KEY")),
        ProviderId::CalorieNinjas => {
            Some(("STATISTY_CALORIE_NINJAS_API_KEY", "CALORIE_NINJAS_API_KEY"))
        }
        ProviderId::ApiNinjas => Some(("STATISTY_API_NINJAS_API_KEY", "API_NINJAS_KEY")),
    }
}

fn parse_order(var: &'static str, raw: &str) -> Result<Vec<ProviderId>, ConfigError> {
    parse_provider_list(raw).map_err(|source| ConfigError::InvalidOrder { var, source })
}

fn parse_positive(var: &'static str, raw: String) -> Result<u64, ConfigError> {
    match raw.parse::<u64>() {
        Ok(value) if value > 0 => Ok(value),
        _ => Err(ConfigError::InvalidNumber { var, value: raw }),
    }
}
