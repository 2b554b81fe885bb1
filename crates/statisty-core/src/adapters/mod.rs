//! One adapter per external provider.
//!
//! | Adapter | Endpoint | Credential | Local quota |
//! |---------|----------|------------|-------------|
//! | [`OpenMeteoAdapter`] | air quality | none | none |
//! | [`OpenWeatherAdapter`] | air quality | `OPENWEATHER_API_KEY` | 1000 / day |
//! | [`WaqiAdapter`] | air quality | `WAQI_API_KEY` | none |
//! | [`CalorieNinjasAdapter`] | nutrition | `CALORIE_NINJAS_API_KEY` | 100 / hour |
//! | [`ApiNinjasAdapter`] | nutrition | `API_NINJAS_KEY` | none |

mod api_ninjas;
mod calorie_ninjas;
mod open_meteo;
mod openweather;
mod waqi;

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

use crate::data_source::SourceError;
use crate::http_client::{HttpClient, HttpRequest, DEFAULT_TIMEOUT_MS};
use crate::provider_policy::ProviderPolicy;
use crate::rate_limiter::RateLimiter;
use crate::ProviderId;

pub use api_ninjas::ApiNinjasAdapter;
pub use calorie_ninjas::CalorieNinjasAdapter;
pub use open_meteo::OpenMeteoAdapter;
pub use openweather::OpenWeatherAdapter;
pub use waqi::WaqiAdapter;

/// Transport plumbing shared by every adapter: the HTTP client, the
/// per-call timeout and the provider's own limiter, if it has a quota.
#[derive(Clone)]
pub(crate) struct ProviderTransport {
    provider: ProviderId,
    http_client: Arc<dyn HttpClient>,
    timeout_ms: u64,
    limiter: Option<RateLimiter>,
}

impl ProviderTransport {
    pub(crate) fn new(provider: ProviderId, http_client: Arc<dyn HttpClient>) -> Self {
        Self {
            provider,
            http_client,
            timeout_ms: DEFAULT_TIMEOUT_MS,
            limiter: ProviderPolicy::default_for(provider)
                .as_ref()
                .map(RateLimiter::from_policy),
        }
    }

    pub(crate) fn set_timeout_ms(&mut self, timeout_ms: u64) {
        self.timeout_ms = timeout_ms;
    }

    pub(crate) fn set_limiter(&mut self, limiter: Option<RateLimiter>) {
        self.limiter = limiter;
    }

    pub(crate) fn limiter(&self) -> Option<&RateLimiter> {
        self.limiter.as_ref()
    }

    /// Waits for a quota slot, performs the GET and decodes the JSON body.
    ///
    /// Connection failures become `Transport`, 404 becomes `NotFound`, other
    /// non-2xx statuses become `Status`, and undecodable bodies `Malformed`.
    pub(crate) async fn get_json<T: DeserializeOwned>(
        &self,
        request: HttpRequest,
    ) -> Result<T, SourceError> {
        if let Some(limiter) = &self.limiter {
            limiter.await_slot().await;
        }

        let provider = self.provider;
        let request = request.with_timeout_ms(self.timeout_ms);
        tracing::debug!(provider = %provider, url = %request.url, "calling provider");

        let response = self.http_client.execute(request).await.map_err(|error| {
            SourceError::transport(format!("{provider} transport error: {}", error.message()))
        })?;

        if response.status == 404 {
            return Err(SourceError::not_found(format!(
                "{provider} returned 404 not found"
            )));
        }
        if !response.is_success() {
            return Err(SourceError::bad_status(
                response.status,
                format!("{provider} returned status {}", response.status),
            ));
        }

        serde_json::from_str(&response.body).map_err(|error| {
            SourceError::malformed(format!("failed to parse {provider} response: {error}"))
        })
    }
}

/// Numbers pass through, numeric strings are parsed, anything else is 0.
pub(crate) fn lenient_f64<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::Number(number) => number.as_f64().unwrap_or_default(),
        Value::String(text) => text.trim().parse().unwrap_or_default(),
        _ => 0.0,
    })
}
