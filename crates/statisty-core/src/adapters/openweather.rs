use std::sync::Arc;

use serde::Deserialize;

use super::ProviderTransport;
use crate::aqi::{interpolate, BreakpointTable};
use crate::data_source::{AirQualityRequest, CapabilitySet, DataSource, SourceError, SourceFuture};
use crate::http_client::{HttpAuth, HttpClient, HttpRequest};
use crate::rate_limiter::RateLimiter;
use crate::{AirQuality, ProviderId};

const ENDPOINT: &str = "https://api.openweathermap.org/data/2.5/air_pollution";

/// OpenWeatherMap air pollution API.
///
/// The provider's own 1..5 index is kept as `provider_index`; `aqi` is
/// recomputed on the US EPA scale from the reported PM2.5 so every source
/// reports the same scale.
#[derive(Clone)]
pub struct OpenWeatherAdapter {
    transport: ProviderTransport,
    api_key: Option<String>,
    pm25_table: Arc<BreakpointTable>,
}

impl OpenWeatherAdapter {
    pub fn new(http_client: Arc<dyn HttpClient>, api_key: Option<String>) -> Self {
        Self {
            transport: ProviderTransport::new(ProviderId::OpenWeather, http_client),
            api_key: api_key.filter(|key| !key.trim().is_empty()),
            pm25_table: Arc::new(BreakpointTable::pm25()),
        }
    }

    pub fn with_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.transport.set_timeout_ms(timeout_ms);
        self
    }

    /// Replaces the default 1000-per-day limiter. `None` disables limiting.
    pub fn with_limiter(mut self, limiter: Option<RateLimiter>) -> Self {
        self.transport.set_limiter(limiter);
        self
    }

    pub fn with_breakpoints(mut self, pm25_table: Arc<BreakpointTable>) -> Self {
        self.pm25_table = pm25_table;
        self
    }

    pub fn limiter(&self) -> Option<&RateLimiter> {
        self.transport.limiter()
    }

    async fn fetch(&self, req: AirQualityRequest) -> Result<AirQuality, SourceError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| SourceError::configuration(ProviderId::OpenWeather))?;

        let request = HttpRequest::get(ENDPOINT)
            .with_query("lat", req.lat)
            .with_query("lon", req.lon)
            .with_auth(&HttpAuth::Query {
                name: String::from("appid"),
                value: api_key.to_owned(),
            });

        let response: OpenWeatherResponse = self.transport.get_json(request).await?;
        let current = response.list.into_iter().next().ok_or_else(|| {
            SourceError::no_data("openweather returned no air quality data for this location")
        })?;
        let components = current.components;

        Ok(AirQuality {
            aqi: Some(interpolate(components.pm2_5, &self.pm25_table)),
            co: components.co,
            no: components.no,
            no2: components.no2,
            o3: components.o3,
            so2: components.so2,
            pm2_5: components.pm2_5,
            pm10: components.pm10,
            nh3: components.nh3,
            source: ProviderId::OpenWeather,
            provider_index: current.main.map(|main| main.aqi),
        })
    }
}

impl DataSource for OpenWeatherAdapter {
    fn id(&self) -> ProviderId {
        ProviderId::OpenWeather
    }

    fn capabilities(&self) -> CapabilitySet {
        CapabilitySet::air_quality_only()
    }

    fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    fn air_quality<'a>(&'a self, req: AirQualityRequest) -> SourceFuture<'a, AirQuality> {
        Box::pin(self.fetch(req))
    }
}

#[derive(Debug, Deserialize)]
struct OpenWeatherResponse {
    #[serde(default)]
    list: Vec<OpenWeatherEntry>,
}

#[derive(Debug, Deserialize)]
struct OpenWeatherEntry {
    main: Option<OpenWeatherMain>,
    #[serde(default)]
    components: OpenWeatherComponents,
}

#[derive(Debug, Deserialize)]
struct OpenWeatherMain {
    aqi: u8,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct OpenWeatherComponents {
    co: f64,
    no: f64,
    no2: f64,
    o3: f64,
    so2: f64,
    pm2_5: f64,
    pm10: f64,
    nh3: f64,
}
