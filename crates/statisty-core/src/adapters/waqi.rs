use std::collections::HashMap;
use std::sync::Arc;

use serde::Deserialize;
use serde_json::Value;

use super::{lenient_f64, ProviderTransport};
use crate::data_source::{AirQualityRequest, CapabilitySet, DataSource, SourceError, SourceFuture};
use crate::http_client::{HttpAuth, HttpClient, HttpRequest};
use crate::{AirQuality, ProviderId};

const BASE_URL: &str = "https://api.waqi.info/feed";

/// World Air Quality Index station feed. Reports AQI on the US EPA scale
/// already, so no interpolation is applied.
#[derive(Clone)]
pub struct WaqiAdapter {
    transport: ProviderTransport,
    api_key: Option<String>,
}

impl WaqiAdapter {
    pub fn new(http_client: Arc<dyn HttpClient>, api_key: Option<String>) -> Self {
        Self {
            transport: ProviderTransport::new(ProviderId::Waqi, http_client),
            api_key: api_key.filter(|key| !key.trim().is_empty()),
        }
    }

    pub fn with_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.transport.set_timeout_ms(timeout_ms);
        self
    }

    async fn fetch(&self, req: AirQualityRequest) -> Result<AirQuality, SourceError> {
        let token = self
            .api_key
            .as_deref()
            .ok_or_else(|| SourceError::configuration(ProviderId::Waqi))?;

        let request = HttpRequest::get(format!("{BASE_URL}/geo:{};{}/", req.lat, req.lon))
            .with_auth(&HttpAuth::Query {
                name: String::from("token"),
                value: token.to_owned(),
            });

        let response: WaqiResponse = self.transport.get_json(request).await?;
        if response.status != "ok" {
            let reason = response.data.as_str().unwrap_or("unknown error").to_owned();
            if reason.to_ascii_lowercase().contains("unknown station") {
                return Err(SourceError::not_found(format!("waqi: {reason}")));
            }
            return Err(SourceError::rejected(format!(
                "waqi returned status '{}': {reason}",
                response.status
            )));
        }

        let data: WaqiData = serde_json::from_value(response.data).map_err(|error| {
            SourceError::malformed(format!("failed to parse waqi station data: {error}"))
        })?;
        let value = |key: &str| data.iaqi.get(key).map_or(0.0, |reading| reading.v);

        Ok(AirQuality {
            aqi: parse_aqi(&data.aqi),
            co: value("co"),
            no: value("no"),
            no2: value("no2"),
            o3: value("o3"),
            so2: value("so2"),
            pm2_5: value("pm25"),
            pm10: value("pm10"),
            nh3: value("nh3"),
            source: ProviderId::Waqi,
            provider_index: None,
        })
    }
}

/// Stations without a current reading report `"-"` instead of a number.
fn parse_aqi(raw: &Value) -> Option<u32> {
    let number = match raw {
        Value::Number(number) => number.as_f64(),
        Value::String(text) => text.trim().parse::<f64>().ok(),
        _ => None,
    }?;
    (number.is_finite() && number >= 0.0).then(|| number.round() as u32)
}

impl DataSource for WaqiAdapter {
    fn id(&self) -> ProviderId {
        ProviderId::Waqi
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
struct WaqiResponse {
    status: String,
    #[serde(default)]
    data: Value,
}

#[derive(Debug, Deserialize)]
struct WaqiData {
    #[serde(default)]
    aqi: Value,
    #[serde(default)]
    iaqi: HashMap<String, WaqiReading>,
}

#[derive(Debug, Deserialize)]
struct WaqiReading {
    #[serde(default, deserialize_with = "lenient_f64")]
    v: f64,
}
