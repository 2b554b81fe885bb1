use std::sync::Arc;

use serde::Deserialize;

use super::ProviderTransport;
use crate::aqi::{interpolate, BreakpointTable};
use crate::data_source::{AirQualityRequest, CapabilitySet, DataSource, SourceFuture};
use crate::http_client::{HttpClient, HttpRequest};
use crate::{AirQuality, ProviderId};

const ENDPOINT: &str = "https://air-quality-api.open-meteo.com/v1/air-quality";
const CURRENT_FIELDS: &str = "pm10,pm2_5,carbon_monoxide,nitrogen_dioxide,sulphur_dioxide,ozone";

/// Open-Meteo air quality. Free and keyless, so it leads the default chain.
#[derive(Clone)]
pub struct OpenMeteoAdapter {
    transport: ProviderTransport,
    pm25_table: Arc<BreakpointTable>,
}

impl OpenMeteoAdapter {
    pub fn new(http_client: Arc<dyn HttpClient>) -> Self {
        Self {
            transport: ProviderTransport::new(ProviderId::OpenMeteo, http_client),
            pm25_table: Arc::new(BreakpointTable::pm25()),
        }
    }

    pub fn with_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.transport.set_timeout_ms(timeout_ms);
        self
    }

    pub fn with_breakpoints(mut self, pm25_table: Arc<BreakpointTable>) -> Self {
        self.pm25_table = pm25_table;
        self
    }

    async fn fetch(&self, req: AirQualityRequest) -> Result<AirQuality, crate::SourceError> {
        let request = HttpRequest::get(ENDPOINT)
            .with_query("latitude", req.lat)
            .with_query("longitude", req.lon)
            .with_query("current", CURRENT_FIELDS)
            .with_query("timezone", "auto");

        let response: OpenMeteoResponse = self.transport.get_json(request).await?;
        let current = response.current;

        Ok(AirQuality {
            aqi: current
                .pm2_5
                .map(|pm25| interpolate(pm25, &self.pm25_table)),
            co: current.carbon_monoxide.unwrap_or_default(),
            no2: current.nitrogen_dioxide.unwrap_or_default(),
            o3: current.ozone.unwrap_or_default(),
            so2: current.sulphur_dioxide.unwrap_or_default(),
            pm2_5: current.pm2_5.unwrap_or_default(),
            pm10: current.pm10.unwrap_or_default(),
            ..AirQuality::empty(ProviderId::OpenMeteo)
        })
    }
}

impl DataSource for OpenMeteoAdapter {
    fn id(&self) -> ProviderId {
        ProviderId::OpenMeteo
    }

    fn capabilities(&self) -> CapabilitySet {
        CapabilitySet::air_quality_only()
    }

    fn is_configured(&self) -> bool {
        true
    }

    fn air_quality<'a>(&'a self, req: AirQualityRequest) -> SourceFuture<'a, AirQuality> {
        Box::pin(self.fetch(req))
    }
}

#[derive(Debug, Deserialize)]
struct OpenMeteoResponse {
    current: OpenMeteoCurrent,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct OpenMeteoCurrent {
    pm10: Option<f64>,
    pm2_5: Option<f64>,
    carbon_monoxide: Option<f64>,
    nitrogen_dioxide: Option<f64>,
    sulphur_dioxide: Option<f64>,
    ozone: Option<f64>,
}
