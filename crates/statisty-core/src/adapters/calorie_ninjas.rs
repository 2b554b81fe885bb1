use std::sync::Arc;

use serde::Deserialize;

use super::ProviderTransport;
use crate::data_source::{CapabilitySet, DataSource, NutritionRequest, SourceError, SourceFuture};
use crate::http_client::{HttpAuth, HttpClient, HttpRequest};
use crate::rate_limiter::RateLimiter;
use crate::{NutritionBatch, NutritionItem, ProviderId};

const ENDPOINT: &str = "https://api.calorieninjas.com/v1/nutrition";

/// CalorieNinjas natural-language nutrition lookup.
#[derive(Clone)]
pub struct CalorieNinjasAdapter {
    transport: ProviderTransport,
    api_key: Option<String>,
}

impl CalorieNinjasAdapter {
    pub fn new(http_client: Arc<dyn HttpClient>, api_key: Option<String>) -> Self {
        Self {
            transport: ProviderTransport::new(ProviderId::CalorieNinjas, http_client),
            api_key: api_key.filter(|key| !key.trim().is_empty()),
        }
    }

    pub fn with_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.transport.set_timeout_ms(timeout_ms);
        self
    }

    /// Replaces the default 100-per-hour limiter. `None` disables limiting.
    pub fn with_limiter(mut self, limiter: Option<RateLimiter>) -> Self {
        self.transport.set_limiter(limiter);
        self
    }

    pub fn limiter(&self) -> Option<&RateLimiter> {
        self.transport.limiter()
    }

    async fn fetch(&self, req: NutritionRequest) -> Result<NutritionBatch, SourceError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| SourceError::configuration(ProviderId::CalorieNinjas))?;

        let request = HttpRequest::get(ENDPOINT)
            .with_query("query", &req.query)
            .with_auth(&HttpAuth::Header {
                name: String::from("X-Api-Key"),
                value: api_key.to_owned(),
            });

        let response: CalorieNinjasResponse = self.transport.get_json(request).await?;
        Ok(NutritionBatch {
            query: req.query,
            items: response.items,
            source: ProviderId::CalorieNinjas,
        })
    }
}

impl DataSource for CalorieNinjasAdapter {
    fn id(&self) -> ProviderId {
        ProviderId::CalorieNinjas
    }

    fn capabilities(&self) -> CapabilitySet {
        CapabilitySet::nutrition_only()
    }

    fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    fn nutrition<'a>(&'a self, req: NutritionRequest) -> SourceFuture<'a, NutritionBatch> {
        Box::pin(self.fetch(req))
    }
}

#[derive(Debug, Deserialize)]
struct CalorieNinjasResponse {
    items: Vec<NutritionItem>,
}
