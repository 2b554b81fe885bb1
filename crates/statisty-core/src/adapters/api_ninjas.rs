use std::sync::Arc;

use serde::Deserialize;

use super::{lenient_f64, ProviderTransport};
use crate::data_source::{CapabilitySet, DataSource, NutritionRequest, SourceError, SourceFuture};
use crate::http_client::{HttpAuth, HttpClient, HttpRequest};
use crate::{NutritionBatch, NutritionItem, ProviderId};

const ENDPOINT: &str = "https://api.api-ninjas.com/v1/nutrition";

/// API Ninjas nutrition lookup. Replies with a bare array; on the free tier
/// some fields hold a "premium only" string instead of a number.
#[derive(Clone)]
pub struct ApiNinjasAdapter {
    transport: ProviderTransport,
    api_key: Option<String>,
}

impl ApiNinjasAdapter {
    pub fn new(http_client: Arc<dyn HttpClient>, api_key: Option<String>) -> Self {
        Self {
            transport: ProviderTransport::new(ProviderId::ApiNinjas, http_client),
            api_key: api_key.filter(|key| !key.trim().is_empty()),
        }
    }

    pub fn with_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.transport.set_timeout_ms(timeout_ms);
        self
    }

    async fn fetch(&self, req: NutritionRequest) -> Result<NutritionBatch, SourceError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| SourceError::configuration(ProviderId::ApiNinjas))?;

        let request = HttpRequest::get(ENDPOINT)
            .with_query("query", &req.query)
            .with_auth(&HttpAuth::Header {
                name: String::from("X-Api-Key"),
                value: api_key.to_owned(),
            });

        let items: Vec<ApiNinjasItem> = self.transport.get_json(request).await?;
        Ok(NutritionBatch {
            query: req.query,
            items: items.into_iter().map(NutritionItem::from).collect(),
            source: ProviderId::ApiNinjas,
        })
    }
}

impl DataSource for ApiNinjasAdapter {
    fn id(&self) -> ProviderId {
        ProviderId::ApiNinjas
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

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ApiNinjasItem {
    name: String,
    #[serde(deserialize_with = "lenient_f64")]
    calories: f64,
    #[serde(deserialize_with = "lenient_f64")]
    serving_size_g: f64,
    #[serde(deserialize_with = "lenient_f64")]
    fat_total_g: f64,
    #[serde(deserialize_with = "lenient_f64")]
    fat_saturated_g: f64,
    #[serde(deserialize_with = "lenient_f64")]
    protein_g: f64,
    #[serde(deserialize_with = "lenient_f64")]
    sodium_mg: f64,
    #[serde(deserialize_with = "lenient_f64")]
    potassium_mg: f64,
    #[serde(deserialize_with = "lenient_f64")]
    cholesterol_mg: f64,
    #[serde(deserialize_with = "lenient_f64")]
    carbohydrates_total_g: f64,
    #[serde(deserialize_with = "lenient_f64")]
    fiber_g: f64,
    #[serde(deserialize_with = "lenient_f64")]
    sugar_g: f64,
}

impl From<ApiNinjasItem> for NutritionItem {
    fn from(item: ApiNinjasItem) -> Self {
        Self {
            name: item.name,
            calories: item.calories,
            serving_size_g: item.serving_size_g,
            fat_total_g: item.fat_total_g,
            fat_saturated_g: item.fat_saturated_g,
            protein_g: item.protein_g,
            sodium_mg: item.sodium_mg,
            potassium_mg: item.potassium_mg,
            cholesterol_mg: item.cholesterol_mg,
            carbohydrates_total_g: item.carbohydrates_total_g,
            fiber_g: item.fiber_g,
            sugar_g: item.sugar_g,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::testing::ScriptedHttpClient;
    use crate::data_source::{ResponseFailure, SourceErrorKind};
    use crate::http_client::HttpResponse;

    fn query() -> NutritionRequest {
        NutritionRequest::new("brisket").expect("valid query")
    }

    #[tokio::test]
    async fn premium_only_fields_read_as_zero() {
        let client = Arc::new(ScriptedHttpClient::json(
            r#"[{"name": "brisket", "calories": "Only available for premium subscribers.",
                 "protein_g": "Only available for premium subscribers.",
                 "fat_total_g": 21.6, "sodium_mg": "55"}]"#,
        ));
        let batch = ApiNinjasAdapter::new(client, Some(String::from("k")))
            .nutrition(query())
            .await
            .expect("batch");

        let item = &batch.items[0];
        assert_eq!(item.calories, 0.0);
        assert_eq!(item.fat_total_g, 21.6);
        assert_eq!(item.sodium_mg, 55.0);
        assert_eq!(batch.source, ProviderId::ApiNinjas);
    }

    #[tokio::test]
    async fn not_found_is_distinct_from_malformed() {
        let client = Arc::new(ScriptedHttpClient::with(vec![
            Ok(HttpResponse::with_status(404, "")),
            Ok(HttpResponse::ok_json("<html>")),
        ]));
        let adapter = ApiNinjasAdapter::new(client, Some(String::from("k")));

        let first = adapter.nutrition(query()).await.expect_err("404");
        let second = adapter.nutrition(query()).await.expect_err("html");

        assert_eq!(first.kind(), SourceErrorKind::Response(ResponseFailure::NotFound));
        assert_eq!(
            second.kind(),
            SourceErrorKind::Response(ResponseFailure::Malformed)
        );
    }

    #[tokio::test]
    async fn unconfigured_adapter_reports_configuration_error() {
        let client = Arc::new(ScriptedHttpClient::default());
        let adapter = ApiNinjasAdapter::new(client, None);
        let error = adapter.nutrition(query()).await.expect_err("no key");
        assert!(!error.retryable());
    }
}
