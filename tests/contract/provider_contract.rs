//! Contract every provider adapter must honor, checked against scripted
//! HTTP replies.

#[path = "../support/mod.rs"]
mod support;

use std::sync::Arc;

use statisty_core::{
    AirQualityRequest, ApiNinjasAdapter, CalorieNinjasAdapter, DataSource, Endpoint, HttpClient,
    HttpError, HttpResponse, NutritionRequest, OpenMeteoAdapter, OpenWeatherAdapter, ProviderId,
    ResponseFailure, SourceErrorKind, WaqiAdapter,
};
use support::ScriptedHttpClient;

struct ProviderCase {
    id: ProviderId,
    endpoint: Endpoint,
    build: fn(Arc<dyn HttpClient>, Option<String>) -> Arc<dyn DataSource>,
    success_body: &'static str,
}

fn provider_cases() -> Vec<ProviderCase> {
    vec![
        ProviderCase {
            id: ProviderId::OpenMeteo,
            endpoint: Endpoint::AirQuality,
            build: |http, _| Arc::new(OpenMeteoAdapter::new(http)),
            success_body: r#"{"current": {"pm2_5": 12.0, "pm10": 20.0}}"#,
        },
        ProviderCase {
            id: ProviderId::OpenWeather,
            endpoint: Endpoint::AirQuality,
            build: |http, key| Arc::new(OpenWeatherAdapter::new(http, key)),
            success_body: r#"{"list": [{"main": {"aqi": 1}, "components": {"pm2_5": 12.0}}]}"#,
        },
        ProviderCase {
            id: ProviderId::Waqi,
            endpoint: Endpoint::AirQuality,
            build: |http, key| Arc::new(WaqiAdapter::new(http, key)),
            success_body: r#"{"status": "ok", "data": {"aqi": 50, "iaqi": {"pm25": {"v": 12.0}}}}"#,
        },
        ProviderCase {
            id: ProviderId::CalorieNinjas,
            endpoint: Endpoint::Nutrition,
            build: |http, key| Arc::new(CalorieNinjasAdapter::new(http, key)),
            success_body: r#"{"items": [{"name": "apple", "calories": 52.0}]}"#,
        },
        ProviderCase {
            id: ProviderId::ApiNinjas,
            endpoint: Endpoint::Nutrition,
            build: |http, key| Arc::new(ApiNinjasAdapter::new(http, key)),
            success_body: r#"[{"name": "apple", "calories": 52.0}]"#,
        },
    ]
}

fn air_request() -> AirQualityRequest {
    AirQualityRequest::new(45.0, 7.0).expect("valid coordinates")
}

fn food_request() -> NutritionRequest {
    NutritionRequest::new("apple").expect("valid query")
}

/// Calls the endpoint the case serves and reduces the result to its error kind.
async fn call(case: &ProviderCase, source: &dyn DataSource) -> Result<(), SourceErrorKind> {
    match case.endpoint {
        Endpoint::AirQuality => source
            .air_quality(air_request())
            .await
            .map(|reading| {
                assert_eq!(reading.source, case.id, "provider '{}': source tag", case.id);
                assert_eq!(reading.aqi, Some(50), "provider '{}': aqi", case.id);
            })
            .map_err(|error| error.kind()),
        Endpoint::Nutrition => source
            .nutrition(food_request())
            .await
            .map(|batch| {
                assert_eq!(batch.source, case.id, "provider '{}': source tag", case.id);
                assert_eq!(batch.items[0].calories, 52.0, "provider '{}': calories", case.id);
            })
            .map_err(|error| error.kind()),
    }
}

#[tokio::test]
async fn every_provider_normalizes_a_successful_reply() {
    for case in provider_cases() {
        let http = ScriptedHttpClient::json(case.success_body);
        let source = (case.build)(http, Some(String::from("key")));

        assert_eq!(source.id(), case.id);
        assert!(source.capabilities().supports(case.endpoint));
        call(&case, source.as_ref())
            .await
            .unwrap_or_else(|kind| panic!("provider '{}' failed: {kind:?}", case.id));
    }
}

#[tokio::test]
async fn every_provider_rejects_the_endpoint_it_does_not_serve() {
    for case in provider_cases() {
        let http = ScriptedHttpClient::with(vec![]);
        let source = (case.build)(http.clone(), Some(String::from("key")));

        let kind = match case.endpoint {
            Endpoint::AirQuality => source.nutrition(food_request()).await.map(|_| ()),
            Endpoint::Nutrition => source.air_quality(air_request()).await.map(|_| ()),
        }
        .expect_err("unsupported endpoint")
        .kind();

        assert_eq!(kind, SourceErrorKind::UnsupportedEndpoint, "provider '{}'", case.id);
        assert!(http.requests().is_empty(), "provider '{}' made a call", case.id);
    }
}

#[tokio::test]
async fn every_keyed_provider_reports_missing_credentials_without_calling_out() {
    for case in provider_cases().into_iter().filter(|case| !case.id.is_keyless()) {
        let http = ScriptedHttpClient::json(case.success_body);
        let source = (case.build)(http.clone(), None);

        assert!(!source.is_configured(), "provider '{}'", case.id);
        assert_eq!(
            call(&case, source.as_ref()).await,
            Err(SourceErrorKind::Configuration),
            "provider '{}'",
            case.id
        );
        assert!(http.requests().is_empty(), "provider '{}' made a call", case.id);
    }
}

#[tokio::test]
async fn every_provider_maps_404_to_not_found_and_garbage_to_malformed() {
    for case in provider_cases() {
        let http = ScriptedHttpClient::with(vec![
            Ok(HttpResponse::with_status(404, "")),
            Ok(HttpResponse::ok_json("<html>maintenance</html>")),
        ]);
        let source = (case.build)(http, Some(String::from("key")));

        assert_eq!(
            call(&case, source.as_ref()).await,
            Err(SourceErrorKind::Response(ResponseFailure::NotFound)),
            "provider '{}': 404",
            case.id
        );
        assert_eq!(
            call(&case, source.as_ref()).await,
            Err(SourceErrorKind::Response(ResponseFailure::Malformed)),
            "provider '{}': bad body",
            case.id
        );
    }
}

#[tokio::test]
async fn every_provider_maps_connection_failures_to_transport() {
    for case in provider_cases() {
        let http = ScriptedHttpClient::with(vec![Err(HttpError::new("connection refused"))]);
        let source = (case.build)(http, Some(String::from("key")));

        assert_eq!(
            call(&case, source.as_ref()).await,
            Err(SourceErrorKind::Transport),
            "provider '{}'",
            case.id
        );
    }
}
