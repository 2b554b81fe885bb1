//! Behavior-driven tests for provider acquisition.
//!
//! These tests verify HOW lookups move through the cache, the fallback
//! chain and the rate limiter, using scripted providers instead of the
//! network.

#[path = "support/mod.rs"]
mod support;

use std::sync::Arc;
use std::time::Duration;

use statisty_core::{
    AcquisitionError, AirQualityRequest, CacheMode, ChainEntry, Endpoint, FailureReason,
    FallbackChain, FallbackChainBuilder, HttpResponse, InMemoryMetricsStore, MetricsService,
    ProviderId, RateLimiter, SourceError, SourceErrorKind, SourceStrategy, StatistyConfig,
};
use support::{Outcome, ScriptedHttpClient, ScriptedSource};

const TTL: Duration = Duration::from_secs(60);

fn chain_of(sources: &[Arc<ScriptedSource>]) -> FallbackChain {
    FallbackChain::new(
        sources
            .iter()
            .map(|source| ChainEntry::new(source.clone()))
            .collect(),
    )
}

fn service_over(sources: &[Arc<ScriptedSource>]) -> MetricsService<InMemoryMetricsStore> {
    MetricsService::new(chain_of(sources), InMemoryMetricsStore::new(), TTL)
}

fn london() -> AirQualityRequest {
    AirQualityRequest::new(51.51, -0.13).expect("valid coordinates")
}

// =============================================================================
// Fallback chain
// =============================================================================

#[tokio::test]
async fn when_first_provider_fails_and_second_is_unconfigured_third_provider_answers() {
    support::init_tracing();

    // Given: a transport failure, a provider without credentials and a healthy provider
    let failing = Arc::new(ScriptedSource::air(
        ProviderId::OpenMeteo,
        vec![Outcome::Fail(SourceError::transport("connection reset"))],
    ));
    let unconfigured =
        Arc::new(ScriptedSource::air(ProviderId::OpenWeather, vec![Outcome::Aqi(Some(1))]).unconfigured());
    let healthy = Arc::new(ScriptedSource::air(ProviderId::Waqi, vec![Outcome::Aqi(Some(42))]));
    let chain = chain_of(&[failing.clone(), unconfigured.clone(), healthy.clone()]);

    // When: the chain resolves an air quality lookup
    let success = chain
        .route_air_quality(&london(), &SourceStrategy::Ordered)
        .await
        .expect("third provider should answer");

    // Then: the third provider's data is returned with the full trace
    assert_eq!(success.selected_source, ProviderId::Waqi);
    assert_eq!(success.data.aqi, Some(42));
    assert_eq!(
        success.source_chain,
        vec![ProviderId::OpenMeteo, ProviderId::OpenWeather, ProviderId::Waqi]
    );
    assert_eq!(success.failures.len(), 2);
    assert!(matches!(
        &success.failures[0].reason,
        FailureReason::Failed(error) if error.kind() == SourceErrorKind::Transport
    ));
    assert_eq!(success.failures[1].reason, FailureReason::Skipped);
    assert_eq!(success.warnings.len(), 1);

    // And: the unconfigured provider was never called
    assert_eq!(unconfigured.calls(), 0);
    assert_eq!(failing.calls(), 1);
}

#[tokio::test]
async fn when_every_provider_lacks_credentials_the_feature_is_reported_unavailable() {
    // Given: only unconfigured providers
    let sources = [
        Arc::new(ScriptedSource::nutrition(ProviderId::CalorieNinjas, vec![]).unconfigured()),
        Arc::new(ScriptedSource::nutrition(ProviderId::ApiNinjas, vec![]).unconfigured()),
    ];
    let service = service_over(&sources);

    // When: a nutrition lookup runs
    let error = service
        .nutrition_lookup("1 apple")
        .await
        .expect_err("nothing can answer");

    // Then: the error says the feature is unavailable, not that providers broke
    assert!(error.is_feature_unavailable());
    let AcquisitionError::Exhausted(failure) = error else {
        panic!("expected exhaustion");
    };
    assert_eq!(failure.endpoint, Endpoint::Nutrition);
    assert_eq!(failure.failures.len(), 2);
}

#[tokio::test]
async fn when_strict_strategy_fails_no_other_provider_is_tried() {
    // Given: a failing provider and a healthy one
    let failing = Arc::new(ScriptedSource::air(
        ProviderId::OpenWeather,
        vec![Outcome::Fail(SourceError::bad_status(503, "unavailable"))],
    ));
    let healthy = Arc::new(ScriptedSource::air(ProviderId::OpenMeteo, vec![Outcome::Aqi(Some(12))]));
    let service = service_over(&[failing.clone(), healthy.clone()]);

    // When: the caller pins the failing provider
    let error = service
        .air_quality_with(
            51.51,
            -0.13,
            &SourceStrategy::Strict(ProviderId::OpenWeather),
            CacheMode::Use,
        )
        .await
        .expect_err("strict lookups do not fall back");

    // Then: only the pinned provider was called
    assert!(matches!(error, AcquisitionError::Exhausted(_)));
    assert_eq!(failing.calls(), 1);
    assert_eq!(healthy.calls(), 0);
}

#[tokio::test]
async fn when_waqi_reports_no_current_index_the_chain_moves_on() {
    support::init_tracing();

    // Given: WAQI answers with "-" and Open-Meteo answers with a concentration
    let http = ScriptedHttpClient::with(vec![
        Ok(HttpResponse::ok_json(
            r#"{"status": "ok", "data": {"aqi": "-", "iaqi": {}}}"#,
        )),
        Ok(HttpResponse::ok_json(r#"{"current": {"pm2_5": 35.4}}"#)),
    ]);
    let chain = FallbackChainBuilder::new(
        StatistyConfig::default().with_api_key(ProviderId::Waqi, "token"),
    )
    .with_http_client(http.clone())
    .with_air_quality_order(vec![ProviderId::Waqi, ProviderId::OpenMeteo])
    .build();

    // When: the chain resolves the lookup
    let success = chain
        .route_air_quality(&london(), &SourceStrategy::Ordered)
        .await
        .expect("open-meteo should answer");

    // Then: WAQI is recorded as unusable and Open-Meteo's interpolated index wins
    assert_eq!(success.selected_source, ProviderId::OpenMeteo);
    assert_eq!(success.data.aqi, Some(100));
    assert_eq!(success.failures[0].reason, FailureReason::Unusable);
    assert_eq!(http.requests().len(), 2);
}

#[tokio::test]
async fn when_no_keys_are_configured_the_default_chain_uses_open_meteo_only() {
    // Given: the production chain with no credentials
    let http = ScriptedHttpClient::json(r#"{"current": {"pm2_5": 5.0}}"#);
    let chain = FallbackChainBuilder::new(StatistyConfig::default())
        .with_http_client(http.clone())
        .with_air_quality_order(vec![ProviderId::OpenWeather, ProviderId::Waqi, ProviderId::OpenMeteo])
        .build();

    // When: an air quality lookup runs
    let success = chain
        .route_air_quality(&london(), &SourceStrategy::Ordered)
        .await
        .expect("keyless provider answers");

    // Then: keyed providers are skipped without any HTTP call
    assert_eq!(success.selected_source, ProviderId::OpenMeteo);
    assert_eq!(http.requests().len(), 1);
    assert!(success
        .failures
        .iter()
        .all(|failure| failure.reason == FailureReason::Skipped));
}

// =============================================================================
// Caching
// =============================================================================

#[tokio::test(start_paused = true)]
async fn when_a_reading_is_cached_repeat_lookups_skip_the_provider_until_ttl_expires() {
    // Given: a service whose only provider counts its calls
    let source = Arc::new(ScriptedSource::air(ProviderId::OpenMeteo, vec![Outcome::Aqi(Some(30))]));
    let service = service_over(&[source.clone()]);

    // When: the same location is looked up twice within the TTL
    let first = service.air_quality(51.511, -0.131).await.expect("first lookup");
    let second = service.air_quality(51.512, -0.129).await.expect("second lookup");

    // Then: the provider ran once and both answers match
    assert_eq!(source.calls(), 1);
    assert_eq!(first, second);

    // When: the TTL passes
    tokio::time::advance(TTL).await;
    service.air_quality(51.51, -0.13).await.expect("third lookup");

    // Then: the provider runs again
    assert_eq!(source.calls(), 2);
}

#[tokio::test]
async fn when_the_chain_is_exhausted_the_failure_is_not_cached() {
    // Given: a provider that fails once and then recovers
    let source = Arc::new(ScriptedSource::air(
        ProviderId::OpenMeteo,
        vec![
            Outcome::Fail(SourceError::transport("timeout")),
            Outcome::Aqi(Some(55)),
        ],
    ));
    let service = service_over(&[source.clone()]);

    // When: the first lookup fails
    let error = service.air_quality(40.71, -74.01).await.expect_err("first fails");
    assert!(matches!(error, AcquisitionError::Exhausted(_)));

    // Then: the next lookup goes back to the provider and succeeds
    let report = service.air_quality(40.71, -74.01).await.expect("second succeeds");
    assert_eq!(report.reading.aqi, Some(55));
    assert_eq!(source.calls(), 2);
}

#[tokio::test]
async fn when_concurrent_lookups_miss_the_same_key_the_provider_runs_once() {
    // Given: a slow provider
    let source = Arc::new(
        ScriptedSource::nutrition(ProviderId::CalorieNinjas, vec![Outcome::Items(vec!["rice"])])
            .with_delay(Duration::from_millis(20)),
    );
    let service = service_over(&[source.clone()]);

    // When: three callers ask for the same query at once
    let (a, b, c) = tokio::join!(
        service.nutrition_lookup("200g rice"),
        service.nutrition_lookup("200G Rice"),
        service.nutrition_lookup("200g rice"),
    );

    // Then: one provider call served all of them
    assert_eq!(source.calls(), 1);
    for batch in [a, b, c] {
        assert_eq!(batch.expect("lookup").items[0].name, "rice");
    }
}

#[tokio::test]
async fn when_refresh_is_requested_the_cached_value_is_replaced() {
    // Given: a cached reading
    let source = Arc::new(ScriptedSource::air(
        ProviderId::OpenMeteo,
        vec![Outcome::Aqi(Some(20)), Outcome::Aqi(Some(80))],
    ));
    let service = service_over(&[source.clone()]);
    service.air_quality(1.0, 1.0).await.expect("warm cache");

    // When: the caller forces a refresh
    let refreshed = service
        .air_quality_with(1.0, 1.0, &SourceStrategy::Ordered, CacheMode::Refresh)
        .await
        .expect("refresh");

    // Then: the new value is returned and served afterwards
    assert_eq!(refreshed.reading.aqi, Some(80));
    let cached = service.air_quality(1.0, 1.0).await.expect("cached");
    assert_eq!(cached.reading.aqi, Some(80));
    assert_eq!(source.calls(), 2);
}

// =============================================================================
// Deadlines
// =============================================================================

#[tokio::test(start_paused = true)]
async fn when_the_deadline_passes_the_remaining_chain_is_abandoned() {
    // Given: a provider that takes ten seconds followed by a fast one
    let slow = Arc::new(
        ScriptedSource::air(ProviderId::OpenMeteo, vec![Outcome::Fail(SourceError::transport("late"))])
            .with_delay(Duration::from_secs(10)),
    );
    let fast = Arc::new(ScriptedSource::air(ProviderId::Waqi, vec![Outcome::Aqi(Some(10))]));
    let service = service_over(&[slow.clone(), fast.clone()]).with_deadline(Duration::from_secs(1));

    // When: the lookup runs with a one second deadline
    let error = service.air_quality(48.85, 2.35).await.expect_err("deadline");

    // Then: the deadline error is returned and the fast provider was never reached
    assert!(matches!(
        error,
        AcquisitionError::DeadlineExceeded {
            endpoint: Endpoint::AirQuality,
            deadline_ms: 1_000
        }
    ));
    assert_eq!(fast.calls(), 0);
}

#[tokio::test(start_paused = true)]
async fn when_a_second_caller_waits_on_the_same_key_its_own_deadline_still_applies() {
    // Given: one slow provider and a one second deadline
    let slow = Arc::new(
        ScriptedSource::air(ProviderId::OpenMeteo, vec![Outcome::Fail(SourceError::transport("late"))])
            .with_delay(Duration::from_secs(10)),
    );
    let service = service_over(&[slow]).with_deadline(Duration::from_secs(1));
    let service = &service;
    let started = tokio::time::Instant::now();
    let timed_lookup = move || async move {
        let result = service.air_quality(40.71, -74.01).await;
        (result, started.elapsed())
    };

    // When: two callers miss the same key together
    let (first, second) = tokio::join!(timed_lookup(), timed_lookup());

    // Then: neither waits longer than the deadline
    for (result, elapsed) in [first, second] {
        assert!(matches!(
            result,
            Err(AcquisitionError::DeadlineExceeded {
                endpoint: Endpoint::AirQuality,
                deadline_ms: 1_000
            })
        ));
        assert!(elapsed <= Duration::from_secs(1), "waited {elapsed:?}");
    }
}

// =============================================================================
// Rate limiting
// =============================================================================

#[tokio::test(start_paused = true)]
async fn when_callers_exceed_the_quota_no_window_admits_more_than_the_limit() {
    // Given: a limiter admitting two calls per ten seconds
    let limiter = RateLimiter::new(2, Duration::from_secs(10)).with_backoff(Duration::from_millis(250));
    let started = tokio::time::Instant::now();

    // When: five callers wait for a slot
    let mut handles = Vec::new();
    for _ in 0..5 {
        let limiter = limiter.clone();
        handles.push(tokio::spawn(async move {
            limiter.await_slot().await;
            tokio::time::Instant::now()
        }));
    }
    let mut admitted = Vec::new();
    for handle in handles {
        admitted.push(handle.await.expect("task"));
    }
    admitted.sort();

    // Then: every caller eventually ran, none was rejected
    assert_eq!(admitted.len(), 5);
    // And: any ten second window holds at most two admissions
    for (index, at) in admitted.iter().enumerate() {
        let in_window = admitted[index..]
            .iter()
            .filter(|later| later.duration_since(*at) < Duration::from_secs(10))
            .count();
        assert!(in_window <= 2, "window starting {:?} admitted {in_window}", *at - started);
    }
}
