//! Behavior-driven tests for the metric store contract and the service
//! operations that write to it.

use std::time::Duration;

use serde_json::json;
use time::macros::datetime;
use time::OffsetDateTime;

use statisty_core::{
    AcquisitionError, AirQuality, AqiCategory, BodyMeasurement, DateRange, DerivedMetric,
    FallbackChain, InMemoryMetricsStore, MetricKind, MetricQuery, MetricRecord, MetricsService,
    MetricsStore, ProviderId, StoreError,
};

async fn seeded_store() -> (InMemoryMetricsStore, Vec<MetricRecord>) {
    let store = InMemoryMetricsStore::new();
    let mut seeded = Vec::new();
    for (day, hours) in [(3, 7.5), (1, 6.0), (2, 8.0)] {
        let created_at = datetime!(2024-02-01 07:00 UTC) + time::Duration::days(day);
        let record = MetricRecord::new(
            "alice",
            MetricKind::Sleep,
            json!({"duration_hours": hours}),
            created_at,
        );
        store.insert(record.clone()).await;
        seeded.push(record);
    }
    store
        .insert(MetricRecord::new(
            "bob",
            MetricKind::Sleep,
            json!({"duration_hours": 9.0}),
            datetime!(2024-02-03 07:00 UTC),
        ))
        .await;
    (store, seeded)
}

fn created(records: &[MetricRecord]) -> Vec<OffsetDateTime> {
    records.iter().map(|record| record.created_at).collect()
}

#[tokio::test]
async fn when_no_range_is_given_records_come_back_newest_first() {
    // Given: three sleep records inserted out of order
    let (store, _) = seeded_store().await;

    // When: the user's records are queried without a range
    let records = store
        .query(MetricQuery::for_user("alice").with_kind(MetricKind::Sleep))
        .await
        .expect("query");

    // Then: newest first, other users excluded
    assert_eq!(
        created(&records),
        vec![
            datetime!(2024-02-04 07:00 UTC),
            datetime!(2024-02-03 07:00 UTC),
            datetime!(2024-02-02 07:00 UTC),
        ]
    );
}

#[tokio::test]
async fn when_a_range_is_given_records_come_back_chronologically() {
    let (store, _) = seeded_store().await;
    let range = DateRange::new(
        datetime!(2024-02-02 00:00 UTC),
        datetime!(2024-02-03 23:59 UTC),
    )
    .expect("valid range");

    let records = store
        .query(
            MetricQuery::for_user("alice")
                .with_kind(MetricKind::Sleep)
                .with_range(range),
        )
        .await
        .expect("query");

    assert_eq!(
        created(&records),
        vec![
            datetime!(2024-02-02 07:00 UTC),
            datetime!(2024-02-03 07:00 UTC),
        ]
    );
}

#[tokio::test]
async fn when_a_limit_is_set_only_the_newest_records_are_returned() {
    let (store, _) = seeded_store().await;

    let records = store
        .query(MetricQuery::for_user("alice").with_limit(1))
        .await
        .expect("query");

    assert_eq!(created(&records), vec![datetime!(2024-02-04 07:00 UTC)]);
}

#[tokio::test]
async fn when_latest_is_requested_the_newest_record_of_the_kind_is_returned() {
    let (store, _) = seeded_store().await;

    let latest = store
        .latest("alice", MetricKind::Sleep)
        .await
        .expect("latest")
        .expect("a record exists");
    let none = store
        .latest("alice", MetricKind::Hydration)
        .await
        .expect("latest");

    assert_eq!(latest.payload["duration_hours"], 7.5);
    assert!(none.is_none());
}

#[tokio::test]
async fn when_another_user_deletes_a_record_nothing_is_removed() {
    let (store, seeded) = seeded_store().await;
    let target = seeded[0].id;

    assert!(!store.delete("bob", target).await.expect("delete runs"));
    assert!(store.delete("alice", target).await.expect("delete runs"));
    assert!(!store.delete("alice", target).await.expect("delete runs"));
    assert_eq!(store.len().await, 3);
}

#[tokio::test]
async fn when_a_record_is_updated_its_payload_is_replaced_and_stamped() {
    let (store, seeded) = seeded_store().await;

    let updated = store
        .update("alice", seeded[1].id, json!({"duration_hours": 6.5}))
        .await
        .expect("update");

    assert_eq!(updated.payload["duration_hours"], 6.5);
    assert_eq!(updated.created_at, seeded[1].created_at);
    assert!(updated.updated_at.is_some());
}

#[test]
fn when_a_range_is_inverted_it_is_rejected() {
    let result = DateRange::new(
        datetime!(2024-02-05 00:00 UTC),
        datetime!(2024-02-01 00:00 UTC),
    );
    assert_eq!(result, Err(StoreError::InvalidRange));
}

fn service_over(store: InMemoryMetricsStore) -> MetricsService<InMemoryMetricsStore> {
    MetricsService::new(FallbackChain::new(Vec::new()), store, Duration::from_secs(60))
}

#[tokio::test]
async fn when_a_body_measurement_is_invalid_nothing_is_stored() {
    // Given: a service over an empty store
    let service = service_over(InMemoryMetricsStore::new());

    // When: a zero height and a negative weight are recorded
    let zero_height = service
        .record_body_measurement(
            "alice",
            BodyMeasurement {
                weight_kg: 70.0,
                height_m: 0.0,
            },
        )
        .await;
    let negative_weight = service
        .record_body_measurement(
            "alice",
            BodyMeasurement {
                weight_kg: -1.0,
                height_m: 1.7,
            },
        )
        .await;

    // Then: both are rejected and the store stays empty
    assert!(matches!(zero_height, Err(AcquisitionError::Validation(_))));
    assert!(matches!(negative_weight, Err(AcquisitionError::Validation(_))));
    assert!(service.store().is_empty().await);
}

#[tokio::test]
async fn when_a_body_measurement_is_valid_it_is_stored_with_its_bmi() {
    let service = service_over(InMemoryMetricsStore::new());

    let (record, result) = service
        .record_body_measurement(
            "alice",
            BodyMeasurement {
                weight_kg: 70.0,
                height_m: 1.75,
            },
        )
        .await
        .expect("valid measurement");

    assert_eq!(record.kind, MetricKind::Bmi);
    assert_eq!(record.payload["weight_kg"], 70.0);
    assert_eq!(result.bmi, 22.9);
}

#[tokio::test]
async fn when_air_quality_is_recorded_derive_reports_the_latest_reading() {
    // Given: two readings recorded one after the other
    let service = service_over(InMemoryMetricsStore::new());
    for aqi in [42, 160] {
        service
            .record_air_quality(
                "alice",
                &AirQuality {
                    aqi: Some(aqi),
                    ..AirQuality::empty(ProviderId::Waqi)
                },
            )
            .await
            .expect("recorded");
    }

    // When: the air quality metric is derived
    let derived = service
        .derive("alice", MetricKind::AirQuality, None)
        .await
        .expect("derived");

    // Then: the later reading is reported with its category
    let DerivedMetric::AirQuality(Some(report)) = derived else {
        panic!("expected an air quality report");
    };
    assert_eq!(report.reading.aqi, Some(160));
    assert_eq!(report.category, Some(AqiCategory::Unhealthy));
}

#[tokio::test]
async fn when_bmi_is_derived_over_a_range_the_newest_measurement_in_it_wins() {
    // Given: measurements on three days, the last one outside the range
    let store = InMemoryMetricsStore::new();
    for (created_at, weight_kg, height_m) in [
        (datetime!(2024-04-01 08:00 UTC), 70.0, 1.75),
        (datetime!(2024-04-03 08:00 UTC), 90.0, 1.8),
        (datetime!(2024-04-09 08:00 UTC), 60.0, 1.8),
    ] {
        store
            .insert(MetricRecord::new(
                "alice",
                MetricKind::Bmi,
                json!({"weight_kg": weight_kg, "height_m": height_m}),
                created_at,
            ))
            .await;
    }
    let service = service_over(store);
    let range = DateRange::new(
        datetime!(2024-04-01 00:00 UTC),
        datetime!(2024-04-05 00:00 UTC),
    )
    .expect("valid range");

    // When: BMI is derived over the first days
    let derived = service
        .derive("alice", MetricKind::Bmi, Some(range))
        .await
        .expect("derived");

    // Then: the newest measurement inside the range is used
    let DerivedMetric::Bmi(Some(result)) = derived else {
        panic!("expected a BMI result");
    };
    assert_eq!(result.weight_kg, 90.0);
    assert_eq!(result.bmi, 27.8);
}
