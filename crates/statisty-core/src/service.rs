//! Acquisition service: the entry point callers use.
//!
//! Provider-backed metrics go cache -> fallback chain -> adapter. User-entered
//! metrics are validated on the way into the store and fed to the
//! calculators on the way out.

use std::future::Future;
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use statisty_store::{DateRange, MetricKind, MetricQuery, MetricRecord, MetricsStore};

use crate::aqi::AirQualityReport;
use crate::cache::{CacheMode, TtlCache};
use crate::config::StatistyConfig;
use crate::data_source::{AirQualityRequest, Endpoint, NutritionRequest};
use crate::metrics::{
    calculate_bmi_with, calculate_carbon_footprint, daily_hydration, daily_nutrition_summary,
    hydration_recommendation, nutrition_recommendations, sleep_debt, sleep_metrics,
    sleep_recommendation, sleep_trend, validate_carbon_inputs, weekly_hydration_stats,
    BmiCategory, BmiResult, CarbonCategory, CarbonFootprint, CarbonInputs, CarbonTip,
    EmissionFactors, CARBON_TIPS,
    HydrationSummary, HydrationTargets, NutritionProgress, NutritionSummary, NutritionTargets,
    SleepMetrics, SleepTargets, SleepTrend, ThresholdLadder, WeeklyHydrationStats,
};
use crate::metrics::stats::{mean, round_to};
use crate::routing::{FallbackChain, FallbackChainBuilder, SourceStrategy};
use crate::{
    AcquisitionError, AirQuality, BodyMeasurement, HydrationEntry, NutritionBatch, NutritionItem,
    SleepEntry,
};

/// Targets, factor tables and ladders used when deriving metrics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DerivationSettings {
    pub sleep: SleepTargets,
    pub hydration: HydrationTargets,
    pub nutrition: NutritionTargets,
    pub emission_factors: EmissionFactors,
    pub carbon_ladder: ThresholdLadder<CarbonCategory>,
    pub bmi_ladder: ThresholdLadder<BmiCategory>,
}

impl Default for DerivationSettings {
    fn default() -> Self {
        Self {
            sleep: SleepTargets::default(),
            hydration: HydrationTargets::default(),
            nutrition: NutritionTargets::default(),
            emission_factors: EmissionFactors::default(),
            carbon_ladder: CarbonCategory::default_ladder(),
            bmi_ladder: BmiCategory::default_ladder(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SleepReport {
    pub entries: usize,
    pub metrics: SleepMetrics,
    pub trend: SleepTrend,
    pub debt_hours: f64,
    pub recommendation: &'static str,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HydrationReport {
    /// Summary for the most recent calendar date that has entries.
    pub latest_day: HydrationSummary,
    pub weekly: WeeklyHydrationStats,
    pub recommendation: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NutritionReport {
    pub items: usize,
    pub summary: NutritionSummary,
    pub progress: NutritionProgress,
    pub recommendations: Vec<&'static str>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CarbonReport {
    /// One footprint per stored input set, in query order.
    pub footprints: Vec<CarbonFootprint>,
    pub average_total_kg: f64,
    /// Reduction tips; empty when nothing has been recorded.
    pub tips: &'static [CarbonTip],
}

/// Result of [`MetricsService::derive`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "result", rename_all = "snake_case")]
pub enum DerivedMetric {
    Bmi(Option<BmiResult>),
    Sleep(SleepReport),
    Hydration(HydrationReport),
    Nutrition(NutritionReport),
    Carbon(CarbonReport),
    AirQuality(Option<AirQualityReport>),
}

/// Owns the provider chain, the lookup caches and the metric store.
pub struct MetricsService<S> {
    chain: FallbackChain,
    air_cache: TtlCache<String, AirQuality>,
    nutrition_cache: TtlCache<String, NutritionBatch>,
    store: S,
    settings: DerivationSettings,
    deadline: Option<Duration>,
}

impl<S: MetricsStore> MetricsService<S> {
    pub fn new(chain: FallbackChain, store: S, cache_ttl: Duration) -> Self {
        Self {
            chain,
            air_cache: TtlCache::new(cache_ttl),
            nutrition_cache: TtlCache::new(cache_ttl),
            store,
            settings: DerivationSettings::default(),
            deadline: None,
        }
    }

    /// Production wiring: reqwest transport and every provider from `config`.
    pub fn from_config(config: StatistyConfig, store: S) -> Self {
        let cache_ttl = config.cache_ttl;
        Self::new(FallbackChainBuilder::new(config).build(), store, cache_ttl)
    }

    pub fn with_settings(mut self, settings: DerivationSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Bounds every lookup, including the wait on another caller's miss for
    /// the same key. Expiry abandons the chain.
    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = Some(deadline);
        self
    }

    pub fn chain(&self) -> &FallbackChain {
        &self.chain
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn settings(&self) -> &DerivationSettings {
        &self.settings
    }

    pub async fn air_quality(&self, lat: f64, lon: f64) -> Result<AirQualityReport, AcquisitionError> {
        self.air_quality_with(lat, lon, &SourceStrategy::Ordered, CacheMode::Use)
            .await
    }

    /// Current air quality near a location, categorized and annotated.
    ///
    /// Readings are cached per location rounded to two decimals. A strategy
    /// other than [`SourceStrategy::Ordered`] always bypasses the cache.
    pub async fn air_quality_with(
        &self,
        lat: f64,
        lon: f64,
        strategy: &SourceStrategy,
        mode: CacheMode,
    ) -> Result<AirQualityReport, AcquisitionError> {
        let request = AirQualityRequest::new(lat, lon)?;
        let lookup = self.air_cache.get_or_compute_with(
            request.cache_key(),
            self.air_cache.default_ttl(),
            effective_mode(strategy, mode),
            || async {
                self.chain
                    .route_air_quality(&request, strategy)
                    .await
                    .map(|success| success.data)
                    .map_err(AcquisitionError::from)
            },
        );
        let reading = self.bounded(Endpoint::AirQuality, lookup).await?;
        Ok(AirQualityReport::from_reading(reading))
    }

    pub async fn nutrition_lookup(&self, query: &str) -> Result<NutritionBatch, AcquisitionError> {
        self.nutrition_lookup_with(query, &SourceStrategy::Ordered, CacheMode::Use)
            .await
    }

    /// Nutrition facts for a free-text query, cached per lowercased query.
    pub async fn nutrition_lookup_with(
        &self,
        query: &str,
        strategy: &SourceStrategy,
        mode: CacheMode,
    ) -> Result<NutritionBatch, AcquisitionError> {
        let request = NutritionRequest::new(query)?;
        let lookup = self.nutrition_cache.get_or_compute_with(
            request.cache_key(),
            self.nutrition_cache.default_ttl(),
            effective_mode(strategy, mode),
            || async {
                self.chain
                    .route_nutrition(&request, strategy)
                    .await
                    .map(|success| success.data)
                    .map_err(AcquisitionError::from)
            },
        );
        self.bounded(Endpoint::Nutrition, lookup).await
    }

    /// Drops expired lookups from both caches.
    pub fn clear_expired(&self) {
        self.air_cache.clear_expired(self.air_cache.default_ttl());
        self.nutrition_cache
            .clear_expired(self.nutrition_cache.default_ttl());
    }

    /// Applies the deadline, if any, to a whole lookup. Dropping the lookup
    /// releases the cache slot and cancels the in-flight provider call.
    async fn bounded<T>(
        &self,
        endpoint: Endpoint,
        lookup: impl Future<Output = Result<T, AcquisitionError>>,
    ) -> Result<T, AcquisitionError> {
        let Some(deadline) = self.deadline else {
            return lookup.await;
        };
        match tokio::time::timeout(deadline, lookup).await {
            Ok(result) => result,
            Err(_) => {
                let deadline_ms = u64::try_from(deadline.as_millis()).unwrap_or(u64::MAX);
                tracing::warn!(endpoint = %endpoint, deadline_ms, "lookup abandoned at deadline");
                Err(AcquisitionError::DeadlineExceeded {
                    endpoint,
                    deadline_ms,
                })
            }
        }
    }

    pub async fn record_sleep(
        &self,
        user_id: &str,
        entry: &SleepEntry,
    ) -> Result<MetricRecord, AcquisitionError> {
        entry.validate()?;
        self.save(user_id, MetricKind::Sleep, entry).await
    }

    pub async fn record_hydration(
        &self,
        user_id: &str,
        entry: &HydrationEntry,
    ) -> Result<MetricRecord, AcquisitionError> {
        entry.validate()?;
        self.save(user_id, MetricKind::Hydration, entry).await
    }

    /// Stores one record per eaten item. Nothing is stored unless every
    /// item validates.
    pub async fn record_nutrition(
        &self,
        user_id: &str,
        items: &[NutritionItem],
    ) -> Result<Vec<MetricRecord>, AcquisitionError> {
        for item in items {
            item.validate()?;
        }
        let mut records = Vec::with_capacity(items.len());
        for item in items {
            records.push(self.save(user_id, MetricKind::Nutrition, item).await?);
        }
        Ok(records)
    }

    /// Validates raw carbon inputs, stores them and returns today's footprint.
    pub async fn record_carbon(
        &self,
        user_id: &str,
        raw: &serde_json::Value,
    ) -> Result<(MetricRecord, CarbonFootprint), AcquisitionError> {
        let inputs = validate_carbon_inputs(raw)?;
        let record = self.save(user_id, MetricKind::Carbon, &inputs).await?;
        let footprint = self.footprint(&inputs, &record);
        Ok((record, footprint))
    }

    pub async fn record_body_measurement(
        &self,
        user_id: &str,
        measurement: BodyMeasurement,
    ) -> Result<(MetricRecord, BmiResult), AcquisitionError> {
        let result = calculate_bmi_with(measurement, &self.settings.bmi_ladder)?;
        let record = self.save(user_id, MetricKind::Bmi, &measurement).await?;
        Ok((record, result))
    }

    pub async fn record_air_quality(
        &self,
        user_id: &str,
        reading: &AirQuality,
    ) -> Result<MetricRecord, AcquisitionError> {
        self.save(user_id, MetricKind::AirQuality, reading).await
    }

    /// Derives a metric from the user's stored records.
    ///
    /// Without a range the newest records (store default limit) are used;
    /// with a range, every record in the window.
    ///
    /// # Errors
    ///
    /// [`AcquisitionError::Payload`] when a stored payload does not decode as
    /// the kind's raw entry, [`AcquisitionError::Store`] on store failure.
    pub async fn derive(
        &self,
        user_id: &str,
        kind: MetricKind,
        range: Option<DateRange>,
    ) -> Result<DerivedMetric, AcquisitionError> {
        let mut query = MetricQuery::for_user(user_id).with_kind(kind);
        if let Some(range) = range {
            query = query.with_range(range);
        }
        let records = self.store.query(query).await?;
        tracing::debug!(user_id, kind = %kind, records = records.len(), "deriving metric");

        let settings = &self.settings;
        let derived = match kind {
            MetricKind::Bmi => {
                let latest = newest::<BodyMeasurement>(kind, &records, range.is_some())?;
                DerivedMetric::Bmi(
                    latest
                        .map(|measurement| calculate_bmi_with(measurement, &settings.bmi_ladder))
                        .transpose()?,
                )
            }
            MetricKind::Sleep => {
                let entries = decode::<SleepEntry>(kind, &records)?;
                let metrics = sleep_metrics(&entries, &settings.sleep);
                DerivedMetric::Sleep(SleepReport {
                    entries: entries.len(),
                    metrics,
                    trend: sleep_trend(&entries, &settings.sleep),
                    debt_hours: sleep_debt(&entries, settings.sleep.target_hours),
                    recommendation: sleep_recommendation(&metrics),
                })
            }
            MetricKind::Hydration => {
                let entries = decode::<HydrationEntry>(kind, &records)?;
                let latest_date = entries.iter().map(HydrationEntry::date).max();
                let latest_entries = entries
                    .iter()
                    .filter(|entry| Some(entry.date()) == latest_date)
                    .cloned()
                    .collect::<Vec<_>>();
                let latest_day = daily_hydration(&latest_entries, &settings.hydration);
                DerivedMetric::Hydration(HydrationReport {
                    recommendation: hydration_recommendation(&latest_day),
                    weekly: weekly_hydration_stats(&entries, &settings.hydration),
                    latest_day,
                })
            }
            MetricKind::Nutrition => {
                let items = decode::<NutritionItem>(kind, &records)?;
                let summary = daily_nutrition_summary(&items);
                DerivedMetric::Nutrition(NutritionReport {
                    items: items.len(),
                    progress: summary.progress(&settings.nutrition),
                    recommendations: nutrition_recommendations(&summary, &settings.nutrition),
                    summary,
                })
            }
            MetricKind::Carbon => {
                let inputs = decode::<CarbonInputs>(kind, &records)?;
                let footprints = inputs
                    .iter()
                    .zip(&records)
                    .map(|(inputs, record)| self.footprint(inputs, record))
                    .collect::<Vec<_>>();
                let totals = footprints
                    .iter()
                    .map(|footprint| footprint.total_kg)
                    .collect::<Vec<_>>();
                DerivedMetric::Carbon(CarbonReport {
                    average_total_kg: round_to(mean(&totals), 2),
                    tips: if footprints.is_empty() { &[] } else { &CARBON_TIPS },
                    footprints,
                })
            }
            MetricKind::AirQuality => {
                let latest = newest::<AirQuality>(kind, &records, range.is_some())?;
                DerivedMetric::AirQuality(latest.map(AirQualityReport::from_reading))
            }
        };
        Ok(derived)
    }

    fn footprint(&self, inputs: &CarbonInputs, record: &MetricRecord) -> CarbonFootprint {
        calculate_carbon_footprint(
            inputs,
            &self.settings.emission_factors,
            &self.settings.carbon_ladder,
            record.created_at.date(),
        )
    }

    async fn save<T: Serialize>(
        &self,
        user_id: &str,
        kind: MetricKind,
        payload: &T,
    ) -> Result<MetricRecord, AcquisitionError> {
        let payload = serde_json::to_value(payload)
            .map_err(|source| AcquisitionError::Payload { kind, source })?;
        Ok(self.store.save(user_id, kind, payload).await?)
    }
}

fn effective_mode(strategy: &SourceStrategy, mode: CacheMode) -> CacheMode {
    match strategy {
        SourceStrategy::Ordered => mode,
        _ => CacheMode::Bypass,
    }
}

fn decode<T: DeserializeOwned>(
    kind: MetricKind,
    records: &[MetricRecord],
) -> Result<Vec<T>, AcquisitionError> {
    records
        .iter()
        .map(|record| {
            serde_json::from_value(record.payload.clone())
                .map_err(|source| AcquisitionError::Payload { kind, source })
        })
        .collect()
}

/// Newest record's payload. Range queries come back oldest first.
fn newest<T: DeserializeOwned>(
    kind: MetricKind,
    records: &[MetricRecord],
    chronological: bool,
) -> Result<Option<T>, AcquisitionError> {
    let record = if chronological {
        records.last()
    } else {
        records.first()
    };
    record
        .map(|record| decode::<T>(kind, std::slice::from_ref(record)))
        .transpose()
        .map(|decoded| decoded.and_then(|mut values| values.pop()))
}
