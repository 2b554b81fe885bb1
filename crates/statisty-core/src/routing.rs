use std::collections::{HashMap, HashSet};
use std::fmt::{Display, Formatter};
use std::sync::Arc;
use std::time::Instant;

use thiserror::Error;

use crate::adapters::{
    ApiNinjasAdapter, CalorieNinjasAdapter, OpenMeteoAdapter, OpenWeatherAdapter, WaqiAdapter,
};
use crate::config::StatistyConfig;
use crate::data_source::{
    AirQualityRequest, DataSource, Endpoint, NutritionRequest, SourceError, SourceErrorKind,
    SourceFuture, Usable,
};
use crate::http_client::{HttpClient, ReqwestHttpClient};
use crate::{AirQuality, NutritionBatch, ProviderId};

/// Gate evaluated before a provider is called. Returning `false` skips it.
pub type Precondition = Arc<dyn Fn(&dyn DataSource) -> bool + Send + Sync>;

/// Provider selection for a single call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum SourceStrategy {
    /// The chain's configured order for the endpoint.
    #[default]
    Ordered,
    /// Caller-supplied order; duplicates are dropped.
    Priority(Vec<ProviderId>),
    /// One provider, no fallback.
    Strict(ProviderId),
}

impl SourceStrategy {
    pub fn is_strict(&self) -> bool {
        matches!(self, Self::Strict(_))
    }
}

/// A provider plus the gate that decides whether it is attempted.
#[derive(Clone)]
pub struct ChainEntry {
    source: Arc<dyn DataSource>,
    precondition: Option<Precondition>,
}

impl ChainEntry {
    /// Entry gated on the provider having its credential.
    pub fn new(source: Arc<dyn DataSource>) -> Self {
        Self {
            source,
            precondition: None,
        }
    }

    pub fn with_precondition(
        mut self,
        precondition: impl Fn(&dyn DataSource) -> bool + Send + Sync + 'static,
    ) -> Self {
        self.precondition = Some(Arc::new(precondition));
        self
    }

    pub fn id(&self) -> ProviderId {
        self.source.id()
    }

    pub fn source(&self) -> &Arc<dyn DataSource> {
        &self.source
    }

    fn admits(&self) -> bool {
        match &self.precondition {
            Some(precondition) => precondition(self.source.as_ref()),
            None => self.source.is_configured(),
        }
    }
}

/// Why one provider did not produce the result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureReason {
    /// No adapter is registered under this id.
    Unregistered,
    /// Precondition not met; the provider was never called.
    Skipped,
    /// The adapter does not serve the endpoint; it was never called.
    Unsupported,
    Failed(SourceError),
    /// The call succeeded but the payload fails the usability check.
    Unusable,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderFailure {
    pub provider: ProviderId,
    pub reason: FailureReason,
}

impl ProviderFailure {
    fn new(provider: ProviderId, reason: FailureReason) -> Self {
        Self { provider, reason }
    }

    /// True when the provider could not run here: no credential, or no
    /// support for the endpoint.
    pub fn is_unconfigured(&self) -> bool {
        match &self.reason {
            FailureReason::Skipped | FailureReason::Unsupported => true,
            FailureReason::Failed(error) => error.kind() == SourceErrorKind::Configuration,
            _ => false,
        }
    }
}

impl Display for ProviderFailure {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match &self.reason {
            FailureReason::Unregistered => write!(f, "{}: not registered", self.provider),
            FailureReason::Skipped => write!(f, "{}: skipped", self.provider),
            FailureReason::Unsupported => write!(f, "{}: endpoint not supported", self.provider),
            FailureReason::Failed(error) => write!(f, "{}: {error}", self.provider),
            FailureReason::Unusable => write!(f, "{}: returned no usable data", self.provider),
        }
    }
}

/// Successful resolution plus the trace of what was tried.
#[derive(Debug, Clone)]
pub struct ChainSuccess<T> {
    pub data: T,
    pub selected_source: ProviderId,
    pub source_chain: Vec<ProviderId>,
    pub warnings: Vec<String>,
    pub failures: Vec<ProviderFailure>,
    pub latency_ms: u64,
}

/// Every candidate was skipped or failed.
#[derive(Debug, Clone, Error)]
#[error("all providers exhausted for {endpoint}: {}", join_failures(.failures))]
pub struct ChainFailure {
    pub endpoint: Endpoint,
    pub source_chain: Vec<ProviderId>,
    pub failures: Vec<ProviderFailure>,
    pub latency_ms: u64,
}

impl ChainFailure {
    /// True when nothing ran because no candidate had a credential or
    /// served the endpoint.
    pub fn all_unconfigured(&self) -> bool {
        !self.failures.is_empty() && self.failures.iter().all(ProviderFailure::is_unconfigured)
    }
}

fn join_failures(failures: &[ProviderFailure]) -> String {
    if failures.is_empty() {
        return String::from("no candidates");
    }
    failures
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

pub type ChainResult<T> = Result<ChainSuccess<T>, ChainFailure>;

/// Ordered provider fallback for each endpoint.
///
/// Entries are tried in order. A skipped precondition, a typed failure or an
/// unusable payload moves on to the next entry; the first usable payload
/// wins. Nothing is retried against the same provider.
#[derive(Clone)]
pub struct FallbackChain {
    entries: HashMap<ProviderId, ChainEntry>,
    orders: HashMap<Endpoint, Vec<ProviderId>>,
}

impl FallbackChain {
    /// Builds a chain whose default order per endpoint is registration order
    /// restricted to the entries that serve that endpoint.
    pub fn new(entries: Vec<ChainEntry>) -> Self {
        let mut orders: HashMap<Endpoint, Vec<ProviderId>> = HashMap::new();
        for endpoint in [Endpoint::AirQuality, Endpoint::Nutrition] {
            let order = entries
                .iter()
                .filter(|entry| entry.source.capabilities().supports(endpoint))
                .map(ChainEntry::id)
                .collect::<Vec<_>>();
            orders.insert(endpoint, dedupe_chain(&order));
        }

        let entries = entries
            .into_iter()
            .map(|entry| (entry.id(), entry))
            .collect();
        Self { entries, orders }
    }

    pub fn with_order(mut self, endpoint: Endpoint, order: Vec<ProviderId>) -> Self {
        self.orders.insert(endpoint, dedupe_chain(&order));
        self
    }

    pub fn order(&self, endpoint: Endpoint) -> &[ProviderId] {
        self.orders.get(&endpoint).map_or(&[][..], Vec::as_slice)
    }

    pub fn entry(&self, provider: ProviderId) -> Option<&ChainEntry> {
        self.entries.get(&provider)
    }

    pub fn plan(&self, endpoint: Endpoint, strategy: &SourceStrategy) -> Vec<ProviderId> {
        match strategy {
            SourceStrategy::Ordered => self.order(endpoint).to_vec(),
            SourceStrategy::Priority(priority) => dedupe_chain(priority),
            SourceStrategy::Strict(provider) => vec![*provider],
        }
    }

    pub async fn route_air_quality(
        &self,
        req: &AirQualityRequest,
        strategy: &SourceStrategy,
    ) -> ChainResult<AirQuality> {
        let req = *req;
        self.route_endpoint(Endpoint::AirQuality, strategy, move |source| {
            source.air_quality(req)
        })
        .await
    }

    pub async fn route_nutrition(
        &self,
        req: &NutritionRequest,
        strategy: &SourceStrategy,
    ) -> ChainResult<NutritionBatch> {
        let req = req.clone();
        self.route_endpoint(Endpoint::Nutrition, strategy, move |source| {
            source.nutrition(req.clone())
        })
        .await
    }

    async fn route_endpoint<T, F>(
        &self,
        endpoint: Endpoint,
        strategy: &SourceStrategy,
        mut invoke: F,
    ) -> ChainResult<T>
    where
        T: Usable,
        F: for<'a> FnMut(&'a dyn DataSource) -> SourceFuture<'a, T>,
    {
        let started = Instant::now();
        let planned_chain = self.plan(endpoint, strategy);
        let mut source_chain = Vec::with_capacity(planned_chain.len());
        let mut failures = Vec::new();

        for provider in planned_chain {
            source_chain.push(provider);
            let reason = match self.entries.get(&provider) {
                None => FailureReason::Unregistered,
                Some(entry) if !entry.source.capabilities().supports(endpoint) => {
                    FailureReason::Unsupported
                }
                Some(entry) if !entry.admits() => FailureReason::Skipped,
                Some(entry) => match invoke(entry.source.as_ref()).await {
                    Ok(data) if data.is_usable() => {
                        let mut warnings = Vec::new();
                        if !failures.is_empty() {
                            tracing::info!(
                                endpoint = %endpoint,
                                provider = %provider,
                                failed = failures.len(),
                                "fallback provider succeeded"
                            );
                            warnings.push(format!(
                                "source fallback succeeded with '{provider}' after {} unsuccessful candidate(s)",
                                failures.len()
                            ));
                        }

                        return Ok(ChainSuccess {
                            data,
                            selected_source: provider,
                            source_chain,
                            warnings,
                            failures,
                            latency_ms: elapsed_ms(started),
                        });
                    }
                    Ok(_) => FailureReason::Unusable,
                    Err(error) => FailureReason::Failed(error),
                },
            };

            let failure = ProviderFailure::new(provider, reason);
            match &failure.reason {
                FailureReason::Skipped | FailureReason::Unsupported => {
                    tracing::debug!(endpoint = %endpoint, provider = %provider, "provider skipped")
                }
                _ => tracing::warn!(
                    endpoint = %endpoint,
                    provider = %provider,
                    error = %failure,
                    "provider failed, trying next"
                ),
            }
            failures.push(failure);

            if strategy.is_strict() {
                break;
            }
        }

        Err(ChainFailure {
            endpoint,
            source_chain,
            failures,
            latency_ms: elapsed_ms(started),
        })
    }
}

fn dedupe_chain(chain: &[ProviderId]) -> Vec<ProviderId> {
    let mut seen = HashSet::new();
    chain
        .iter()
        .copied()
        .filter(|provider| seen.insert(*provider))
        .collect()
}

fn elapsed_ms(started: Instant) -> u64 {
    started.elapsed().as_millis().min(u128::from(u64::MAX)) as u64
}

/// Builds the production chain from configuration.
///
/// Every provider is registered; the ones without a credential are skipped
/// at call time by the default precondition. Extra entries replace the
/// built-in adapter with the same id.
pub struct FallbackChainBuilder {
    config: StatistyConfig,
    http_client: Option<Arc<dyn HttpClient>>,
    overrides: Vec<ChainEntry>,
}

impl FallbackChainBuilder {
    pub fn new(config: StatistyConfig) -> Self {
        Self {
            config,
            http_client: None,
            overrides: Vec::new(),
        }
    }

    pub fn with_http_client(mut self, http_client: Arc<dyn HttpClient>) -> Self {
        self.http_client = Some(http_client);
        self
    }

    pub fn with_air_quality_order(mut self, order: Vec<ProviderId>) -> Self {
        self.config.air_quality_order = order;
        self
    }

    pub fn with_nutrition_order(mut self, order: Vec<ProviderId>) -> Self {
        self.config.nutrition_order = order;
        self
    }

    pub fn with_entry(mut self, entry: ChainEntry) -> Self {
        self.overrides.push(entry);
        self
    }

    pub fn build(self) -> FallbackChain {
        let config = self.config;
        let http_client = self
            .http_client
            .unwrap_or_else(|| Arc::new(ReqwestHttpClient::new()));
        let timeout_ms = config.http_timeout_ms;
        let key = |provider| config.api_key(provider).map(str::to_owned);

        let mut entries = vec![
            ChainEntry::new(Arc::new(
                OpenMeteoAdapter::new(http_client.clone()).with_timeout_ms(timeout_ms),
            )),
            ChainEntry::new(Arc::new(
                OpenWeatherAdapter::new(http_client.clone(), key(ProviderId::OpenWeather))
                    .with_timeout_ms(timeout_ms),
            )),
            ChainEntry::new(Arc::new(
                WaqiAdapter::new(http_client.clone(), key(ProviderId::Waqi))
                    .with_timeout_ms(timeout_ms),
            )),
            ChainEntry::new(Arc::new(
                CalorieNinjasAdapter::new(http_client.clone(), key(ProviderId::CalorieNinjas))
                    .with_timeout_ms(timeout_ms),
            )),
            ChainEntry::new(Arc::new(
                ApiNinjasAdapter::new(http_client, key(ProviderId::ApiNinjas))
                    .with_timeout_ms(timeout_ms),
            )),
        ];
        for entry in self.overrides {
            entries.retain(|existing| existing.id() != entry.id());
            entries.push(entry);
        }

        FallbackChain::new(entries)
            .with_order(Endpoint::AirQuality, config.air_quality_order.clone())
            .with_order(Endpoint::Nutrition, config.nutrition_order.clone())
    }
}
