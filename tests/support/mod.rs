//! Test doubles shared by the integration tests.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tracing_subscriber::EnvFilter;

use statisty_core::{
    AirQuality, AirQualityRequest, CapabilitySet, DataSource, HttpClient, HttpError, HttpRequest,
    HttpResponse, NutritionBatch, NutritionItem, NutritionRequest, ProviderId, SourceError,
    SourceFuture,
};

/// Routes chain logs to the test writer. `RUST_LOG` overrides the default
/// `statisty_core=debug` filter.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("statisty_core=debug"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_test_writer()
        .try_init();
}

/// Replays canned HTTP responses in order and records every request.
#[derive(Debug, Default)]
pub struct ScriptedHttpClient {
    responses: Mutex<VecDeque<Result<HttpResponse, HttpError>>>,
    requests: Mutex<Vec<HttpRequest>>,
}

impl ScriptedHttpClient {
    pub fn with(responses: Vec<Result<HttpResponse, HttpError>>) -> Arc<Self> {
        Arc::new(Self {
            responses: Mutex::new(responses.into()),
            requests: Mutex::new(Vec::new()),
        })
    }

    pub fn json(body: &str) -> Arc<Self> {
        Self::with(vec![Ok(HttpResponse::ok_json(body))])
    }

    pub fn requests(&self) -> Vec<HttpRequest> {
        self.requests.lock().expect("requests lock").clone()
    }
}

impl HttpClient for ScriptedHttpClient {
    fn execute<'a>(
        &'a self,
        request: HttpRequest,
    ) -> Pin<Box<dyn Future<Output = Result<HttpResponse, HttpError>> + Send + 'a>> {
        self.requests.lock().expect("requests lock").push(request);
        let response = self
            .responses
            .lock()
            .expect("responses lock")
            .pop_front()
            .unwrap_or_else(|| Err(HttpError::new("no scripted response left")));
        Box::pin(async move { response })
    }
}

/// Outcome a [`ScriptedSource`] returns for each call, in order. The last
/// outcome repeats once the script runs out.
#[derive(Debug, Clone)]
pub enum Outcome {
    Aqi(Option<u32>),
    Items(Vec<&'static str>),
    Fail(SourceError),
}

/// Provider double with a scripted outcome sequence and a call counter.
pub struct ScriptedSource {
    id: ProviderId,
    capabilities: CapabilitySet,
    configured: bool,
    delay: Option<Duration>,
    script: Mutex<VecDeque<Outcome>>,
    last: Mutex<Option<Outcome>>,
    calls: AtomicUsize,
}

impl ScriptedSource {
    pub fn air(id: ProviderId, script: Vec<Outcome>) -> Self {
        Self::new(id, CapabilitySet::air_quality_only(), script)
    }

    pub fn nutrition(id: ProviderId, script: Vec<Outcome>) -> Self {
        Self::new(id, CapabilitySet::nutrition_only(), script)
    }

    fn new(id: ProviderId, capabilities: CapabilitySet, script: Vec<Outcome>) -> Self {
        Self {
            id,
            capabilities,
            configured: true,
            delay: None,
            script: Mutex::new(script.into()),
            last: Mutex::new(None),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn unconfigured(mut self) -> Self {
        self.configured = false;
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn next_outcome(&self) -> Outcome {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let mut last = self.last.lock().expect("last lock");
        match self.script.lock().expect("script lock").pop_front() {
            Some(outcome) => {
                *last = Some(outcome.clone());
                outcome
            }
            None => last
                .clone()
                .unwrap_or_else(|| Outcome::Fail(SourceError::transport("script is empty"))),
        }
    }

    fn respond<T: Send + 'static>(
        &self,
        convert: impl FnOnce(Outcome) -> Result<T, SourceError>,
    ) -> SourceFuture<'_, T> {
        let result = convert(self.next_outcome());
        let delay = self.delay;
        Box::pin(async move {
            if let Some(delay) = delay {
                tokio::time::sleep(delay).await;
            }
            result
        })
    }
}

impl DataSource for ScriptedSource {
    fn id(&self) -> ProviderId {
        self.id
    }

    fn capabilities(&self) -> CapabilitySet {
        self.capabilities
    }

    fn is_configured(&self) -> bool {
        self.configured
    }

    fn air_quality<'a>(&'a self, _req: AirQualityRequest) -> SourceFuture<'a, AirQuality> {
        let id = self.id;
        self.respond(move |outcome| match outcome {
            Outcome::Aqi(aqi) => Ok(AirQuality {
                aqi,
                pm2_5: 10.0,
                ..AirQuality::empty(id)
            }),
            Outcome::Items(_) => Ok(AirQuality::empty(id)),
            Outcome::Fail(error) => Err(error),
        })
    }

    fn nutrition<'a>(&'a self, req: NutritionRequest) -> SourceFuture<'a, NutritionBatch> {
        let id = self.id;
        self.respond(move |outcome| match outcome {
            Outcome::Items(names) => Ok(NutritionBatch {
                query: req.query,
                items: names
                    .into_iter()
                    .map(|name| NutritionItem {
                        name: name.to_owned(),
                        calories: 100.0,
                        ..NutritionItem::default()
                    })
                    .collect(),
                source: id,
            }),
            Outcome::Aqi(_) => Ok(NutritionBatch {
                query: req.query,
                items: Vec::new(),
                source: id,
            }),
            Outcome::Fail(error) => Err(error),
        })
    }
}
