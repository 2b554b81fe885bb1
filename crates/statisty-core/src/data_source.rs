//! Provider adapter contract and the request/error types shared by every
//! adapter.
//!
//! # Endpoints
//!
//! | Endpoint | Request | Response |
//! |----------|---------|----------|
//! | Air quality | [`AirQualityRequest`] | [`AirQuality`] |
//! | Nutrition | [`NutritionRequest`] | [`NutritionBatch`] |
//!
//! Every adapter converts its provider's failure shapes into a
//! [`SourceError`] before returning; nothing provider-specific crosses this
//! boundary.

use std::fmt::{Display, Formatter};
use std::future::Future;
use std::pin::Pin;

use serde::{Deserialize, Serialize};

use crate::{AirQuality, NutritionBatch, ProviderId, ValidationError};

pub type SourceFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, SourceError>> + Send + 'a>>;

/// Data endpoint used for routing and capability checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Endpoint {
    AirQuality,
    Nutrition,
}

impl Endpoint {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::AirQuality => "air_quality",
            Self::Nutrition => "nutrition",
        }
    }
}

impl Display for Endpoint {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Supported endpoint matrix for a data source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CapabilitySet {
    pub air_quality: bool,
    pub nutrition: bool,
}

impl CapabilitySet {
    pub const fn new(air_quality: bool, nutrition: bool) -> Self {
        Self {
            air_quality,
            nutrition,
        }
    }

    pub const fn air_quality_only() -> Self {
        Self::new(true, false)
    }

    pub const fn nutrition_only() -> Self {
        Self::new(false, true)
    }

    pub const fn supports(self, endpoint: Endpoint) -> bool {
        match endpoint {
            Endpoint::AirQuality => self.air_quality,
            Endpoint::Nutrition => self.nutrition,
        }
    }
}

/// How a reachable provider failed to deliver a usable payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseFailure {
    /// HTTP 404 or an explicit provider "not found" signal.
    NotFound,
    /// Any other non-success HTTP status.
    Status(u16),
    /// Body could not be decoded or had an unexpected shape.
    Malformed,
    /// Well-formed reply that carried no data (e.g. an empty result list).
    NoData,
    /// Provider reported an error inside an otherwise successful reply.
    Rejected,
}

/// Adapter-level error classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceErrorKind {
    /// Required credential absent. Never retryable.
    Configuration,
    /// The call itself could not complete (connect, timeout, body read).
    Transport,
    /// The provider answered but the answer is unusable.
    Response(ResponseFailure),
    UnsupportedEndpoint,
}

/// Structured source error consumed by the fallback chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceError {
    kind: SourceErrorKind,
    message: String,
    retryable: bool,
}

impl SourceError {
    pub fn configuration(provider: ProviderId) -> Self {
        Self {
            kind: SourceErrorKind::Configuration,
            message: format!("provider '{provider}' has no credential configured"),
            retryable: false,
        }
    }

    pub fn transport(message: impl Into<String>) -> Self {
        Self {
            kind: SourceErrorKind::Transport,
            message: message.into(),
            retryable: true,
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::response(ResponseFailure::NotFound, message)
    }

    pub fn bad_status(status: u16, message: impl Into<String>) -> Self {
        Self::response(ResponseFailure::Status(status), message)
    }

    pub fn malformed(message: impl Into<String>) -> Self {
        Self::response(ResponseFailure::Malformed, message)
    }

    pub fn no_data(message: impl Into<String>) -> Self {
        Self::response(ResponseFailure::NoData, message)
    }

    pub fn rejected(message: impl Into<String>) -> Self {
        Self::response(ResponseFailure::Rejected, message)
    }

    pub fn unsupported_endpoint(endpoint: Endpoint) -> Self {
        Self {
            kind: SourceErrorKind::UnsupportedEndpoint,
            message: format!("endpoint '{endpoint}' is not supported by this source"),
            retryable: false,
        }
    }

    fn response(failure: ResponseFailure, message: impl Into<String>) -> Self {
        Self {
            kind: SourceErrorKind::Response(failure),
            message: message.into(),
            retryable: true,
        }
    }

    pub const fn kind(&self) -> SourceErrorKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// Whether moving on to another provider may help.
    pub const fn retryable(&self) -> bool {
        self.retryable
    }

    pub const fn code(&self) -> &'static str {
        match self.kind {
            SourceErrorKind::Configuration => "source.configuration",
            SourceErrorKind::Transport => "source.transport",
            SourceErrorKind::Response(ResponseFailure::NotFound) => "source.not_found",
            SourceErrorKind::Response(ResponseFailure::Status(_)) => "source.bad_status",
            SourceErrorKind::Response(ResponseFailure::Malformed) => "source.malformed",
            SourceErrorKind::Response(ResponseFailure::NoData) => "source.no_data",
            SourceErrorKind::Response(ResponseFailure::Rejected) => "source.rejected",
            SourceErrorKind::UnsupportedEndpoint => "source.unsupported_endpoint",
        }
    }
}

impl Display for SourceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.message, self.code())
    }
}

impl std::error::Error for SourceError {}

/// Location for an air quality lookup.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AirQualityRequest {
    pub lat: f64,
    pub lon: f64,
}

impl AirQualityRequest {
    pub fn new(lat: f64, lon: f64) -> Result<Self, ValidationError> {
        let valid = lat.is_finite()
            && lon.is_finite()
            && (-90.0..=90.0).contains(&lat)
            && (-180.0..=180.0).contains(&lon);
        if !valid {
            return Err(ValidationError::InvalidCoordinates { lat, lon });
        }
        Ok(Self { lat, lon })
    }

    /// Cache key with coordinates rounded to two decimals (~1 km).
    pub fn cache_key(&self) -> String {
        format!("{:.2},{:.2}", self.lat, self.lon)
    }
}

/// Free-text food lookup such as `"1 apple and 200g rice"`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NutritionRequest {
    pub query: String,
}

impl NutritionRequest {
    pub fn new(query: impl Into<String>) -> Result<Self, ValidationError> {
        let query = query.into().trim().to_owned();
        if query.is_empty() {
            return Err(ValidationError::EmptyQuery);
        }
        Ok(Self { query })
    }

    pub fn cache_key(&self) -> String {
        self.query.to_lowercase()
    }
}

/// Source adapter contract.
///
/// One implementation per external provider. Endpoints an adapter does not
/// serve keep the default `unsupported_endpoint` body.
pub trait DataSource: Send + Sync {
    /// Returns the unique provider identifier.
    fn id(&self) -> ProviderId;

    /// Returns the set of supported endpoints.
    fn capabilities(&self) -> CapabilitySet;

    /// Whether the credential this provider needs is present.
    fn is_configured(&self) -> bool;

    /// Fetches current pollutant concentrations near a location.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError`] if the credential is missing, the call fails,
    /// or the provider reply cannot be normalized.
    fn air_quality<'a>(&'a self, req: AirQualityRequest) -> SourceFuture<'a, AirQuality> {
        let _ = req;
        Box::pin(async { Err(SourceError::unsupported_endpoint(Endpoint::AirQuality)) })
    }

    /// Looks up nutrition facts for a free-text food query.
    fn nutrition<'a>(&'a self, req: NutritionRequest) -> SourceFuture<'a, NutritionBatch> {
        let _ = req;
        Box::pin(async { Err(SourceError::unsupported_endpoint(Endpoint::Nutrition)) })
    }
}

/// Semantic check applied by the chain on top of a successful fetch.
pub trait Usable {
    fn is_usable(&self) -> bool;
}

impl Usable for AirQuality {
    fn is_usable(&self) -> bool {
        self.aqi.is_some()
    }
}

impl Usable for NutritionBatch {
    fn is_usable(&self) -> bool {
        !self.items.is_empty()
    }
}
