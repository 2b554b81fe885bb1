//! # Statisty Core
//!
//! Resilient acquisition and derivation engine for personal health and
//! environment metrics.
//!
//! ## Overview
//!
//! - **Provider adapters** for air quality and nutrition lookups
//! - **Fallback chain** that tries providers in a configured order
//! - **Sliding-window rate limiter** per provider with a quota
//! - **TTL cache** with single-flight misses per key
//! - **AQI interpolation** over US EPA breakpoint tables
//! - **Metric calculators** for sleep, hydration, nutrition, carbon and BMI
//!
//! ## Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`adapters`] | Provider adapters (Open-Meteo, OpenWeather, WAQI, CalorieNinjas, API Ninjas) |
//! | [`aqi`] | Breakpoint tables, interpolation, categories |
//! | [`cache`] | Keyed TTL cache |
//! | [`config`] | Environment configuration |
//! | [`data_source`] | Adapter trait, requests, source errors |
//! | [`domain`] | Readings and user-entered records |
//! | [`error`] | Validation and acquisition errors |
//! | [`http_client`] | HTTP client abstraction |
//! | [`metrics`] | Pure metric calculators |
//! | [`provider_policy`] | Per-provider quota defaults |
//! | [`rate_limiter`] | Sliding-window limiter |
//! | [`routing`] | Fallback chain |
//! | [`service`] | Caller-facing acquisition service |
//! | [`source`] | Provider identifiers |
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use statisty_core::{InMemoryMetricsStore, MetricsService, StatistyConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = StatistyConfig::from_env()?;
//!     let service = MetricsService::from_config(config, InMemoryMetricsStore::new());
//!
//!     let report = service.air_quality(52.52, 13.40).await?;
//!     println!("AQI {:?} ({:?})", report.reading.aqi, report.category);
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────┐
//! │ MetricsService  │──────────────────────────┐
//! └────────┬────────┘                          │
//!          │                                   ▼
//!          ▼                          ┌──────────────────┐
//! ┌─────────────────┐                 │ MetricsStore     │
//! │ TtlCache        │                 │ + calculators    │
//! └────────┬────────┘                 └──────────────────┘
//!          ▼
//! ┌─────────────────┐     ┌──────────────────┐
//! │ FallbackChain   │────▶│ DataSource       │
//! └─────────────────┘     │ (adapter trait)  │
//!                         └────────┬─────────┘
//!                                  ▼
//!                         ┌──────────────────┐
//!                         │ RateLimiter      │
//!                         │ HttpClient       │
//!                         └──────────────────┘
//! ```
//!
//! ## Security
//!
//! - API keys come from the environment only and are never logged
//! - All HTTP requests use TLS via rustls

pub mod adapters;
pub mod aqi;
pub mod cache;
pub mod config;
pub mod data_source;
pub mod domain;
pub mod error;
pub mod http_client;
pub mod metrics;
pub mod provider_policy;
pub mod rate_limiter;
pub mod routing;
pub mod service;
pub mod source;

// Adapter implementations
pub use adapters::{
    ApiNinjasAdapter, CalorieNinjasAdapter, OpenMeteoAdapter, OpenWeatherAdapter, WaqiAdapter,
};

// AQI
pub use aqi::{interpolate, AirQualityReport, AqiCategory, Breakpoint, BreakpointTable};

// Caching
pub use cache::{CacheMode, TtlCache};

// Configuration
pub use config::{ConfigError, StatistyConfig};

// Data source trait and types
pub use data_source::{
    AirQualityRequest, CapabilitySet, DataSource, Endpoint, NutritionRequest, ResponseFailure,
    SourceError, SourceErrorKind, SourceFuture, Usable,
};

// Domain models
pub use domain::{
    AirQuality, BodyMeasurement, DrinkKind, HydrationEntry, NutritionBatch, NutritionItem,
    SleepEntry, TimeOfDay,
};

// Error types
pub use error::{AcquisitionError, FieldIssue, FieldProblem, ValidationError};

// HTTP client types
pub use http_client::{HttpAuth, HttpClient, HttpError, HttpRequest, HttpResponse, ReqwestHttpClient};

// Provider policies and limiting
pub use provider_policy::ProviderPolicy;
pub use rate_limiter::RateLimiter;

// Routing types
pub use routing::{
    ChainEntry, ChainFailure, ChainResult, ChainSuccess, FailureReason, FallbackChain,
    FallbackChainBuilder, ProviderFailure, SourceStrategy,
};

// Service
pub use service::{DerivationSettings, DerivedMetric, MetricsService};

// Source identifiers
pub use source::{parse_provider_list, ProviderId};

// Store (re-exported from statisty-store)
pub use statisty_store::{
    DateRange, InMemoryMetricsStore, MetricKind, MetricQuery, MetricRecord, MetricsStore,
    StoreError, StoreFuture,
};
