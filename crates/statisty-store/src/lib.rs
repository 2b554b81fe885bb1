//! # Statisty Store
//!
//! Storage contract for metric records.
//!
//! The acquisition and derivation engine in `statisty-core` depends only on
//! the [`MetricsStore`] trait; any backend that can append, query by user,
//! kind and creation window, and delete records can sit behind it.
//! [`InMemoryMetricsStore`] is the process-local implementation used by tests
//! and single-instance deployments.
//!
//! ## Ordering
//!
//! | Query | Order |
//! |-------|-------|
//! | no range | newest first, truncated to `limit` |
//! | with range | oldest first, whole window |

mod error;
mod models;
mod repository;

pub use error::StoreError;
pub use models::{DateRange, MetricKind, MetricQuery, MetricRecord};
pub use repository::{InMemoryMetricsStore, MetricsStore, StoreFuture};
