use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use time::OffsetDateTime;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::error::StoreError;
use super::models::{MetricKind, MetricQuery, MetricRecord};

pub type StoreFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, StoreError>> + Send + 'a>>;

/// Durable append/query contract for raw and derived metrics.
///
/// Records are scoped to a user: operations addressing a record owned by a
/// different user behave as if the record did not exist.
pub trait MetricsStore: Send + Sync {
    /// Appends a new record stamped with the current time.
    fn save<'a>(
        &'a self,
        user_id: &'a str,
        kind: MetricKind,
        payload: serde_json::Value,
    ) -> StoreFuture<'a, MetricRecord>;

    /// Replaces the payload of an existing record and bumps `updated_at`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::RecordNotFound`] when the user owns no such record.
    fn update<'a>(
        &'a self,
        user_id: &'a str,
        record_id: Uuid,
        payload: serde_json::Value,
    ) -> StoreFuture<'a, MetricRecord>;

    /// Returns matching records. Without a range the newest come first and
    /// `limit` applies; with a range the full window is returned oldest first.
    fn query<'a>(&'a self, query: MetricQuery) -> StoreFuture<'a, Vec<MetricRecord>>;

    /// Most recent record of a kind, if any.
    fn latest<'a>(
        &'a self,
        user_id: &'a str,
        kind: MetricKind,
    ) -> StoreFuture<'a, Option<MetricRecord>>;

    /// Removes a record; `false` when nothing was deleted.
    fn delete<'a>(&'a self, user_id: &'a str, record_id: Uuid) -> StoreFuture<'a, bool>;
}

/// Process-local store backed by a vector. Suitable for tests and
/// single-instance deployments that do not need durability.
#[derive(Debug, Clone, Default)]
pub struct InMemoryMetricsStore {
    records: Arc<RwLock<Vec<MetricRecord>>>,
}

impl InMemoryMetricsStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a fully formed record, keeping its timestamps. Used for seeding.
    pub async fn insert(&self, record: MetricRecord) {
        self.records.write().await.push(record);
    }

    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }
}

impl MetricsStore for InMemoryMetricsStore {
    fn save<'a>(
        &'a self,
        user_id: &'a str,
        kind: MetricKind,
        payload: serde_json::Value,
    ) -> StoreFuture<'a, MetricRecord> {
        Box::pin(async move {
            let record = MetricRecord::new(user_id, kind, payload, OffsetDateTime::now_utc());
            self.records.write().await.push(record.clone());
            tracing::debug!(user_id, kind = %kind, id = %record.id, "metric saved");
            Ok(record)
        })
    }

    fn update<'a>(
        &'a self,
        user_id: &'a str,
        record_id: Uuid,
        payload: serde_json::Value,
    ) -> StoreFuture<'a, MetricRecord> {
        Box::pin(async move {
            let mut records = self.records.write().await;
            let record = records
                .iter_mut()
                .find(|record| record.id == record_id && record.user_id == user_id)
                .ok_or(StoreError::RecordNotFound(record_id))?;

            record.payload = payload;
            record.updated_at = Some(OffsetDateTime::now_utc());
            Ok(record.clone())
        })
    }

    fn query<'a>(&'a self, query: MetricQuery) -> StoreFuture<'a, Vec<MetricRecord>> {
        Box::pin(async move {
            let records = self.records.read().await;
            let mut matching = records
                .iter()
                .filter(|record| record.user_id == query.user_id)
                .filter(|record| query.kind.map_or(true, |kind| record.kind == kind))
                .filter(|record| {
                    query
                        .range
                        .map_or(true, |range| range.contains(record.created_at))
                })
                .cloned()
                .collect::<Vec<_>>();

            if query.range.is_some() {
                matching.sort_by(|left, right| left.created_at.cmp(&right.created_at));
            } else {
                // Later insertions win ties, matching append order.
                matching.reverse();
                matching.sort_by(|left, right| right.created_at.cmp(&left.created_at));
                matching.truncate(query.limit);
            }

            Ok(matching)
        })
    }

    fn latest<'a>(
        &'a self,
        user_id: &'a str,
        kind: MetricKind,
    ) -> StoreFuture<'a, Option<MetricRecord>> {
        Box::pin(async move {
            let newest = self
                .query(MetricQuery::for_user(user_id).with_kind(kind).with_limit(1))
                .await?;
            Ok(newest.into_iter().next())
        })
    }

    fn delete<'a>(&'a self, user_id: &'a str, record_id: Uuid) -> StoreFuture<'a, bool> {
        Box::pin(async move {
            let mut records = self.records.write().await;
            let before = records.len();
            records.retain(|record| !(record.id == record_id && record.user_id == user_id));
            Ok(records.len() < before)
        })
    }
}
