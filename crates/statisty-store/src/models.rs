use std::fmt::{Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::StoreError;

/// Kind of metric a record carries. Selects the calculator (and, for air
/// quality, the acquisition path) used on its payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricKind {
    Bmi,
    Sleep,
    Hydration,
    Nutrition,
    Carbon,
    AirQuality,
}

impl MetricKind {
    pub const ALL: [Self; 6] = [
        Self::Bmi,
        Self::Sleep,
        Self::Hydration,
        Self::Nutrition,
        Self::Carbon,
        Self::AirQuality,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Bmi => "bmi",
            Self::Sleep => "sleep",
            Self::Hydration => "hydration",
            Self::Nutrition => "nutrition",
            Self::Carbon => "carbon",
            Self::AirQuality => "air_quality",
        }
    }
}

impl Display for MetricKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MetricKind {
    type Err = StoreError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "bmi" => Ok(Self::Bmi),
            "sleep" => Ok(Self::Sleep),
            "hydration" => Ok(Self::Hydration),
            "nutrition" => Ok(Self::Nutrition),
            "carbon" => Ok(Self::Carbon),
            "air_quality" | "airquality" => Ok(Self::AirQuality),
            other => Err(StoreError::UnknownKind(other.to_owned())),
        }
    }
}

/// Stored metric. The payload is opaque to the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricRecord {
    pub id: Uuid,
    pub user_id: String,
    pub kind: MetricKind,
    pub payload: serde_json::Value,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub updated_at: Option<OffsetDateTime>,
}

impl MetricRecord {
    pub fn new(
        user_id: impl Into<String>,
        kind: MetricKind,
        payload: serde_json::Value,
        created_at: OffsetDateTime,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id: user_id.into(),
            kind,
            payload,
            created_at,
            updated_at: None,
        }
    }
}

/// Inclusive creation-time window for range queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub from: OffsetDateTime,
    pub to: OffsetDateTime,
}

impl DateRange {
    pub fn new(from: OffsetDateTime, to: OffsetDateTime) -> Result<Self, StoreError> {
        if from > to {
            return Err(StoreError::InvalidRange);
        }
        Ok(Self { from, to })
    }

    pub fn contains(&self, instant: OffsetDateTime) -> bool {
        instant >= self.from && instant <= self.to
    }
}

/// Filter accepted by [`MetricsStore::query`](crate::MetricsStore::query).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetricQuery {
    pub user_id: String,
    pub kind: Option<MetricKind>,
    pub range: Option<DateRange>,
    pub limit: usize,
}

impl MetricQuery {
    pub const DEFAULT_LIMIT: usize = 50;

    pub fn for_user(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            kind: None,
            range: None,
            limit: Self::DEFAULT_LIMIT,
        }
    }

    pub fn with_kind(mut self, kind: MetricKind) -> Self {
        self.kind = Some(kind);
        self
    }

    pub fn with_range(mut self, range: DateRange) -> Self {
        self.range = Some(range);
        self
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    #[test]
    fn kind_round_trips_through_str() {
        for kind in MetricKind::ALL {
            assert_eq!(kind.as_str().parse::<MetricKind>().expect("known kind"), kind);
        }
        assert!(matches!(
            "weather".parse::<MetricKind>(),
            Err(StoreError::UnknownKind(_))
        ));
    }

    #[test]
    fn kind_serializes_snake_case() {
        let json = serde_json::to_string(&MetricKind::AirQuality).expect("serializable");
        assert_eq!(json, "\"air_quality\"");
    }

    #[test]
    fn range_rejects_inverted_bounds() {
        let err = DateRange::new(datetime!(2024-02-01 0:00 UTC), datetime!(2024-01-01 0:00 UTC))
            .expect_err("inverted range");
        assert!(matches!(err, StoreError::InvalidRange));
    }
}
