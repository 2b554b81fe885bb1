use std::fmt::{Display, Formatter};

use statisty_store::{MetricKind, StoreError};
use thiserror::Error;

use crate::data_source::Endpoint;
use crate::routing::ChainFailure;

/// Why a single input field was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldProblem {
    Negative,
    NotNumeric,
    NotFinite,
    NotAnObject,
}

/// One offending field in a validated input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldIssue {
    pub field: String,
    pub problem: FieldProblem,
}

impl FieldIssue {
    pub fn new(field: impl Into<String>, problem: FieldProblem) -> Self {
        Self {
            field: field.into(),
            problem,
        }
    }
}

impl Display for FieldIssue {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self.problem {
            FieldProblem::Negative | FieldProblem::NotNumeric => {
                write!(f, "{} must be a non-negative number", self.field)
            }
            FieldProblem::NotFinite => write!(f, "{} must be finite", self.field),
            FieldProblem::NotAnObject => write!(f, "{} must be an object", self.field),
        }
    }
}

fn join_issues(issues: &[FieldIssue]) -> String {
    issues
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Malformed caller input. Raised before any provider call is made.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ValidationError {
    #[error("invalid source '{value}', expected one of open_meteo, openweather, waqi, calorie_ninjas, api_ninjas")]
    InvalidSource { value: String },

    #[error("{}", join_issues(.issues))]
    InvalidFields { issues: Vec<FieldIssue> },

    #[error("field '{field}' must be finite")]
    NonFiniteValue { field: &'static str },
    #[error("field '{field}' must be greater than zero")]
    NonPositiveValue { field: &'static str },

    #[error("time of day must be HH:MM within 00:00..23:59: '{value}'")]
    InvalidTimeOfDay { value: String },
    #[error("sleep quality must be between 1 and 5, got {value}")]
    InvalidSleepQuality { value: u8 },

    #[error("coordinates out of range: lat={lat}, lon={lon}")]
    InvalidCoordinates { lat: f64, lon: f64 },
    #[error("food query must not be empty")]
    EmptyQuery,

    #[error("breakpoint table is invalid: {reason}")]
    InvalidBreakpoints { reason: &'static str },
}

impl ValidationError {
    /// Names of every offending field, in input order.
    pub fn fields(&self) -> Vec<&str> {
        match self {
            Self::InvalidFields { issues } => issues.iter().map(|i| i.field.as_str()).collect(),
            Self::NonFiniteValue { field } | Self::NonPositiveValue { field } => vec![field],
            _ => Vec::new(),
        }
    }
}

/// Top-level error for acquisition and derivation requests.
#[derive(Debug, Error)]
pub enum AcquisitionError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Exhausted(#[from] ChainFailure),

    #[error("{endpoint} lookup exceeded its {deadline_ms} ms deadline")]
    DeadlineExceeded { endpoint: Endpoint, deadline_ms: u64 },

    #[error("metric store error: {0}")]
    Store(#[from] StoreError),

    #[error("stored {kind} payload is malformed: {source}")]
    Payload {
        kind: MetricKind,
        #[source]
        source: serde_json::Error,
    },
}

impl AcquisitionError {
    /// True when no provider could even be attempted for lack of credentials.
    /// Callers surface this as "feature unavailable" rather than a failure.
    pub fn is_feature_unavailable(&self) -> bool {
        match self {
            Self::Exhausted(failure) => failure.all_unconfigured(),
            _ => false,
        }
    }
}
