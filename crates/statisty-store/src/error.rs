use thiserror::Error;
use uuid::Uuid;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("Record not found: {0}")]
    RecordNotFound(Uuid),

    #[error("Unknown metric kind: {0}")]
    UnknownKind(String),

    #[error("Range start must not be after range end")]
    InvalidRange,

    #[error("Storage backend error: {0}")]
    Backend(String),
}
