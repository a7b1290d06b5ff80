use crate::pointer::PointerScheme;

/// Errors raised by the blob transport behind an [`ObjectStore`](crate::ObjectStore).
///
/// This is the infrastructure error of the store layer: a blob transport can
/// only report a missing object or an unreachable backend.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ObjectStoreError {
    #[error("object not found: {bucket}/{key}")]
    NotFound { bucket: String, key: String },

    #[error("object store unavailable: {0}")]
    Unavailable(String),
}

/// Errors raised by a [`PayloadStore`](crate::PayloadStore) and by pointer parsing.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PayloadError {
    #[error("malformed payload pointer: {0}")]
    MalformedPointer(String),

    #[error("payload not found: {0}")]
    NotFound(String),

    #[error("payload store unavailable: {0}")]
    StoreUnavailable(String),

    #[error("payload store handles {expected} pointers, received {actual} pointer")]
    TypeMismatch {
        expected: PointerScheme,
        actual: PointerScheme,
    },
}

impl From<ObjectStoreError> for PayloadError {
    fn from(err: ObjectStoreError) -> Self {
        match err {
            ObjectStoreError::NotFound { bucket, key } => {
                PayloadError::NotFound(format!("{bucket}/{key}"))
            }
            ObjectStoreError::Unavailable(msg) => PayloadError::StoreUnavailable(msg),
        }
    }
}

/// Errors raised while reading an [`OffloadConfig`](crate::OffloadConfig).
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid config syntax: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid config value: {0}")]
    InvalidValue(String),
}

pub type ObjectStoreResult<T> = std::result::Result<T, ObjectStoreError>;
pub type PayloadResult<T> = std::result::Result<T, PayloadError>;
