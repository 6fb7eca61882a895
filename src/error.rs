use thiserror::Error;

/// Malformed candle input
#[derive(Debug, Error, PartialEq)]
pub enum SeriesError {
    #[error("column `{column}` has {actual} values, expected {expected}")]
    LengthMismatch {
        column: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("column `{column}` has a non-finite value at index {index}")]
    NonFinite { column: &'static str, index: usize },
}

/// Failures reading or writing the weight document
#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("weight file I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("weight document serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("redis weight backend failed: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("weight store lock poisoned")]
    Poisoned,

    #[error("weight backend rejected the write: {0}")]
    Rejected(String),
}

/// Umbrella error for the engine surface
#[derive(Debug, Error)]
pub enum EngineError {
    #[error(transparent)]
    Persistence(#[from] PersistenceError),

    #[error("configuration error: {0}")]
    Config(#[from] config::ConfigError),
}
