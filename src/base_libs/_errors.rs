use thiserror::Error;

/// Failure reported by a key-value store backend
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("quota exceeded: {requested} bytes requested, limit is {limit} bytes")]
    QuotaExceeded { requested: usize, limit: usize },

    #[error("store backend failure: {0}")]
    Backend(String),
}

/// Failure delivered through a pending write's handle
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WriteError {
    #[error("failed to serialize value for key `{key}`: {message}")]
    Serialization { key: String, message: String },

    #[error("store rejected write for key `{key}`: {source}")]
    StoreWrite { key: String, source: StoreError },

    #[error("key must be a non-empty string")]
    InvalidKey,

    #[error("pending write was dropped before it settled")]
    Abandoned,
}

impl WriteError {
    pub fn serialization(key: &str, error: &serde_json::Error) -> Self {
        WriteError::Serialization {
            key: key.to_string(),
            message: error.to_string(),
        }
    }

    pub fn store_write(key: &str, source: StoreError) -> Self {
        WriteError::StoreWrite {
            key: key.to_string(),
            source,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReadError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("stored value for key `{key}` is not valid: {message}")]
    Deserialization { key: String, message: String },
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: String,
        source: serde_json::Error,
    },

    #[error("invalid log level `{0}`")]
    InvalidLevel(String),

    #[error("failed to install logger: {0}")]
    Logger(String),
}
