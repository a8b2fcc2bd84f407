use vitals_api::{StoreError, TimestampError};

#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("config error: {0}")]
    Config(String),

    #[error("store error: {0}")]
    Store(#[from] StoreError),

    #[error(transparent)]
    Timestamp(#[from] TimestampError),

    #[error("target key must not be empty")]
    EmptyTarget,

    #[error("io error: {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

impl EngineError {
    /// Add context to the error.
    ///
    /// For `Store`, context goes onto the inner `StoreError` so its kind
    /// survives. `Config` gets it prepended; other variants pass through.
    pub fn with_context(self, ctx: impl std::fmt::Display) -> Self {
        match self {
            EngineError::Store(e) => EngineError::Store(e.with_context(ctx)),
            EngineError::Config(msg) => EngineError::Config(format!("{ctx}: {msg}")),
            other => other,
        }
    }
}
