#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error("{0}")]
    Engine(#[from] vitals_engine::EngineError),

    #[error("store: {0}")]
    Store(#[from] vitals_api::StoreError),

    #[error("'{command}' is not supported by the {backend} store")]
    Unsupported { command: &'static str, backend: String },

    #[error("bpm must be a finite, non-negative number, got {0}")]
    InvalidBpm(f64),

    #[error("output: {0}")]
    Output(#[from] serde_json::Error),
}
