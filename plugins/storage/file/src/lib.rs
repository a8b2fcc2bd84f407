mod config;
mod storage;

use std::sync::Arc;

use vitals_api::{StoreError, StoreFactory, TelemetryStore, validate_page_size};

pub use config::FileStoreConfig;
pub use storage::FileStore;

// ════════════════════════════════════════════════════════════════
//  Factory
// ════════════════════════════════════════════════════════════════

pub struct FileStoreFactory;

impl FileStoreFactory {
    /// Parse and validate a JSON configuration object.
    pub fn parse_config(config_json: &str) -> Result<FileStoreConfig, StoreError> {
        let cfg: FileStoreConfig = serde_json::from_str(config_json)
            .map_err(|e| StoreError::config(format!("file store config: {e}")))?;
        if cfg.table.is_empty() || cfg.table.contains(['/', '\\']) || cfg.table.starts_with('.') {
            return Err(StoreError::config(format!("invalid table name '{}'", cfg.table)));
        }
        validate_page_size(cfg.page_size)?;
        Ok(cfg)
    }

    /// Build the concrete store (callers that need `compact`).
    pub fn open(config_json: &str) -> Result<FileStore, StoreError> {
        let cfg = Self::parse_config(config_json)?;
        Ok(FileStore::new(&cfg.data_dir, &cfg.table, cfg.page_size))
    }
}

impl StoreFactory for FileStoreFactory {
    fn create(&self, config_json: &str) -> Result<Arc<dyn TelemetryStore>, StoreError> {
        Ok(Arc::new(Self::open(config_json)?))
    }
}
