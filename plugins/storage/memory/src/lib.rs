use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;

use vitals_api::{
    Page, PageToken, StoreError, StoreFactory, StoreFuture, TelemetryRecord, TelemetryStore,
    page_of, validate_page_size, validate_record,
};

// ═══════════════════════════════════════════════════════════════
//  MemoryStoreConfig
// ═══════════════════════════════════════════════════════════════

fn default_page_size() -> usize {
    100
}

#[derive(Debug, serde::Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MemoryStoreConfig {
    #[serde(default = "default_page_size")]
    pub page_size: usize,
}

impl Default for MemoryStoreConfig {
    fn default() -> Self {
        Self {
            page_size: default_page_size(),
        }
    }
}

// ═══════════════════════════════════════════════════════════════
//  MemoryStore
// ═══════════════════════════════════════════════════════════════

#[derive(Default)]
struct Table {
    rows: Vec<TelemetryRecord>,
    /// key → position in `rows`.
    index: HashMap<String, usize>,
}

/// In-memory keyed table. Scans run in first-insertion order; an
/// overwrite keeps the row where it was.
pub struct MemoryStore {
    table: RwLock<Table>,
    page_size: usize,
}

impl MemoryStore {
    pub fn new(page_size: usize) -> Self {
        Self {
            table: RwLock::new(Table::default()),
            page_size: page_size.max(1),
        }
    }

    /// Number of distinct keys held.
    pub async fn len(&self) -> usize {
        self.table.read().await.rows.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new(default_page_size())
    }
}

impl TelemetryStore for MemoryStore {
    fn enumerate(&self, token: Option<PageToken>) -> StoreFuture<'_, Page> {
        Box::pin(async move {
            let table = self.table.read().await;
            page_of(&table.rows, token.as_ref(), self.page_size)
        })
    }

    fn get(&self, key: &str) -> StoreFuture<'_, Option<TelemetryRecord>> {
        let key = key.to_string();
        Box::pin(async move {
            let table = self.table.read().await;
            Ok(table.index.get(&key).map(|&i| table.rows[i].clone()))
        })
    }

    fn put(&self, record: TelemetryRecord) -> StoreFuture<'_, ()> {
        Box::pin(async move {
            validate_record(&record)?;
            let mut table = self.table.write().await;
            match table.index.get(&record.key).copied() {
                Some(i) => {
                    tracing::debug!(key = %record.key, "overwriting record");
                    table.rows[i] = record;
                }
                None => {
                    let i = table.rows.len();
                    table.index.insert(record.key.clone(), i);
                    table.rows.push(record);
                }
            }
            Ok(())
        })
    }
}

// ═══════════════════════════════════════════════════════════════
//  MemoryStoreFactory
// ═══════════════════════════════════════════════════════════════

pub struct MemoryStoreFactory;

impl StoreFactory for MemoryStoreFactory {
    fn create(&self, config_json: &str) -> Result<Arc<dyn TelemetryStore>, StoreError> {
        let config: MemoryStoreConfig = if config_json == "{}" {
            MemoryStoreConfig::default()
        } else {
            serde_json::from_str(config_json)
                .map_err(|e| StoreError::config(format!("memory store config: {e}")))?
        };
        validate_page_size(config.page_size)?;
        Ok(Arc::new(MemoryStore::new(config.page_size)))
    }
}
