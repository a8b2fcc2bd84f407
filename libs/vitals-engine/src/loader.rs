use std::path::Path;

use serde::Serialize;

use vitals_api::{TelemetryRecord, TelemetryStore};

use crate::error::EngineError;

/// Field names accepted as the record key, in lookup order.
const KEY_FIELDS: [&str; 2] = ["dateTime", "key"];

/// Outcome of loading a JSON document into a store.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct LoadReport {
    pub stored: usize,
    /// Items with no key field.
    pub missing_key: usize,
    /// Items whose payload failed to decode.
    pub rejected: usize,
}

/// Store every item of `document` (one object or an array of objects).
///
/// Items without a key or with a malformed payload are counted and
/// logged, not stored. Store failures abort the load.
pub async fn load_document(
    store: &dyn TelemetryStore,
    document: serde_json::Value,
) -> Result<LoadReport, EngineError> {
    let items = match document {
        serde_json::Value::Array(items) => items,
        obj @ serde_json::Value::Object(_) => vec![obj],
        _ => {
            return Err(EngineError::Config(
                "JSON document must be an object or an array of objects".into(),
            ));
        }
    };

    let mut report = LoadReport::default();
    for (i, item) in items.into_iter().enumerate() {
        if !KEY_FIELDS.iter().any(|f| item.get(f).is_some()) {
            tracing::warn!(index = i, "item has no dateTime key, skipping");
            report.missing_key += 1;
            continue;
        }
        let record: TelemetryRecord = match serde_json::from_value(item) {
            Ok(r) => r,
            Err(e) => {
                tracing::warn!(index = i, error = %e, "rejecting malformed item");
                report.rejected += 1;
                continue;
            }
        };
        store
            .put(record)
            .await
            .map_err(|e| EngineError::from(e).with_context(format!("item {i}")))?;
        report.stored += 1;
    }

    tracing::info!(
        stored = report.stored,
        missing_key = report.missing_key,
        rejected = report.rejected,
        "loaded records"
    );
    Ok(report)
}

/// Read a JSON file from disk and load it.
pub async fn load_file(store: &dyn TelemetryStore, path: &Path) -> Result<LoadReport, EngineError> {
    let content = std::fs::read_to_string(path).map_err(|source| EngineError::Io {
        path: path.display().to_string(),
        source,
    })?;
    let document: serde_json::Value = serde_json::from_str(&content)
        .map_err(|e| EngineError::Config(format!("{}: {e}", path.display())))?;
    load_document(store, document).await
}
