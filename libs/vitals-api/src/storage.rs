use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use crate::error::StoreError;
use crate::types::{Page, PageToken, TelemetryRecord};

/// Boxed future returned by store methods.
pub type StoreFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, StoreError>> + Send + 'a>>;

/// Keyed store of telemetry records.
///
/// Consumers only see this trait; they never know which backend sits
/// behind it. Enumeration order is backend-defined and carries no
/// meaning beyond being stable for an unchanged store.
pub trait TelemetryStore: Send + Sync {
    /// Prepare the backend. Called once before first use.
    fn init(&self) -> StoreFuture<'_, ()> {
        Box::pin(async { Ok(()) })
    }

    /// One page of a full scan. Pass `None` to start, then each returned
    /// `next` token until it comes back `None`.
    fn enumerate(&self, token: Option<PageToken>) -> StoreFuture<'_, Page>;

    /// Exact lookup. `Ok(None)` means the key is absent.
    fn get(&self, key: &str) -> StoreFuture<'_, Option<TelemetryRecord>>;

    /// Upsert by key.
    fn put(&self, record: TelemetryRecord) -> StoreFuture<'_, ()>;
}

/// Builds a store from a backend-specific JSON configuration object.
pub trait StoreFactory: Send + Sync {
    fn create(&self, config_json: &str) -> Result<Arc<dyn TelemetryStore>, StoreError>;
}

/// Reject records a store must never hold.
pub fn validate_record(record: &TelemetryRecord) -> Result<(), StoreError> {
    if record.key.is_empty() {
        return Err(StoreError::format_err("record key must not be empty"));
    }
    Ok(())
}

/// Decode an offset-style page token issued by [`offset_token`].
pub fn parse_offset_token(token: &PageToken) -> Result<usize, StoreError> {
    token
        .as_str()
        .parse::<usize>()
        .map_err(|_| StoreError::format_err(format!("invalid page token '{token}'")))
}

/// Offset-style page token: position of the next record in scan order.
pub fn offset_token(offset: usize) -> PageToken {
    PageToken::new(offset.to_string())
}

/// Slice `records` into the page that starts at `token`.
///
/// Shared by backends that materialize the whole table and page over it.
pub fn page_of(
    records: &[TelemetryRecord],
    token: Option<&PageToken>,
    page_size: usize,
) -> Result<Page, StoreError> {
    let start = match token {
        Some(t) => parse_offset_token(t)?,
        None => 0,
    };
    if start > records.len() {
        return Err(StoreError::format_err(format!(
            "page token {start} is past the end of the table ({} records)",
            records.len()
        )));
    }
    let end = start.saturating_add(page_size.max(1)).min(records.len());
    let next = (end < records.len()).then(|| offset_token(end));
    Ok(Page {
        records: records[start..end].to_vec(),
        next,
    })
}

/// Check a configured page size.
pub fn validate_page_size(page_size: usize) -> Result<(), StoreError> {
    if page_size == 0 {
        return Err(StoreError::config("page_size must be at least 1"));
    }
    Ok(())
}
