//! Shared types and the store contract for heart-rate telemetry.

pub mod error;
pub mod storage;
pub mod timestamp;
pub mod types;
pub mod util;

pub use error::{ErrorKind, StoreError};
pub use storage::{
    StoreFactory, StoreFuture, TelemetryStore, offset_token, page_of, parse_offset_token,
    validate_page_size, validate_record,
};
pub use timestamp::{KEY_FORMAT, TimestampError, format_key, now_key, parse_key};
pub use types::{HeartRate, Page, PageToken, TelemetryRecord};
