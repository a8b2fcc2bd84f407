//! Nearest-key lookup and windowed heart-rate aggregation over a
//! `TelemetryStore`.

pub mod aggregator;
pub mod config;
pub mod error;
pub mod loader;
pub mod locator;
pub mod stress;

pub use aggregator::{Aggregator, HeartRateSummary, TimestampPolicy, WindowOutcome, summarize};
pub use config::{StoreBackend, VitalsConfig};
pub use error::EngineError;
pub use loader::{LoadReport, load_document, load_file};
pub use locator::{DistanceMetric, Locator, Nearest};
pub use stress::StressLevel;
