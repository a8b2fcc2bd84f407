use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::timestamp::{TimestampError, parse_key};
use crate::util::de_number;

// ════════════════════════════════════════════════════════════════
//  HeartRate
// ════════════════════════════════════════════════════════════════

/// Payload of one heart-rate sample.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct HeartRate {
    /// Beats per minute.
    #[serde(deserialize_with = "de_number")]
    pub bpm: f64,
    /// Sensor confidence reported alongside the reading.
    #[serde(deserialize_with = "de_number")]
    pub confidence: f64,
}

// ════════════════════════════════════════════════════════════════
//  TelemetryRecord
// ════════════════════════════════════════════════════════════════

/// One stored sample, keyed by its `MM/DD/YY HH:MM:SS` timestamp.
///
/// The key is unique within a store; writing an existing key replaces
/// the whole record.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TelemetryRecord {
    #[serde(rename = "dateTime", alias = "key")]
    pub key: String,
    pub value: HeartRate,
}

impl TelemetryRecord {
    pub fn new(key: impl Into<String>, bpm: f64, confidence: f64) -> Self {
        Self {
            key: key.into(),
            value: HeartRate { bpm, confidence },
        }
    }

    /// Parse the key into an instant.
    pub fn instant(&self) -> Result<NaiveDateTime, TimestampError> {
        parse_key(&self.key)
    }

    /// First character of the key, if any.
    pub fn lead_char(&self) -> Option<char> {
        self.key.chars().next()
    }
}

// ════════════════════════════════════════════════════════════════
//  Pagination
// ════════════════════════════════════════════════════════════════

/// Opaque continuation token returned by `TelemetryStore::enumerate`.
///
/// Only the store that issued it knows how to read it.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PageToken(String);

impl PageToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for PageToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// One page of a full scan. `next = None` means the scan is exhausted.
#[derive(Clone, Debug, Default)]
pub struct Page {
    pub records: Vec<TelemetryRecord>,
    pub next: Option<PageToken>,
}
