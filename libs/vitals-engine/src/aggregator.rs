use std::sync::Arc;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use vitals_api::{PageToken, TelemetryRecord, TelemetryStore, format_key, parse_key};

use crate::error::EngineError;
use crate::stress::StressLevel;

/// Default length of the "current" window.
pub const DEFAULT_WINDOW_SECONDS: u64 = 10;

/// What to do with a record whose key is not a valid timestamp.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimestampPolicy {
    /// Fail the whole batch on the first bad key.
    #[default]
    Abort,
    /// Leave the record out and count it.
    Skip,
}

/// Averages over the records inside the window.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HeartRateSummary {
    pub average_bpm: f64,
    pub average_confidence: f64,
    pub stress_label: StressLevel,
    pub window_seconds: u64,
    pub sample_count: usize,
    /// Reference instant the window ends at, in key form.
    pub anchor: String,
    /// Records left out under `TimestampPolicy::Skip`.
    pub skipped: usize,
}

/// Result of aggregating a batch.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum WindowOutcome {
    /// Nothing with a usable timestamp at all.
    NoData { skipped: usize },
    /// Data exists but none of it falls in the window.
    EmptyWindow {
        window_seconds: u64,
        anchor: String,
        skipped: usize,
    },
    Summary(HeartRateSummary),
}

/// Aggregate `records` over the `window_seconds` ending at the anchor.
///
/// The anchor is `as_of` when given, otherwise the latest parsed key.
/// A record qualifies when `0 <= anchor - t <= window_seconds`.
pub fn summarize(
    records: &[TelemetryRecord],
    window_seconds: u64,
    as_of: Option<NaiveDateTime>,
    policy: TimestampPolicy,
) -> Result<WindowOutcome, EngineError> {
    let mut parsed = Vec::with_capacity(records.len());
    let mut skipped = 0usize;
    for record in records {
        match record.instant() {
            Ok(t) => parsed.push((t, record)),
            Err(e) => match policy {
                TimestampPolicy::Abort => return Err(e.into()),
                TimestampPolicy::Skip => {
                    tracing::warn!(key = %record.key, "skipping record with malformed timestamp");
                    skipped += 1;
                }
            },
        }
    }

    let anchor = match as_of.or_else(|| parsed.iter().map(|(t, _)| *t).max()) {
        Some(a) if !parsed.is_empty() => a,
        _ => return Ok(WindowOutcome::NoData { skipped }),
    };

    let window = i64::try_from(window_seconds).unwrap_or(i64::MAX);
    let in_window: Vec<&TelemetryRecord> = parsed
        .iter()
        .filter(|(t, _)| {
            let age = (anchor - *t).num_seconds();
            (0..=window).contains(&age)
        })
        .map(|(_, r)| *r)
        .collect();

    if in_window.is_empty() {
        return Ok(WindowOutcome::EmptyWindow {
            window_seconds,
            anchor: format_key(&anchor),
            skipped,
        });
    }

    let n = in_window.len() as f64;
    let average_bpm = in_window.iter().map(|r| r.value.bpm).sum::<f64>() / n;
    let average_confidence = in_window.iter().map(|r| r.value.confidence).sum::<f64>() / n;

    Ok(WindowOutcome::Summary(HeartRateSummary {
        average_bpm,
        average_confidence,
        stress_label: StressLevel::from_bpm(average_bpm),
        window_seconds,
        sample_count: in_window.len(),
        anchor: format_key(&anchor),
        skipped,
    }))
}

/// Computes the current heart-rate summary from everything in a store.
pub struct Aggregator {
    store: Arc<dyn TelemetryStore>,
    policy: TimestampPolicy,
}

impl Aggregator {
    pub fn new(store: Arc<dyn TelemetryStore>, policy: TimestampPolicy) -> Self {
        Self { store, policy }
    }

    /// Full scan of the store, page by page.
    pub async fn collect(&self) -> Result<Vec<TelemetryRecord>, EngineError> {
        let mut all = Vec::new();
        let mut token: Option<PageToken> = None;
        loop {
            let page = self
                .store
                .enumerate(token.take())
                .await
                .map_err(|e| EngineError::from(e).with_context("aggregate"))?;
            all.extend(page.records);
            match page.next {
                Some(next) => token = Some(next),
                None => return Ok(all),
            }
        }
    }

    /// Summarize the window ending at `as_of` (a record key), or at the
    /// latest record when `as_of` is `None`.
    pub async fn aggregate(
        &self,
        window_seconds: u64,
        as_of: Option<&str>,
    ) -> Result<WindowOutcome, EngineError> {
        let as_of = as_of.map(parse_key).transpose()?;
        let records = self.collect().await?;
        let outcome = summarize(&records, window_seconds, as_of, self.policy)?;
        match &outcome {
            WindowOutcome::Summary(s) => tracing::info!(
                window_seconds,
                samples = s.sample_count,
                average_bpm = s.average_bpm,
                stress = %s.stress_label,
                "heart rate aggregated"
            ),
            WindowOutcome::EmptyWindow { anchor, .. } => {
                tracing::info!(window_seconds, anchor = %anchor, "no data in window")
            }
            WindowOutcome::NoData { skipped } => {
                tracing::info!(records = records.len(), skipped, "no heart rate data")
            }
        }
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vitals_storage_memory::MemoryStore;

    fn rec(key: &str, bpm: f64, confidence: f64) -> TelemetryRecord {
        TelemetryRecord::new(key, bpm, confidence)
    }

    fn pair() -> Vec<TelemetryRecord> {
        vec![rec("01/31/25 10:00:00", 70.0, 0.8), rec("01/31/25 10:00:05", 90.0, 0.6)]
    }

    fn summary(outcome: WindowOutcome) -> HeartRateSummary {
        match outcome {
            WindowOutcome::Summary(s) => s,
            other => panic!("expected summary, got {other:?}"),
        }
    }

    #[test]
    fn both_records_in_wide_window() {
        let s = summary(summarize(&pair(), 10, None, TimestampPolicy::Abort).unwrap());
        assert_eq!(s.anchor, "01/31/25 10:00:05");
        assert_eq!(s.sample_count, 2);
        assert_eq!(s.average_bpm, 80.0);
        assert!((s.average_confidence - 0.7).abs() < 1e-9);
        assert_eq!(s.stress_label, StressLevel::High);
    }

    #[test]
    fn narrow_window_keeps_only_latest() {
        let s = summary(summarize(&pair(), 2, None, TimestampPolicy::Abort).unwrap());
        assert_eq!(s.sample_count, 1);
        assert_eq!(s.average_bpm, 90.0);
        assert_eq!(s.average_confidence, 0.6);
        assert_eq!(s.stress_label, StressLevel::High);
    }

    #[test]
    fn moderate_mean_below_eighty() {
        let records = vec![rec("01/31/25 10:00:00", 70.0, 1.0), rec("01/31/25 10:00:05", 88.0, 1.0)];
        let s = summary(summarize(&records, 10, None, TimestampPolicy::Abort).unwrap());
        assert_eq!(s.average_bpm, 79.0);
        assert_eq!(s.stress_label, StressLevel::Moderate);
    }

    #[test]
    fn window_edge_is_inclusive() {
        let s = summary(summarize(&pair(), 5, None, TimestampPolicy::Abort).unwrap());
        assert_eq!(s.sample_count, 2);
        let s = summary(summarize(&pair(), 4, None, TimestampPolicy::Abort).unwrap());
        assert_eq!(s.sample_count, 1);
    }

    #[test]
    fn shared_timestamp_averages_everything() {
        let records: Vec<_> = [55.0, 65.0, 75.0, 45.0]
            .iter()
            .enumerate()
            .map(|(i, bpm)| rec("01/31/25 10:00:00", *bpm, 0.1 * (i + 1) as f64))
            .collect();
        let s = summary(summarize(&records, 10, None, TimestampPolicy::Abort).unwrap());
        assert_eq!(s.sample_count, records.len());
        assert_eq!(s.average_bpm, 60.0);
        assert!((s.average_confidence - 0.25).abs() < 1e-9);
    }

    #[test]
    fn single_recent_record_is_its_own_average() {
        let records = vec![
            rec("01/31/25 09:00:00", 50.0, 0.2),
            rec("01/31/25 09:30:00", 55.0, 0.3),
            rec("01/31/25 10:00:00", 101.0, 0.95),
        ];
        let s = summary(summarize(&records, 10, None, TimestampPolicy::Abort).unwrap());
        assert_eq!(s.sample_count, 1);
        assert_eq!(s.average_bpm, 101.0);
        assert_eq!(s.average_confidence, 0.95);
    }

    #[test]
    fn no_records_is_no_data() {
        let out = summarize(&[], 10, None, TimestampPolicy::Abort).unwrap();
        assert_eq!(out, WindowOutcome::NoData { skipped: 0 });
    }

    #[test]
    fn explicit_anchor_can_leave_window_empty() {
        let as_of = parse_key("01/31/25 11:00:00").unwrap();
        let out = summarize(&pair(), 10, Some(as_of), TimestampPolicy::Abort).unwrap();
        assert_eq!(
            out,
            WindowOutcome::EmptyWindow {
                window_seconds: 10,
                anchor: "01/31/25 11:00:00".into(),
                skipped: 0,
            }
        );
    }

    #[test]
    fn explicit_anchor_excludes_later_records() {
        let as_of = parse_key("01/31/25 10:00:03").unwrap();
        let s = summary(summarize(&pair(), 10, Some(as_of), TimestampPolicy::Abort).unwrap());
        assert_eq!(s.sample_count, 1);
        assert_eq!(s.average_bpm, 70.0);
        assert_eq!(s.anchor, "01/31/25 10:00:03");
    }

    #[test]
    fn malformed_key_aborts_every_time() {
        let mut records = pair();
        records.push(rec("not-a-date", 200.0, 1.0));
        for _ in 0..3 {
            let err = summarize(&records, 10, None, TimestampPolicy::Abort).unwrap_err();
            match err {
                EngineError::Timestamp(t) => assert_eq!(t.input, "not-a-date"),
                other => panic!("unexpected error {other:?}"),
            }
        }
    }

    #[test]
    fn malformed_key_is_skipped_every_time() {
        let mut records = pair();
        records.insert(1, rec("not-a-date", 200.0, 1.0));
        for _ in 0..3 {
            let s = summary(summarize(&records, 10, None, TimestampPolicy::Skip).unwrap());
            assert_eq!(s.sample_count, 2);
            assert_eq!(s.skipped, 1);
            assert_eq!(s.average_bpm, 80.0);
        }
    }

    #[test]
    fn only_malformed_keys_under_skip_is_no_data() {
        let records = vec![rec("not-a-date", 70.0, 1.0)];
        let out = summarize(&records, 10, None, TimestampPolicy::Skip).unwrap();
        assert_eq!(out, WindowOutcome::NoData { skipped: 1 });
    }

    #[test]
    fn outcome_serializes_flat() {
        let out = summarize(&pair(), 10, None, TimestampPolicy::Abort).unwrap();
        let json = serde_json::to_value(&out).unwrap();
        assert_eq!(json["status"], "summary");
        assert_eq!(json["average_bpm"], 80.0);
        assert_eq!(json["stress_label"], "High");
        assert_eq!(json["sample_count"], 2);
    }

    #[tokio::test]
    async fn aggregates_across_store_pages() {
        let store = MemoryStore::new(1);
        for r in pair() {
            store.put(r).await.unwrap();
        }
        let agg = Aggregator::new(Arc::new(store), TimestampPolicy::Abort);
        let s = summary(agg.aggregate(10, None).await.unwrap());
        assert_eq!(s.sample_count, 2);
        assert_eq!(s.average_bpm, 80.0);
    }

    #[tokio::test]
    async fn empty_store_reports_no_data() {
        let agg = Aggregator::new(Arc::new(MemoryStore::default()), TimestampPolicy::Abort);
        assert_eq!(agg.aggregate(10, None).await.unwrap(), WindowOutcome::NoData { skipped: 0 });
    }

    #[tokio::test]
    async fn bad_as_of_is_rejected_before_scanning() {
        let agg = Aggregator::new(Arc::new(MemoryStore::default()), TimestampPolicy::Skip);
        assert!(matches!(
            agg.aggregate(10, Some("noon")).await,
            Err(EngineError::Timestamp(_))
        ));
    }
}
