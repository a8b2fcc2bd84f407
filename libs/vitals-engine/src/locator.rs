use std::sync::Arc;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use vitals_api::{PageToken, TelemetryRecord, TelemetryStore, parse_key};

use crate::error::EngineError;

/// How "closeness" between a record key and the target key is measured.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DistanceMetric {
    /// Code-point difference of the first character only.
    ///
    /// Weak for timestamp keys: everything after the first character is
    /// ignored, so every key from January to September ties on `'0'`.
    /// Kept as the default to match existing behavior. Use `Instant`
    /// for a real nearest-time lookup.
    #[default]
    FirstChar,
    /// Absolute difference in seconds between parsed timestamps.
    Instant,
}

enum Probe {
    Char(u32),
    Instant(NaiveDateTime),
}

/// Running minimum over a scan. The first record seen at a given
/// distance keeps the spot.
pub struct Nearest {
    probe: Probe,
    best: Option<(u64, TelemetryRecord)>,
    skipped: usize,
}

impl Nearest {
    pub fn new(target: &str, metric: DistanceMetric) -> Result<Self, EngineError> {
        let probe = match metric {
            DistanceMetric::FirstChar => {
                let c = target.chars().next().ok_or(EngineError::EmptyTarget)?;
                Probe::Char(c as u32)
            }
            DistanceMetric::Instant => {
                if target.is_empty() {
                    return Err(EngineError::EmptyTarget);
                }
                Probe::Instant(parse_key(target)?)
            }
        };
        Ok(Self { probe, best: None, skipped: 0 })
    }

    /// Distance from `record` to the target, `None` if it cannot be measured.
    pub fn distance(&self, record: &TelemetryRecord) -> Option<u64> {
        match self.probe {
            Probe::Char(t) => record.lead_char().map(|c| (c as u32).abs_diff(t) as u64),
            Probe::Instant(t) => record
                .instant()
                .ok()
                .map(|i| (i - t).num_seconds().unsigned_abs()),
        }
    }

    pub fn offer(&mut self, record: TelemetryRecord) {
        let Some(d) = self.distance(&record) else {
            tracing::warn!(key = %record.key, "skipping record with unmeasurable key");
            self.skipped += 1;
            return;
        };
        if self.best.as_ref().is_none_or(|(best, _)| d < *best) {
            self.best = Some((d, record));
        }
    }

    /// Records passed over because their key could not be measured.
    pub fn skipped(&self) -> usize {
        self.skipped
    }

    pub fn finish(self) -> Option<TelemetryRecord> {
        self.best.map(|(_, r)| r)
    }
}

/// Finds the record whose key is closest to a target key by scanning
/// every page of the store.
pub struct Locator {
    store: Arc<dyn TelemetryStore>,
    metric: DistanceMetric,
}

impl Locator {
    pub fn new(store: Arc<dyn TelemetryStore>, metric: DistanceMetric) -> Self {
        Self { store, metric }
    }

    /// `Ok(None)` when the store holds no measurable record.
    ///
    /// The target is only checked once there is a record to compare it
    /// with, so an empty store answers "not found" for any target.
    pub async fn locate(&self, target: &str) -> Result<Option<TelemetryRecord>, EngineError> {
        let mut nearest: Option<Nearest> = None;
        let mut token: Option<PageToken> = None;
        let mut pages = 0usize;

        loop {
            let page = self
                .store
                .enumerate(token.take())
                .await
                .map_err(|e| EngineError::from(e).with_context("locate"))?;
            pages += 1;
            tracing::debug!(page = pages, records = page.records.len(), "scanning page");
            if nearest.is_none() && !page.records.is_empty() {
                nearest = Some(Nearest::new(target, self.metric)?);
            }
            if let Some(acc) = nearest.as_mut() {
                for record in page.records {
                    acc.offer(record);
                }
            }
            match page.next {
                Some(next) => token = Some(next),
                None => break,
            }
        }

        let Some(nearest) = nearest else {
            tracing::info!(wanted = %target, pages, "store is empty");
            return Ok(None);
        };
        let skipped = nearest.skipped();
        let found = nearest.finish();
        match &found {
            Some(r) => tracing::info!(wanted = %target, key = %r.key, pages, skipped, "nearest record found"),
            None => tracing::info!(wanted = %target, pages, skipped, "no measurable record in store"),
        }
        Ok(found)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use vitals_storage_memory::MemoryStore;

    async fn store_with(keys: &[&str], page_size: usize) -> Arc<dyn TelemetryStore> {
        let store = MemoryStore::new(page_size);
        for (i, k) in keys.iter().enumerate() {
            store.put(TelemetryRecord::new(*k, 60.0 + i as f64, 1.0)).await.unwrap();
        }
        Arc::new(store)
    }

    #[tokio::test]
    async fn empty_store_is_not_found() {
        let locator = Locator::new(store_with(&[], 10).await, DistanceMetric::FirstChar);
        assert!(locator.locate("01/31/25 10:00:00").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn first_char_picks_smallest_lead_difference() {
        let store = store_with(&["9x", "5x", "3x"], 10).await;
        let locator = Locator::new(store, DistanceMetric::FirstChar);
        let found = locator.locate("4").await.unwrap().unwrap();
        assert_eq!(found.key, "5x");
    }

    #[tokio::test]
    async fn first_char_tie_keeps_first_seen() {
        let store = store_with(&["01/31/25 19:59:59", "01/31/25 10:00:00"], 10).await;
        let locator = Locator::new(store, DistanceMetric::FirstChar);
        let found = locator.locate("01/31/25 10:00:00").await.unwrap().unwrap();
        // Both share lead '0'; the metric cannot tell them apart.
        assert_eq!(found.key, "01/31/25 19:59:59");
    }

    #[tokio::test]
    async fn minimum_is_carried_across_pages() {
        let store = store_with(&["9a", "8a", "7a", "6a", "1a", "5a"], 2).await;
        let locator = Locator::new(store, DistanceMetric::FirstChar);
        assert_eq!(locator.locate("0").await.unwrap().unwrap().key, "1a");
    }

    #[tokio::test]
    async fn empty_store_with_empty_target_is_not_found() {
        let locator = Locator::new(store_with(&[], 10).await, DistanceMetric::FirstChar);
        assert!(locator.locate("").await.unwrap().is_none());
        let locator = Locator::new(store_with(&[], 10).await, DistanceMetric::Instant);
        assert!(locator.locate("").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn empty_target_is_rejected() {
        let locator = Locator::new(store_with(&["1a"], 10).await, DistanceMetric::FirstChar);
        assert!(matches!(locator.locate("").await, Err(EngineError::EmptyTarget)));
    }

    #[tokio::test]
    async fn instant_metric_uses_full_timestamp() {
        let store = store_with(
            &["01/31/25 19:59:59", "01/31/25 10:00:07", "01/30/25 10:00:00"],
            1,
        )
        .await;
        let locator = Locator::new(store, DistanceMetric::Instant);
        let found = locator.locate("01/31/25 10:00:00").await.unwrap().unwrap();
        assert_eq!(found.key, "01/31/25 10:00:07");
    }

    #[tokio::test]
    async fn instant_metric_skips_unparseable_keys() {
        let store = store_with(&["not-a-date", "01/31/25 10:00:30"], 10).await;
        let locator = Locator::new(store, DistanceMetric::Instant);
        let found = locator.locate("01/31/25 10:00:00").await.unwrap().unwrap();
        assert_eq!(found.key, "01/31/25 10:00:30");
    }

    #[tokio::test]
    async fn instant_metric_needs_parseable_target() {
        let locator = Locator::new(store_with(&["01/31/25 10:00:30"], 10).await, DistanceMetric::Instant);
        assert!(matches!(
            locator.locate("yesterday").await,
            Err(EngineError::Timestamp(_))
        ));
    }

    fn lead_distance(key: &str, target: &str) -> u32 {
        let k = key.chars().next().unwrap() as u32;
        let t = target.chars().next().unwrap() as u32;
        k.abs_diff(t)
    }

    proptest! {
        #[test]
        fn located_record_is_never_beaten(
            keys in proptest::collection::vec("[0-9a-zA-Z/ :]{1,17}", 1..40),
            target in "[0-9a-zA-Z/ :]{1,17}",
        ) {
            let mut nearest = Nearest::new(&target, DistanceMetric::FirstChar).unwrap();
            for k in &keys {
                nearest.offer(TelemetryRecord::new(k.clone(), 70.0, 1.0));
            }
            let found = nearest.finish().unwrap();
            let best = lead_distance(&found.key, &target);
            for k in &keys {
                prop_assert!(best <= lead_distance(k, &target));
            }
            // First encountered among the minima.
            let first_min = keys.iter().find(|k| lead_distance(k, &target) == best).unwrap();
            prop_assert_eq!(&found.key, first_min);
        }
    }
}
