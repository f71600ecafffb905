//! History Store - bounded retention of recent samples
//!
//! Keeps the most recent `capacity` samples in arrival order. Appending past
//! capacity evicts from the front; nothing else ever removes or reorders.

use std::collections::VecDeque;

use crate::types::Sample;

/// Reference retention used by the dashboard
pub const DEFAULT_HISTORY_CAPACITY: usize = 50;

#[derive(Debug, Clone)]
pub struct HistoryStore {
    samples: VecDeque<Sample>,
    capacity: usize,
}

impl HistoryStore {
    /// Create an empty store; `capacity` is raised to at least 1
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            samples: VecDeque::with_capacity(capacity + 1),
            capacity,
        }
    }

    /// Append at the back, evicting the oldest samples beyond capacity.
    ///
    /// A sample stamped earlier than the current newest one is re-stamped to
    /// that instant so timestamps never decrease in store order.
    pub fn append(&mut self, sample: Sample) {
        let sample = match self.samples.back() {
            Some(last) if sample.timestamp() < last.timestamp() => {
                tracing::warn!(
                    sample_ts = %sample.timestamp(),
                    last_ts = %last.timestamp(),
                    "Sample older than newest stored sample, clamping timestamp"
                );
                sample.restamped(last.timestamp())
            }
            _ => sample,
        };

        self.samples.push_back(sample);

        // Trim old samples
        while self.samples.len() > self.capacity {
            self.samples.pop_front();
        }
    }

    /// Owned copy of the full sequence, oldest first
    pub fn snapshot(&self) -> Vec<Sample> {
        self.samples.iter().cloned().collect()
    }

    /// Most recent sample, if any
    pub fn current(&self) -> Option<&Sample> {
        self.samples.back()
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl Default for HistoryStore {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::SampleSource;
    use chrono::{Duration, TimeZone, Utc};

    fn sample_at(secs: i64, price: f64) -> Sample {
        let ts = Utc.timestamp_opt(1_700_000_000 + secs, 0).unwrap();
        Sample::new(price, ts, SampleSource::Stellar).unwrap()
    }

    #[test]
    fn empty_store_has_no_current() {
        let store = HistoryStore::default();
        assert!(store.is_empty());
        assert!(store.current().is_none());
        assert!(store.snapshot().is_empty());
    }

    #[test]
    fn keeps_last_fifty_of_sixty_appends() {
        let mut store = HistoryStore::new(50);
        for i in 1..=60 {
            store.append(sample_at(i, 0.09 + i as f64 * 1e-4));
            assert!(store.len() <= 50);
        }

        let snapshot = store.snapshot();
        assert_eq!(snapshot.len(), 50);
        let expected: Vec<Sample> = (11..=60)
            .map(|i| sample_at(i, 0.09 + i as f64 * 1e-4))
            .collect();
        assert_eq!(snapshot, expected);
        assert_eq!(store.current(), expected.last());
    }

    #[test]
    fn snapshot_is_detached_from_later_appends() {
        let mut store = HistoryStore::new(3);
        store.append(sample_at(0, 0.1));
        let before = store.snapshot();
        store.append(sample_at(1, 0.2));
        assert_eq!(before.len(), 1);
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn zero_capacity_is_raised_to_one() {
        let mut store = HistoryStore::new(0);
        store.append(sample_at(0, 0.1));
        store.append(sample_at(1, 0.2));
        assert_eq!(store.capacity(), 1);
        assert_eq!(store.current().map(Sample::price), Some(0.2));
    }

    #[test]
    fn out_of_order_timestamps_are_clamped() {
        let mut store = HistoryStore::new(10);
        store.append(sample_at(100, 0.1));
        store.append(sample_at(50, 0.2));

        let snapshot = store.snapshot();
        assert_eq!(snapshot[1].price(), 0.2);
        assert_eq!(snapshot[1].timestamp(), snapshot[0].timestamp());
        assert!(snapshot
            .windows(2)
            .all(|w| w[0].timestamp() <= w[1].timestamp()));
    }

    #[test]
    fn timestamps_stay_monotonic_under_mixed_input() {
        let mut store = HistoryStore::new(20);
        let base = Utc::now();
        for offset in [5, 3, 9, 9, 1, 12, 0, 15] {
            let ts = base + Duration::seconds(offset);
            store.append(Sample::new(0.1, ts, SampleSource::Csv).unwrap());
        }
        let snapshot = store.snapshot();
        assert!(snapshot
            .windows(2)
            .all(|w| w[0].timestamp() <= w[1].timestamp()));
    }
}
