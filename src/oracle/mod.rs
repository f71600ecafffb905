//! Oracle module - KALE price acquisition and retention
//!
//! Polls a single feed adapter on a fixed cadence, keeps a bounded history of
//! the samples it returns and publishes immutable snapshots for consumers.

mod acquisition;
mod history;
pub mod sources;

pub use acquisition::{AcquisitionLoop, FetchState, PendingFetch, TickOutcome};
pub use history::{HistoryStore, DEFAULT_HISTORY_CAPACITY};

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::watch;
use tokio_stream::wrappers::WatchStream;

use crate::analytics::{self, PriceStatistics, TimeRange};
use crate::types::Sample;

/// Outcome of the most recent fetch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LinkStatus {
    Connected,
    Disconnected,
}

/// Connectivity summary maintained by the acquisition loop
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConnectivityState {
    pub status: LinkStatus,
    /// Message of the latest failed fetch, cleared on success
    pub last_error: Option<String>,
    pub consecutive_failures: u32,
    pub last_success_at: Option<DateTime<Utc>>,
    /// Ticks that arrived while a fetch was still in flight
    pub skipped_ticks: u64,
}

impl ConnectivityState {
    pub fn is_connected(&self) -> bool {
        self.status == LinkStatus::Connected
    }

    pub(crate) fn record_success(&mut self, at: DateTime<Utc>) {
        self.status = LinkStatus::Connected;
        self.last_error = None;
        self.consecutive_failures = 0;
        self.last_success_at = Some(at);
    }

    pub(crate) fn record_failure(&mut self, message: String) {
        self.status = LinkStatus::Disconnected;
        self.last_error = Some(message);
        self.consecutive_failures = self.consecutive_failures.saturating_add(1);
    }
}

impl Default for ConnectivityState {
    fn default() -> Self {
        Self {
            status: LinkStatus::Disconnected,
            last_error: None,
            consecutive_failures: 0,
            last_success_at: None,
            skipped_ticks: 0,
        }
    }
}

/// Immutable view published after every completed fetch
#[derive(Debug, Clone, Serialize)]
pub struct TelemetrySnapshot {
    /// Retained samples, oldest first
    pub history: Vec<Sample>,
    pub connectivity: ConnectivityState,
    pub capacity: usize,
    pub published_at: DateTime<Utc>,
}

impl TelemetrySnapshot {
    pub fn empty(capacity: usize) -> Self {
        Self {
            history: Vec::new(),
            connectivity: ConnectivityState::default(),
            capacity,
            published_at: Utc::now(),
        }
    }

    /// Latest sample; always the last history element
    pub fn current(&self) -> Option<&Sample> {
        self.history.last()
    }

    /// History restricted to `range`, evaluated against the current time
    pub fn window(&self, range: TimeRange) -> &[Sample] {
        analytics::filter(&self.history, range)
    }

    /// Statistics over the `range` window, `None` when it is empty
    pub fn statistics(&self, range: TimeRange) -> Option<PriceStatistics> {
        PriceStatistics::compute(self.window(range))
    }
}

/// Read-only access to published telemetry
#[derive(Debug, Clone)]
pub struct TelemetryHandle {
    rx: watch::Receiver<Arc<TelemetrySnapshot>>,
}

impl TelemetryHandle {
    pub(crate) fn new(rx: watch::Receiver<Arc<TelemetrySnapshot>>) -> Self {
        Self { rx }
    }

    /// Latest published snapshot
    pub fn snapshot(&self) -> Arc<TelemetrySnapshot> {
        self.rx.borrow().clone()
    }

    pub fn current_sample(&self) -> Option<Sample> {
        self.rx.borrow().current().cloned()
    }

    pub fn history(&self) -> Vec<Sample> {
        self.rx.borrow().history.clone()
    }

    pub fn connectivity(&self) -> ConnectivityState {
        self.rx.borrow().connectivity.clone()
    }

    /// Wait for the next publication. Returns `false` once the loop is gone.
    pub async fn changed(&mut self) -> bool {
        self.rx.changed().await.is_ok()
    }

    /// Independent receiver for consumers that manage their own polling
    pub fn subscribe(&self) -> watch::Receiver<Arc<TelemetrySnapshot>> {
        self.rx.clone()
    }

    /// Stream of snapshots, starting with the current one
    pub fn updates(&self) -> WatchStream<Arc<TelemetrySnapshot>> {
        WatchStream::new(self.rx.clone())
    }
}
