//! Acquisition Loop - periodic polling of a single feed adapter
//!
//! The loop is a two-state machine. A tick while `Idle` dispatches exactly one
//! fetch and moves to `Fetching`; a tick while `Fetching` is skipped. The fetch
//! outcome updates the history and connectivity state and returns to `Idle`.
//! Only this task ever writes; consumers read published snapshots.

use chrono::Utc;
use futures_util::future::BoxFuture;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use crate::config::AppConfig;
use crate::oracle::history::HistoryStore;
use crate::oracle::sources::{FeedAdapter, FeedError};
use crate::oracle::{ConnectivityState, TelemetryHandle, TelemetrySnapshot};
use crate::types::Sample;

/// A dispatched fetch, already bounded by the fetch timeout
pub type PendingFetch = BoxFuture<'static, Result<Sample, FeedError>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchState {
    /// No fetch in flight
    Idle,
    /// One fetch in flight
    Fetching,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    Dispatched,
    Skipped,
}

pub struct AcquisitionLoop {
    feed: Arc<dyn FeedAdapter>,
    feed_name: &'static str,
    history: HistoryStore,
    connectivity: ConnectivityState,
    state: FetchState,
    poll_interval: Duration,
    fetch_timeout: Duration,
    publisher: watch::Sender<Arc<TelemetrySnapshot>>,
}

impl AcquisitionLoop {
    pub fn new(
        feed: Arc<dyn FeedAdapter>,
        capacity: usize,
        poll_interval: Duration,
        fetch_timeout: Duration,
    ) -> (Self, TelemetryHandle) {
        let history = HistoryStore::new(capacity);
        let (publisher, rx) =
            watch::channel(Arc::new(TelemetrySnapshot::empty(history.capacity())));
        let feed_name = feed.name();

        let this = Self {
            feed,
            feed_name,
            history,
            connectivity: ConnectivityState::default(),
            state: FetchState::Idle,
            poll_interval,
            fetch_timeout,
            publisher,
        };
        (this, TelemetryHandle::new(rx))
    }

    pub fn from_config(feed: Arc<dyn FeedAdapter>, config: &AppConfig) -> (Self, TelemetryHandle) {
        Self::new(
            feed,
            config.history.capacity,
            config.acquisition.poll_interval(),
            config.acquisition.fetch_timeout(),
        )
    }

    pub fn fetch_state(&self) -> FetchState {
        self.state
    }

    pub fn history(&self) -> &HistoryStore {
        &self.history
    }

    pub fn connectivity(&self) -> &ConnectivityState {
        &self.connectivity
    }

    /// Timer tick. Returns the fetch to drive when one was dispatched.
    pub fn on_tick(&mut self) -> Option<PendingFetch> {
        match self.state {
            FetchState::Fetching => {
                self.connectivity.skipped_ticks = self.connectivity.skipped_ticks.saturating_add(1);
                debug!(
                    feed = self.feed_name,
                    skipped = self.connectivity.skipped_ticks,
                    "Fetch still in flight, skipping tick"
                );
                None
            }
            FetchState::Idle => {
                self.state = FetchState::Fetching;
                debug!(feed = self.feed_name, "Dispatching fetch");

                let feed = Arc::clone(&self.feed);
                let timeout = self.fetch_timeout;
                Some(Box::pin(async move {
                    match tokio::time::timeout(timeout, feed.fetch_sample()).await {
                        Ok(result) => result,
                        Err(_) => Err(FeedError::Timeout(timeout)),
                    }
                }))
            }
        }
    }

    /// Apply the outcome of the in-flight fetch and publish a snapshot
    pub fn on_fetch_complete(&mut self, result: Result<Sample, FeedError>) {
        if self.state != FetchState::Fetching {
            warn!(feed = self.feed_name, "Fetch completion without a dispatched fetch");
        }
        self.state = FetchState::Idle;

        match result {
            Ok(sample) => {
                let reconnected = !self.connectivity.is_connected();
                debug!(
                    feed = self.feed_name,
                    price = sample.price(),
                    source = %sample.source(),
                    "Sample acquired"
                );
                self.history.append(sample);
                self.connectivity.record_success(Utc::now());
                if reconnected {
                    info!(feed = self.feed_name, "✅ Price feed connected");
                }
            }
            Err(e) => {
                self.connectivity.record_failure(e.to_string());
                warn!(
                    feed = self.feed_name,
                    error = %e,
                    consecutive_failures = self.connectivity.consecutive_failures,
                    "Price fetch failed"
                );
            }
        }

        self.publish();
    }

    /// Drop an in-flight fetch without recording an outcome
    pub fn abandon_fetch(&mut self) {
        if self.state == FetchState::Fetching {
            debug!(feed = self.feed_name, "Abandoning in-flight fetch");
            self.state = FetchState::Idle;
        }
    }

    /// One tick driven to completion without a timer
    pub async fn poll_once(&mut self) -> TickOutcome {
        match self.on_tick() {
            Some(fetch) => {
                let result = fetch.await;
                self.on_fetch_complete(result);
                TickOutcome::Dispatched
            }
            None => TickOutcome::Skipped,
        }
    }

    fn publish(&self) {
        let snapshot = TelemetrySnapshot {
            history: self.history.snapshot(),
            connectivity: self.connectivity.clone(),
            capacity: self.history.capacity(),
            published_at: Utc::now(),
        };
        self.publisher.send_replace(Arc::new(snapshot));
    }

    /// Poll until `shutdown` flips or its sender is dropped.
    ///
    /// The first fetch is dispatched immediately. An in-flight fetch at
    /// shutdown is dropped and never retried.
    pub async fn run(mut self, mut shutdown: watch::Receiver<bool>) {
        let mut interval = tokio::time::interval(self.poll_interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut in_flight: Option<PendingFetch> = None;

        info!(
            feed = self.feed_name,
            poll_interval_secs = self.poll_interval.as_secs_f64(),
            fetch_timeout_ms = self.fetch_timeout.as_millis() as u64,
            capacity = self.history.capacity(),
            "Acquisition loop started"
        );

        loop {
            if *shutdown.borrow() {
                break;
            }

            // A completion due at the same instant as a tick is applied first
            tokio::select! {
                biased;

                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
                result = wait_in_flight(&mut in_flight) => {
                    in_flight = None;
                    self.on_fetch_complete(result);
                }
                _ = interval.tick() => {
                    if let Some(fetch) = self.on_tick() {
                        in_flight = Some(fetch);
                    }
                }
            }
        }

        if in_flight.take().is_some() {
            self.abandon_fetch();
        }
        self.publish();
        info!(
            feed = self.feed_name,
            samples = self.history.len(),
            "Acquisition loop stopped"
        );
    }
}

/// Resolve the in-flight fetch, or never when there is none
async fn wait_in_flight(slot: &mut Option<PendingFetch>) -> Result<Sample, FeedError> {
    match slot.as_mut() {
        Some(fetch) => fetch.await,
        None => std::future::pending().await,
    }
}
