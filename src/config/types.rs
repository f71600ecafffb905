//! Configuration section types

use serde::Deserialize;
use std::fmt;
use std::time::Duration;

/// Which feed adapter drives acquisition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FeedKind {
    /// Randomized stand-in for the real upstream
    Simulated,
    /// JSON price endpoint over HTTP
    Http,
}

impl fmt::Display for FeedKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FeedKind::Simulated => write!(f, "simulated"),
            FeedKind::Http => write!(f, "http"),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct FeedConfig {
    pub kind: FeedKind,
    /// Price endpoint, required when `kind = http`
    #[serde(default)]
    pub url: Option<String>,
    /// Centre of the simulated price distribution
    pub base_price: f64,
    /// Maximum simulated deviation from `base_price`
    pub half_spread: f64,
    /// Simulated prices never drop below this
    pub floor_price: f64,
    /// Simulated round-trip latency in milliseconds
    pub latency_ms: u64,
    /// Probability (0.0 - 1.0) that a simulated fetch fails
    pub failure_rate: f64,
    /// HTTP request timeout in milliseconds
    pub request_timeout_ms: u64,
}

impl FeedConfig {
    pub fn latency(&self) -> Duration {
        Duration::from_millis(self.latency_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

/// Gap kept between a timed-out fetch and the next scheduled tick
pub const FETCH_TIMEOUT_MARGIN: Duration = Duration::from_millis(250);

#[derive(Debug, Clone, Deserialize)]
pub struct AcquisitionConfig {
    /// Seconds between scheduled fetch attempts
    pub poll_interval_secs: u64,
    /// Upper bound on a single fetch, kept strictly below the poll interval
    pub fetch_timeout_ms: u64,
}

impl AcquisitionConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    /// Configured timeout, capped at `poll_interval - FETCH_TIMEOUT_MARGIN` so a
    /// hung fetch fails before the next tick instead of swallowing it
    pub fn fetch_timeout(&self) -> Duration {
        let ceiling = self.poll_interval().saturating_sub(FETCH_TIMEOUT_MARGIN);
        Duration::from_millis(self.fetch_timeout_ms).min(ceiling)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct HistoryConfig {
    /// Maximum number of retained samples
    pub capacity: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PreferencesConfig {
    /// JSON file holding display preferences
    pub path: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Emit JSON log lines instead of the human format
    pub json: bool,
    /// Seconds between summary log lines
    pub summary_interval_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DashboardConfig {
    pub enabled: bool,
    pub port: u16,
}
