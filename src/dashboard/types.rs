//! Dashboard API response types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::analytics::{PriceChange, PriceStatistics, TimeRange};
use crate::oracle::LinkStatus;
use crate::types::{Sample, Trend};

/// Standard API response wrapper
#[derive(Debug, Clone, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<String>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn error(msg: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(msg.into()),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    pub status: LinkStatus,
    pub connected: bool,
    pub last_error: Option<String>,
    pub consecutive_failures: u32,
    pub last_success_at: Option<DateTime<Utc>>,
    pub skipped_ticks: u64,
    pub samples: usize,
    pub capacity: usize,
    pub published_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PriceResponse {
    /// `None` until the first successful fetch
    pub sample: Option<Sample>,
    pub change: Option<PriceChange>,
}

#[derive(Debug, Clone, Serialize)]
pub struct HistoryResponse {
    pub range: TimeRange,
    /// Chart hint: label points by date instead of time of day
    pub date_labels: bool,
    pub count: usize,
    pub points: Vec<Sample>,
}

#[derive(Debug, Clone, Serialize)]
pub struct StatsResponse {
    pub range: TimeRange,
    pub statistics: Option<PriceStatistics>,
    pub trend: Option<Trend>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RangePreference {
    pub range: TimeRange,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RangeQuery {
    pub range: Option<String>,
}
