//! Core types used throughout KaleWatch
//!
//! Defines the price sample, its provenance tags and the trend classification
//! shared by the statistics engine and the presentation layer.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::oracle::sources::FeedError;

/// Upstream mechanism that produced a price
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SampleSource {
    /// Quoted from the Stellar DEX
    Stellar,
    /// Read from the exported CSV snapshot
    Csv,
    /// Fallback constant
    Hardcoded,
}

impl SampleSource {
    /// Every tag, in display order
    pub const ALL: [SampleSource; 3] = [
        SampleSource::Stellar,
        SampleSource::Csv,
        SampleSource::Hardcoded,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SampleSource::Stellar => "stellar",
            SampleSource::Csv => "csv",
            SampleSource::Hardcoded => "hardcoded",
        }
    }

    /// Parse from string
    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "stellar" => Some(SampleSource::Stellar),
            "csv" => Some(SampleSource::Csv),
            "hardcoded" => Some(SampleSource::Hardcoded),
            _ => None,
        }
    }
}

impl fmt::Display for SampleSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One observed price at one instant from one source.
///
/// Fields are private: a sample never changes after construction, and
/// [`Sample::new`] refuses prices that are not finite and positive.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Sample {
    price: f64,
    timestamp: DateTime<Utc>,
    source: SampleSource,
}

impl Sample {
    pub fn new(
        price: f64,
        timestamp: DateTime<Utc>,
        source: SampleSource,
    ) -> Result<Self, FeedError> {
        if !price.is_finite() || price <= 0.0 {
            return Err(FeedError::InvalidPrice(price));
        }
        Ok(Self {
            price,
            timestamp,
            source,
        })
    }

    /// Build a sample stamped with the current wall-clock time
    pub fn now(price: f64, source: SampleSource) -> Result<Self, FeedError> {
        Self::new(price, Utc::now(), source)
    }

    pub fn price(&self) -> f64 {
        self.price
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    pub fn source(&self) -> SampleSource {
        self.source
    }

    /// Copy of this sample carrying a different timestamp
    pub(crate) fn restamped(&self, timestamp: DateTime<Utc>) -> Self {
        Self {
            timestamp,
            ..self.clone()
        }
    }
}

/// Direction of a price change
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Trend {
    Up,
    Down,
    Flat,
}

impl Trend {
    /// Classify a change by its sign
    pub fn from_change(change: f64) -> Self {
        if change > 0.0 {
            Trend::Up
        } else if change < 0.0 {
            Trend::Down
        } else {
            Trend::Flat
        }
    }
}

impl fmt::Display for Trend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Trend::Up => write!(f, "up"),
            Trend::Down => write!(f, "down"),
            Trend::Flat => write!(f, "flat"),
        }
    }
}
