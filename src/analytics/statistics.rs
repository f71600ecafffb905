//! Statistics Engine - aggregate and delta metrics over a sample window
//!
//! Everything is recomputed from the slice on each call; windows are bounded
//! by the history capacity so this stays cheap.

use serde::Serialize;
use std::collections::BTreeMap;

use crate::types::{Sample, SampleSource, Trend};

/// Share of the window contributed by each source tag
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SourceShare {
    pub count: usize,
    /// `count / window length`, 0.0 - 1.0
    pub fraction: f64,
}

/// Summary of a non-empty window
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PriceStatistics {
    pub count: usize,
    /// Price of the newest sample
    pub current: f64,
    /// Price of the oldest sample
    pub open: f64,
    pub min: f64,
    pub max: f64,
    pub average: f64,
    /// `current - open`
    pub delta: f64,
    /// `delta / open * 100`, 0.0 when `open` is zero
    pub delta_percent: f64,
    /// `max - min`
    pub volatility: f64,
    /// Every tag is present, including those with no samples
    pub source_distribution: BTreeMap<SampleSource, SourceShare>,
}

impl PriceStatistics {
    /// Compute over `samples`, oldest first. `None` for an empty window.
    pub fn compute(samples: &[Sample]) -> Option<Self> {
        let first = samples.first()?;
        let last = samples.last()?;

        let count = samples.len();
        let open = first.price();
        let current = last.price();

        let mut min = f64::INFINITY;
        let mut max = f64::NEG_INFINITY;
        let mut sum = 0.0;
        for sample in samples {
            let price = sample.price();
            min = min.min(price);
            max = max.max(price);
            sum += price;
        }
        // Mean stays within [min, max] despite summation rounding
        let average = (sum / count as f64).clamp(min, max);

        let delta = current - open;

        Some(Self {
            count,
            current,
            open,
            min,
            max,
            average,
            delta,
            delta_percent: percent_change(delta, open),
            volatility: max - min,
            source_distribution: source_distribution(samples),
        })
    }

    pub fn trend(&self) -> Trend {
        Trend::from_change(self.delta)
    }
}

/// Change between the two newest samples
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PriceChange {
    pub previous: f64,
    pub current: f64,
    pub change: f64,
    pub change_percent: f64,
    pub trend: Trend,
}

impl PriceChange {
    /// `None` when fewer than two samples exist
    pub fn latest(samples: &[Sample]) -> Option<Self> {
        let [.., previous, current] = samples else {
            return None;
        };
        let change = current.price() - previous.price();
        Some(Self {
            previous: previous.price(),
            current: current.price(),
            change,
            change_percent: percent_change(change, previous.price()),
            trend: Trend::from_change(change),
        })
    }
}

/// Count and fraction per source tag; empty input yields zero counts
pub fn source_distribution(samples: &[Sample]) -> BTreeMap<SampleSource, SourceShare> {
    let mut counts: BTreeMap<SampleSource, usize> =
        SampleSource::ALL.iter().map(|s| (*s, 0)).collect();
    for sample in samples {
        *counts.entry(sample.source()).or_insert(0) += 1;
    }

    let total = samples.len();
    counts
        .into_iter()
        .map(|(source, count)| {
            let fraction = if total == 0 {
                0.0
            } else {
                count as f64 / total as f64
            };
            (source, SourceShare { count, fraction })
        })
        .collect()
}

fn percent_change(change: f64, base: f64) -> f64 {
    if base == 0.0 {
        0.0
    } else {
        change / base * 100.0
    }
}
