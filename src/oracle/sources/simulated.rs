//! Simulated KALE price feed
//!
//! Stand-in for the real upstream: draws a price around a base value, clamps
//! it to a floor and tags it with a random source.

use async_trait::async_trait;
use rand::Rng;
use std::time::Duration;

use crate::config::FeedConfig;
use crate::oracle::sources::{FeedAdapter, FeedError};
use crate::types::{Sample, SampleSource};

#[derive(Debug, Clone)]
pub struct SimulatedFeed {
    base_price: f64,
    half_spread: f64,
    floor_price: f64,
    latency: Duration,
    failure_rate: f64,
}

impl SimulatedFeed {
    pub fn new(base_price: f64, half_spread: f64, floor_price: f64) -> Self {
        Self {
            base_price,
            half_spread: half_spread.abs(),
            floor_price,
            latency: Duration::ZERO,
            failure_rate: 0.0,
        }
    }

    pub fn from_config(config: &FeedConfig) -> Self {
        Self::new(config.base_price, config.half_spread, config.floor_price)
            .with_latency(config.latency())
            .with_failure_rate(config.failure_rate)
    }

    /// Delay every fetch by `latency` to mimic a network round-trip
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// Fail a fraction of fetches (0.0 - 1.0)
    pub fn with_failure_rate(mut self, failure_rate: f64) -> Self {
        self.failure_rate = failure_rate.clamp(0.0, 1.0);
        self
    }

    /// Draw one price: `max(floor, base ± uniform(0, half_spread))`, 6 decimals
    pub fn draw_price<R: Rng + ?Sized>(&self, rng: &mut R) -> f64 {
        let variation = if self.half_spread > 0.0 {
            rng.gen_range(-self.half_spread..=self.half_spread)
        } else {
            0.0
        };
        let price = (self.base_price + variation).max(self.floor_price);
        (price * 1_000_000.0).round() / 1_000_000.0
    }

    pub fn draw_source<R: Rng + ?Sized>(rng: &mut R) -> SampleSource {
        SampleSource::ALL[rng.gen_range(0..SampleSource::ALL.len())]
    }
}

impl Default for SimulatedFeed {
    fn default() -> Self {
        Self::new(0.095, 0.005, 0.08)
    }
}

#[async_trait]
impl FeedAdapter for SimulatedFeed {
    fn name(&self) -> &'static str {
        "simulated"
    }

    async fn fetch_sample(&self) -> Result<Sample, FeedError> {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }

        // ThreadRng is !Send, keep it out of any await point
        let (price, source, fail) = {
            let mut rng = rand::thread_rng();
            let fail = self.failure_rate > 0.0 && rng.gen_bool(self.failure_rate);
            (self.draw_price(&mut rng), Self::draw_source(&mut rng), fail)
        };

        if fail {
            tracing::debug!(feed = "simulated", "Injecting simulated upstream failure");
            return Err(FeedError::Transport("simulated upstream failure".to_string()));
        }

        Sample::now(price, source)
    }
}
