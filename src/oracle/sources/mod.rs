//! Feed adapters (simulated, HTTP)
//!
//! A feed adapter produces one [`Sample`] per call or fails with a
//! human-readable [`FeedError`]. The acquisition loop never sees anything else,
//! so a real upstream integration drops in without touching the core.

mod http;
mod simulated;

pub use http::HttpFeed;
pub use simulated::SimulatedFeed;

use anyhow::{Context, Result};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

use crate::config::{FeedConfig, FeedKind};
use crate::types::Sample;

/// Why a fetch produced no sample
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FeedError {
    #[error("fetch timed out after {}ms", .0.as_millis())]
    Timeout(Duration),

    #[error("transport error: {0}")]
    Transport(String),

    #[error("upstream returned HTTP {0}")]
    Status(u16),

    #[error("malformed upstream payload: {0}")]
    Malformed(String),

    #[error("invalid price {0}")]
    InvalidPrice(f64),

    #[error("unknown price source tag '{0}'")]
    UnknownSource(String),
}

/// Trait for price feed clients
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait FeedAdapter: Send + Sync {
    /// Get the feed name
    fn name(&self) -> &'static str;

    /// Fetch one sample, stamped at completion time
    async fn fetch_sample(&self) -> Result<Sample, FeedError>;
}

/// Build the adapter selected by `feed.kind`
pub fn build_feed(config: &FeedConfig) -> Result<Arc<dyn FeedAdapter>> {
    match config.kind {
        FeedKind::Simulated => Ok(Arc::new(SimulatedFeed::from_config(config))),
        FeedKind::Http => {
            let url = config
                .url
                .clone()
                .context("feed.url is required for the http feed")?;
            let feed = HttpFeed::new(url, config.request_timeout())
                .context("Failed to build HTTP feed client")?;
            Ok(Arc::new(feed))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;

    #[test]
    fn feed_error_messages_are_human_readable() {
        assert_eq!(
            FeedError::Timeout(Duration::from_millis(1500)).to_string(),
            "fetch timed out after 1500ms"
        );
        assert_eq!(FeedError::Status(503).to_string(), "upstream returned HTTP 503");
        assert_eq!(
            FeedError::UnknownSource("oracle".into()).to_string(),
            "unknown price source tag 'oracle'"
        );
    }

    #[test]
    fn build_feed_picks_adapter_by_kind() {
        let mut cfg = AppConfig::defaults().unwrap().feed;
        assert_eq!(build_feed(&cfg).unwrap().name(), "simulated");

        cfg.kind = FeedKind::Http;
        assert!(build_feed(&cfg).is_err());

        cfg.url = Some("http://127.0.0.1:9/price".to_string());
        assert_eq!(build_feed(&cfg).unwrap().name(), "http");
    }
}
