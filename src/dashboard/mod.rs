//! Dashboard Module
//!
//! Provides an HTTP API for monitoring the KALE price feed.
//! Only compiled when the `dashboard` feature is enabled.

mod api;
mod types;

pub use api::create_router;
pub use types::*;

use std::sync::Arc;

use crate::oracle::TelemetryHandle;
use crate::persistence::PreferenceStore;

/// Shared state handed to every handler
#[derive(Clone)]
pub struct DashboardState {
    pub telemetry: TelemetryHandle,
    pub preferences: Arc<dyn PreferenceStore>,
}

impl DashboardState {
    pub fn new(telemetry: TelemetryHandle, preferences: Arc<dyn PreferenceStore>) -> Self {
        Self {
            telemetry,
            preferences,
        }
    }
}

/// Start the dashboard server
pub async fn start_server(state: DashboardState, port: u16) -> anyhow::Result<()> {
    let app = create_router(state);
    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], port));

    tracing::info!("🖥️ Dashboard API starting on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::oracle::sources::{FeedAdapter, FeedError};
    use crate::oracle::AcquisitionLoop;
    use crate::persistence::{MemoryPreferences, CHART_TIME_RANGE_KEY};
    use crate::types::{Sample, SampleSource};
    use async_trait::async_trait;
    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use serde_json::Value;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;
    use tower::ServiceExt;

    /// Scripted prices; `None` entries fail
    struct ScriptedFeed {
        prices: Vec<Option<f64>>,
        next: AtomicUsize,
    }

    #[async_trait]
    impl FeedAdapter for ScriptedFeed {
        fn name(&self) -> &'static str {
            "scripted"
        }

        async fn fetch_sample(&self) -> Result<Sample, FeedError> {
            let i = self.next.fetch_add(1, Ordering::SeqCst);
            match self.prices.get(i).copied().flatten() {
                Some(price) => Sample::now(price, SampleSource::Stellar),
                None => Err(FeedError::Transport("upstream offline".into())),
            }
        }
    }

    async fn state_after(prices: Vec<Option<f64>>) -> (DashboardState, Arc<MemoryPreferences>) {
        let polls = prices.len();
        let feed = Arc::new(ScriptedFeed {
            prices,
            next: AtomicUsize::new(0),
        });
        let (mut acq, handle) =
            AcquisitionLoop::new(feed, 50, Duration::from_secs(10), Duration::from_secs(10));
        for _ in 0..polls {
            acq.poll_once().await;
        }
        let prefs = Arc::new(MemoryPreferences::new());
        (DashboardState::new(handle, prefs.clone()), prefs)
    }

    async fn call(state: DashboardState, req: Request<Body>) -> Value {
        let response = create_router(state).oneshot(req).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    async fn get_json(state: DashboardState, uri: &str) -> Value {
        call(state, Request::get(uri).body(Body::empty()).unwrap()).await
    }

    #[tokio::test]
    async fn price_is_null_before_first_sample() {
        let (state, _) = state_after(vec![]).await;
        let body = get_json(state, "/api/price").await;
        assert_eq!(body["success"], true);
        assert!(body["data"]["sample"].is_null());
        assert!(body["data"]["change"].is_null());
    }

    #[tokio::test]
    async fn stats_report_delta_over_range() {
        let (state, _) = state_after(vec![Some(0.095), Some(0.100)]).await;
        let body = get_json(state, "/api/stats?range=1H").await;

        let stats = &body["data"]["statistics"];
        assert_eq!(body["data"]["range"], "1H");
        assert_eq!(stats["count"], 2);
        assert!((stats["delta"].as_f64().unwrap() - 0.005).abs() < 1e-12);
        assert_eq!(body["data"]["trend"], "up");
    }

    #[tokio::test]
    async fn invalid_range_is_reported_not_panicking() {
        let (state, _) = state_after(vec![Some(0.095)]).await;
        let body = get_json(state, "/api/history?range=2W").await;
        assert_eq!(body["success"], false);
        assert!(body["error"].as_str().unwrap().contains("2W"));
    }

    #[tokio::test]
    async fn history_uses_stored_preference_when_range_missing() {
        let (state, prefs) = state_after(vec![Some(0.09), Some(0.091), Some(0.092)]).await;
        prefs.set(CHART_TIME_RANGE_KEY, "ALL").unwrap();

        let body = get_json(state, "/api/history").await;
        assert_eq!(body["data"]["range"], "ALL");
        assert_eq!(body["data"]["date_labels"], true);
        assert_eq!(body["data"]["count"], 3);
    }

    #[tokio::test]
    async fn short_ranges_label_by_time_of_day() {
        let (state, _) = state_after(vec![Some(0.09)]).await;
        let body = get_json(state, "/api/history?range=6h").await;
        assert_eq!(body["data"]["range"], "6H");
        assert_eq!(body["data"]["date_labels"], false);
        assert_eq!(body["data"]["count"], 1);
    }

    #[tokio::test]
    async fn health_reflects_last_failure() {
        let (state, _) = state_after(vec![Some(0.095), None]).await;
        let body = get_json(state, "/api/health").await;
        let health = &body["data"];
        assert_eq!(health["status"], "disconnected");
        assert_eq!(health["connected"], false);
        assert_eq!(health["last_error"], "transport error: upstream offline");
        assert_eq!(health["samples"], 1);
        assert_eq!(health["capacity"], 50);
    }

    #[tokio::test]
    async fn put_range_preference_persists_selection() {
        let (state, prefs) = state_after(vec![]).await;
        let req = Request::put("/api/preferences/range")
            .header("content-type", "application/json")
            .body(Body::from(r#"{"range":"7d"}"#))
            .unwrap();
        let body = call(state.clone(), req).await;
        assert_eq!(body["data"]["range"], "7D");
        assert_eq!(prefs.get(CHART_TIME_RANGE_KEY).unwrap().as_deref(), Some("7D"));

        let body = get_json(state, "/api/preferences/range").await;
        assert_eq!(body["data"]["range"], "7D");
    }
}
