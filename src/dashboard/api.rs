//! Dashboard HTTP API
//!
//! Read-only REST endpoints over the published telemetry, plus the chart
//! range preference.

use axum::{
    extract::{Query, State},
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use tower_http::cors::{Any, CorsLayer};

use super::types::*;
use super::DashboardState;
use crate::analytics::{PriceChange, TimeRange};
use crate::persistence::{load_time_range, save_time_range};

/// Create the API router with all endpoints
pub fn create_router(state: DashboardState) -> Router {
    Router::new()
        .route("/api/health", get(get_health))
        .route("/api/price", get(get_price))
        .route("/api/history", get(get_history))
        .route("/api/stats", get(get_stats))
        .route(
            "/api/preferences/range",
            get(get_range_preference).put(put_range_preference),
        )
        .with_state(state)
        // CORS for frontend
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
}

/// Explicit `?range=` wins, otherwise the stored preference
fn resolve_range(state: &DashboardState, query: &RangeQuery) -> Result<TimeRange, String> {
    match query.range.as_deref() {
        Some(raw) => raw.parse::<TimeRange>().map_err(|e| e.to_string()),
        None => Ok(load_time_range(state.preferences.as_ref())),
    }
}

// ─────────────────────────────────────────────────────────────────
// API Handlers
// ─────────────────────────────────────────────────────────────────

/// GET /api/health - Feed connectivity and retention
async fn get_health(State(state): State<DashboardState>) -> impl IntoResponse {
    let snapshot = state.telemetry.snapshot();
    let conn = &snapshot.connectivity;
    Json(ApiResponse::success(HealthResponse {
        status: conn.status,
        connected: conn.is_connected(),
        last_error: conn.last_error.clone(),
        consecutive_failures: conn.consecutive_failures,
        last_success_at: conn.last_success_at,
        skipped_ticks: conn.skipped_ticks,
        samples: snapshot.history.len(),
        capacity: snapshot.capacity,
        published_at: snapshot.published_at,
    }))
}

/// GET /api/price - Latest sample and tick-to-tick change
async fn get_price(State(state): State<DashboardState>) -> impl IntoResponse {
    let snapshot = state.telemetry.snapshot();
    Json(ApiResponse::success(PriceResponse {
        sample: snapshot.current().cloned(),
        change: PriceChange::latest(&snapshot.history),
    }))
}

/// GET /api/history?range=1H - Samples inside the window
async fn get_history(
    Query(query): Query<RangeQuery>,
    State(state): State<DashboardState>,
) -> impl IntoResponse {
    let range = match resolve_range(&state, &query) {
        Ok(range) => range,
        Err(e) => return Json(ApiResponse::<HistoryResponse>::error(e)),
    };

    let snapshot = state.telemetry.snapshot();
    let points = snapshot.window(range).to_vec();
    Json(ApiResponse::success(HistoryResponse {
        range,
        date_labels: range.is_long(),
        count: points.len(),
        points,
    }))
}

/// GET /api/stats?range=24H - Statistics over the window
async fn get_stats(
    Query(query): Query<RangeQuery>,
    State(state): State<DashboardState>,
) -> impl IntoResponse {
    let range = match resolve_range(&state, &query) {
        Ok(range) => range,
        Err(e) => return Json(ApiResponse::<StatsResponse>::error(e)),
    };

    let statistics = state.telemetry.snapshot().statistics(range);
    let trend = statistics.as_ref().map(|s| s.trend());
    Json(ApiResponse::success(StatsResponse {
        range,
        statistics,
        trend,
    }))
}

/// GET /api/preferences/range - Stored chart range
async fn get_range_preference(State(state): State<DashboardState>) -> impl IntoResponse {
    let range = load_time_range(state.preferences.as_ref());
    Json(ApiResponse::success(RangePreference { range }))
}

/// PUT /api/preferences/range - Remember the chart range
async fn put_range_preference(
    State(state): State<DashboardState>,
    Json(body): Json<RangePreference>,
) -> impl IntoResponse {
    // Failures are logged inside save_time_range; the selection still applies
    save_time_range(state.preferences.as_ref(), body.range);
    Json(ApiResponse::success(body))
}
