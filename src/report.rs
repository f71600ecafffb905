//! Periodic console summary of the price feed
//!
//! A presentation consumer like any other: reads published snapshots and the
//! stored chart range, never touches acquisition state.

use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio_stream::StreamExt;
use tracing::{debug, info, warn};

use crate::analytics::{PriceChange, TimeRange};
use crate::oracle::{TelemetryHandle, TelemetrySnapshot};
use crate::persistence::{load_time_range, PreferenceStore};
use crate::types::SampleSource;

/// One-line summary of `snapshot` over `range`
pub fn summary_line(snapshot: &TelemetrySnapshot, range: TimeRange) -> String {
    let link = if snapshot.connectivity.is_connected() {
        "connected".to_string()
    } else {
        match &snapshot.connectivity.last_error {
            Some(err) => format!("disconnected ({err})"),
            None => "disconnected".to_string(),
        }
    };

    let Some(current) = snapshot.current() else {
        return format!("KALE: no data yet | {link}");
    };

    let Some(stats) = snapshot.statistics(range) else {
        return format!(
            "KALE ${:.6} [{}] | {range}: no samples in range | {}/{} retained | {link}",
            current.price(),
            current.source(),
            snapshot.history.len(),
            snapshot.capacity,
        );
    };

    let sources = SampleSource::ALL
        .iter()
        .map(|s| {
            let share = stats
                .source_distribution
                .get(s)
                .map_or(0.0, |share| share.fraction * 100.0);
            format!("{s} {share:.1}%")
        })
        .collect::<Vec<_>>()
        .join(", ");

    format!(
        "KALE ${:.6} [{}] | {range}: {:+.6} ({:+.2}%) low {:.6} high {:.6} avg {:.6} range {:.6} | {} pts ({sources}) | {link}",
        stats.current,
        current.source(),
        stats.delta,
        stats.delta_percent,
        stats.min,
        stats.max,
        stats.average,
        stats.volatility,
        stats.count,
    )
}

/// Tick-to-tick change when `snapshot` carries a sample not seen before.
///
/// Failure publications leave `last_success_at` untouched and yield `None`.
pub fn new_sample_change(
    snapshot: &TelemetrySnapshot,
    last_seen: &mut Option<DateTime<Utc>>,
) -> Option<PriceChange> {
    let success_at = snapshot.connectivity.last_success_at?;
    if *last_seen == Some(success_at) {
        return None;
    }
    *last_seen = Some(success_at);
    PriceChange::latest(&snapshot.history)
}

/// Log a summary every `interval` and each new sample at debug level
pub async fn run_summary_logger(
    telemetry: TelemetryHandle,
    preferences: Arc<dyn PreferenceStore>,
    interval: Duration,
    mut shutdown: watch::Receiver<bool>,
) {
    let mut ticker = tokio::time::interval(interval.max(Duration::from_secs(1)));
    let mut updates = telemetry.updates();
    let mut last_seen = None;

    loop {
        tokio::select! {
            _ = shutdown.changed() => break,
            _ = ticker.tick() => {
                let range = load_time_range(preferences.as_ref());
                let snapshot = telemetry.snapshot();
                if snapshot.connectivity.is_connected() || snapshot.current().is_none() {
                    info!("{}", summary_line(&snapshot, range));
                } else {
                    warn!("{}", summary_line(&snapshot, range));
                }
            }
            update = updates.next() => {
                let Some(snapshot) = update else { break };
                if let Some(change) = new_sample_change(&snapshot, &mut last_seen) {
                    debug!(
                        price = change.current,
                        change = change.change,
                        change_pct = change.change_percent,
                        trend = %change.trend,
                        "New KALE sample"
                    );
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Sample;
    use chrono::Duration as ChronoDuration;

    #[test]
    fn empty_snapshot_reports_no_data() {
        let snapshot = TelemetrySnapshot::empty(50);
        assert_eq!(
            summary_line(&snapshot, TimeRange::Day),
            "KALE: no data yet | disconnected"
        );
    }

    #[test]
    fn summary_includes_delta_and_sources() {
        let mut snapshot = TelemetrySnapshot::empty(50);
        let now = Utc::now();
        snapshot.history = vec![
            Sample::new(0.095, now - ChronoDuration::minutes(2), SampleSource::Stellar).unwrap(),
            Sample::new(0.100, now, SampleSource::Csv).unwrap(),
        ];
        snapshot.connectivity.record_success(now);

        let line = summary_line(&snapshot, TimeRange::OneHour);
        assert!(line.starts_with("KALE $0.100000 [csv]"), "{line}");
        assert!(line.contains("+0.005000 (+5.26%)"), "{line}");
        assert!(line.contains("stellar 50.0%, csv 50.0%, hardcoded 0.0%"), "{line}");
        assert!(line.ends_with("| connected"), "{line}");
    }

    #[test]
    fn stale_history_outside_range_is_reported() {
        let mut snapshot = TelemetrySnapshot::empty(50);
        snapshot.history = vec![Sample::new(
            0.095,
            Utc::now() - ChronoDuration::hours(3),
            SampleSource::Hardcoded,
        )
        .unwrap()];
        snapshot.connectivity.record_failure("fetch timed out after 10000ms".into());

        let line = summary_line(&snapshot, TimeRange::OneHour);
        assert!(line.contains("1H: no samples in range"), "{line}");
        assert!(line.ends_with("disconnected (fetch timed out after 10000ms)"), "{line}");
    }

    #[test]
    fn failed_fetch_does_not_repeat_the_last_sample() {
        let now = Utc::now();
        let mut snapshot = TelemetrySnapshot::empty(50);
        snapshot.history = vec![
            Sample::new(0.095, now - ChronoDuration::seconds(10), SampleSource::Csv).unwrap(),
            Sample::new(0.096, now, SampleSource::Csv).unwrap(),
        ];
        snapshot.connectivity.record_success(now);

        let mut last_seen = None;
        let change = new_sample_change(&snapshot, &mut last_seen).unwrap();
        assert_eq!(change.current, 0.096);

        // Same history republished after a failure
        snapshot.connectivity.record_failure("upstream returned HTTP 502".into());
        assert!(new_sample_change(&snapshot, &mut last_seen).is_none());

        snapshot
            .history
            .push(Sample::new(0.094, now + ChronoDuration::seconds(10), SampleSource::Stellar).unwrap());
        snapshot
            .connectivity
            .record_success(now + ChronoDuration::seconds(10));
        let change = new_sample_change(&snapshot, &mut last_seen).unwrap();
        assert_eq!(change.previous, 0.096);
        assert_eq!(change.current, 0.094);
    }

    #[test]
    fn nothing_to_log_before_first_success() {
        let mut snapshot = TelemetrySnapshot::empty(50);
        snapshot.connectivity.record_failure("transport error: refused".into());
        let mut last_seen = None;
        assert!(new_sample_change(&snapshot, &mut last_seen).is_none());
        assert!(last_seen.is_none());
    }
}
