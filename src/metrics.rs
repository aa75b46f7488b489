//! Prometheus metrics for wager flow and reconciliation.

use std::time::Instant;

use metrics::{counter, describe_counter, describe_histogram, histogram};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use tracing::debug;

// === Metric Name Constants ===

/// Place-wager latency metric name.
pub const METRIC_PLACE_WAGER_LATENCY: &str = "place_wager_latency_ms";
/// Derived view refresh latency metric name.
pub const METRIC_REFRESH_LATENCY: &str = "refresh_latency_ms";
/// Sessions created counter metric name.
pub const METRIC_SESSIONS_CREATED: &str = "sessions_created_total";
/// Wagers placed counter metric name.
pub const METRIC_WAGERS_PLACED: &str = "wagers_placed_total";
/// Wagers rejected counter metric name.
pub const METRIC_WAGERS_REJECTED: &str = "wagers_rejected_total";
/// Refreshes counter metric name.
pub const METRIC_REFRESHES: &str = "refreshes_total";
/// Change events received counter metric name.
pub const METRIC_FEED_EVENTS: &str = "feed_events_received_total";
/// Feed lag counter metric name.
pub const METRIC_FEED_LAGGED: &str = "feed_lagged_total";

/// Initialize all metric descriptions.
/// Call this once at startup to register metrics with descriptions.
pub fn init_metrics() {
    describe_histogram!(
        METRIC_PLACE_WAGER_LATENCY,
        "Wager validation and append latency in milliseconds"
    );
    describe_histogram!(
        METRIC_REFRESH_LATENCY,
        "Ledger refetch and view recompute latency in milliseconds"
    );

    describe_counter!(METRIC_SESSIONS_CREATED, "Total number of sessions created");
    describe_counter!(METRIC_WAGERS_PLACED, "Total number of wagers recorded");
    describe_counter!(
        METRIC_WAGERS_REJECTED,
        "Total number of wagers rejected, labelled by error kind"
    );
    describe_counter!(METRIC_REFRESHES, "Total number of derived view refreshes");
    describe_counter!(
        METRIC_FEED_EVENTS,
        "Total number of change notifications received"
    );
    describe_counter!(
        METRIC_FEED_LAGGED,
        "Total number of times the feed subscriber fell behind"
    );

    debug!("Metrics initialized");
}

/// Install the Prometheus recorder and return a handle for rendering.
pub fn install_prometheus() -> Result<PrometheusHandle, String> {
    PrometheusBuilder::new()
        .install_recorder()
        .map_err(|e| e.to_string())
}

/// Increment sessions created counter.
pub fn inc_sessions_created() {
    counter!(METRIC_SESSIONS_CREATED).increment(1);
}

/// Increment wagers placed counter.
pub fn inc_wagers_placed() {
    counter!(METRIC_WAGERS_PLACED).increment(1);
}

/// Increment wagers rejected counter.
pub fn inc_wagers_rejected(kind: &'static str) {
    counter!(METRIC_WAGERS_REJECTED, "kind" => kind).increment(1);
}

/// Increment refreshes counter.
pub fn inc_refreshes() {
    counter!(METRIC_REFRESHES).increment(1);
}

/// Increment feed events counter.
pub fn inc_feed_events() {
    counter!(METRIC_FEED_EVENTS).increment(1);
}

/// Increment feed lag counter.
pub fn inc_feed_lagged() {
    counter!(METRIC_FEED_LAGGED).increment(1);
}

/// RAII guard for timing operations.
/// Automatically records latency when dropped.
pub struct LatencyTimer {
    start: Instant,
    metric_name: &'static str,
}

impl LatencyTimer {
    /// Create a new latency timer for the given metric.
    pub fn new(metric_name: &'static str) -> Self {
        Self {
            start: Instant::now(),
            metric_name,
        }
    }

    /// Get elapsed time in milliseconds (without recording).
    pub fn elapsed_ms(&self) -> f64 {
        self.start.elapsed().as_secs_f64() * 1000.0
    }
}

impl Drop for LatencyTimer {
    fn drop(&mut self) {
        histogram!(self.metric_name).record(self.elapsed_ms());
    }
}

/// Create a latency timer for wager placement.
pub fn timer_place_wager() -> LatencyTimer {
    LatencyTimer::new(METRIC_PLACE_WAGER_LATENCY)
}

/// Create a latency timer for view refreshes.
pub fn timer_refresh() -> LatencyTimer {
    LatencyTimer::new(METRIC_REFRESH_LATENCY)
}
