// Prometheus metrics definitions for the trail bot.

use lazy_static::lazy_static;
use prometheus::{Encoder, IntCounter, IntCounterVec, IntGauge, Opts, Registry, TextEncoder};

lazy_static! {
    pub static ref REGISTRY: Registry = Registry::new();

    // ── Gauges ───────────────────────────────────────────────────────

    /// Sessions currently held in memory.
    pub static ref ACTIVE_SESSIONS: IntGauge =
        IntGauge::new("trailbot_active_sessions", "Sessions currently in memory").unwrap();

    /// Trails loaded into the catalog at startup.
    pub static ref CATALOG_TRAILS: IntGauge =
        IntGauge::new("trailbot_catalog_trails", "Trails loaded into the catalog").unwrap();

    // ── Counters ─────────────────────────────────────────────────────

    /// Inbound updates, by kind (command, callback, location, other).
    pub static ref UPDATES_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("trailbot_updates_total", "Inbound updates"),
        &["kind"],
    )
    .unwrap();

    /// Proximity searches executed.
    pub static ref NEARBY_SEARCHES_TOTAL: IntCounter = IntCounter::new(
        "trailbot_nearby_searches_total",
        "Proximity searches executed",
    )
    .unwrap();

    /// Button presses rejected by the per-session debounce.
    pub static ref ACTIONS_DEBOUNCED_TOTAL: IntCounter = IntCounter::new(
        "trailbot_actions_debounced_total",
        "Button presses rejected by debounce",
    )
    .unwrap();

    /// Button presses carrying a stale menu revision.
    pub static ref MENUS_EXPIRED_TOTAL: IntCounter = IntCounter::new(
        "trailbot_menus_expired_total",
        "Button presses with a stale menu revision",
    )
    .unwrap();

    /// Recovered navigation errors, by kind.
    pub static ref NAV_ERRORS_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("trailbot_nav_errors_total", "Recovered navigation errors"),
        &["kind"],
    )
    .unwrap();

    /// Outbound Bot API calls retried after a transient failure.
    pub static ref TRANSPORT_RETRIES_TOTAL: IntCounter = IntCounter::new(
        "trailbot_transport_retries_total",
        "Outbound calls retried after a transient failure",
    )
    .unwrap();

    /// Outbound Bot API calls that failed after the retry.
    pub static ref TRANSPORT_FAILURES_TOTAL: IntCounter = IntCounter::new(
        "trailbot_transport_failures_total",
        "Outbound calls that failed after the retry",
    )
    .unwrap();
}

/// Register all metrics with the custom registry. Call once at startup.
pub fn register_metrics() {
    let collectors: Vec<Box<dyn prometheus::core::Collector>> = vec![
        Box::new(ACTIVE_SESSIONS.clone()),
        Box::new(CATALOG_TRAILS.clone()),
        Box::new(UPDATES_TOTAL.clone()),
        Box::new(NEARBY_SEARCHES_TOTAL.clone()),
        Box::new(ACTIONS_DEBOUNCED_TOTAL.clone()),
        Box::new(MENUS_EXPIRED_TOTAL.clone()),
        Box::new(NAV_ERRORS_TOTAL.clone()),
        Box::new(TRANSPORT_RETRIES_TOTAL.clone()),
        Box::new(TRANSPORT_FAILURES_TOTAL.clone()),
    ];

    for c in collectors {
        REGISTRY.register(c).expect("failed to register metric");
    }
}

/// Serialize all registered metrics to the Prometheus text exposition format.
pub fn gather_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    encoder.encode(&metric_families, &mut buffer).unwrap();
    String::from_utf8(buffer).unwrap()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metric_increments() {
        ACTIVE_SESSIONS.set(2);
        assert_eq!(ACTIVE_SESSIONS.get(), 2);
        ACTIVE_SESSIONS.set(0);

        CATALOG_TRAILS.set(17);
        assert_eq!(CATALOG_TRAILS.get(), 17);

        UPDATES_TOTAL.with_label_values(&["callback"]).inc();
        NEARBY_SEARCHES_TOTAL.inc();
        ACTIONS_DEBOUNCED_TOTAL.inc();
        MENUS_EXPIRED_TOTAL.inc();
        NAV_ERRORS_TOTAL.with_label_values(&["empty_bucket"]).inc();
        TRANSPORT_RETRIES_TOTAL.inc();
        TRANSPORT_FAILURES_TOTAL.inc();
    }

    #[test]
    fn test_gather_metrics_returns_string() {
        // Registering twice would fail, so only gather here.
        let output = gather_metrics();
        assert!(output.is_empty() || output.contains("trailbot_"));
    }
}
