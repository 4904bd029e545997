use lazy_static::lazy_static;
use prometheus::{
    CounterVec, Encoder, Gauge, Histogram, HistogramOpts, IntCounterVec, Opts, Registry,
    TextEncoder,
};
use std::time::Duration;

/// Metric name prefix for all SongMatch metrics
const PREFIX: &str = "songmatch";

lazy_static! {
    pub static ref REGISTRY: Registry = Registry::new();

    // Recommendation Metrics
    pub static ref RECOMMENDATION_DECISIONS_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new(
            format!("{PREFIX}_recommendation_decisions_total"),
            "Filter decisions on candidate songs"
        ),
        &["decision"]
    ).expect("Failed to create recommendation_decisions_total metric");

    pub static ref RECOMMENDATION_REQUEST_DURATION_SECONDS: Histogram = Histogram::with_opts(
        HistogramOpts::new(
            format!("{PREFIX}_recommendation_request_duration_seconds"),
            "Recommendation request duration in seconds"
        )
        .buckets(vec![0.05, 0.1, 0.5, 1.0, 2.0, 5.0, 10.0, 30.0])
    ).expect("Failed to create recommendation_request_duration_seconds metric");

    // Supplier Metrics
    pub static ref SUPPLIER_ATTEMPTS_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new(
            format!("{PREFIX}_supplier_attempts_total"),
            "Candidate fetch attempts by outcome"
        ),
        &["outcome"]
    ).expect("Failed to create supplier_attempts_total metric");

    // Taste Profile Metrics
    pub static ref PROFILE_REBUILDS_TOTAL: CounterVec = CounterVec::new(
        Opts::new(format!("{PREFIX}_profile_rebuilds_total"), "Taste profile rebuilds"),
        &["result"]
    ).expect("Failed to create profile_rebuilds_total metric");

    pub static ref PROFILE_REBUILD_DURATION_SECONDS: Histogram = Histogram::with_opts(
        HistogramOpts::new(
            format!("{PREFIX}_profile_rebuild_duration_seconds"),
            "Taste profile rebuild duration in seconds"
        )
        .buckets(vec![0.001, 0.01, 0.05, 0.1, 0.5, 1.0, 5.0])
    ).expect("Failed to create profile_rebuild_duration_seconds metric");

    // Rating Metrics
    pub static ref RATINGS_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new(format!("{PREFIX}_ratings_total"), "Ratings applied by kind"),
        &["kind"]
    ).expect("Failed to create ratings_total metric");

    // Catalog Metrics
    pub static ref CATALOG_SONGS_TOTAL: Gauge = Gauge::new(
        format!("{PREFIX}_catalog_songs_total"),
        "Songs in the catalog"
    ).expect("Failed to create catalog_songs_total metric");
}

/// Initialize all metrics and register them with the Prometheus registry
pub fn init_metrics() {
    // Ignore errors if already registered (for tests)
    let _ = REGISTRY.register(Box::new(RECOMMENDATION_DECISIONS_TOTAL.clone()));
    let _ = REGISTRY.register(Box::new(RECOMMENDATION_REQUEST_DURATION_SECONDS.clone()));
    let _ = REGISTRY.register(Box::new(SUPPLIER_ATTEMPTS_TOTAL.clone()));
    let _ = REGISTRY.register(Box::new(PROFILE_REBUILDS_TOTAL.clone()));
    let _ = REGISTRY.register(Box::new(PROFILE_REBUILD_DURATION_SECONDS.clone()));
    let _ = REGISTRY.register(Box::new(RATINGS_TOTAL.clone()));
    let _ = REGISTRY.register(Box::new(CATALOG_SONGS_TOTAL.clone()));

    tracing::debug!("Metrics system initialized");
}

pub fn record_decision(decision: &str) {
    RECOMMENDATION_DECISIONS_TOTAL
        .with_label_values(&[decision])
        .inc();
}

pub fn record_recommendation_request(duration: Duration) {
    RECOMMENDATION_REQUEST_DURATION_SECONDS.observe(duration.as_secs_f64());
}

pub fn record_supplier_attempt(outcome: &str) {
    SUPPLIER_ATTEMPTS_TOTAL.with_label_values(&[outcome]).inc();
}

pub fn record_profile_rebuild(success: bool, duration: Duration) {
    let result = if success { "success" } else { "failure" };
    PROFILE_REBUILDS_TOTAL.with_label_values(&[result]).inc();
    PROFILE_REBUILD_DURATION_SECONDS.observe(duration.as_secs_f64());
}

pub fn record_rating(kind: &str) {
    RATINGS_TOTAL.with_label_values(&[kind]).inc();
}

pub fn set_catalog_size(songs: usize) {
    CATALOG_SONGS_TOTAL.set(songs as f64);
}

/// Renders every registered metric in the Prometheus text format.
pub fn gather_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = vec![];
    match encoder.encode(&metric_families, &mut buffer) {
        Ok(()) => String::from_utf8(buffer).unwrap_or_default(),
        Err(e) => {
            tracing::error!("Failed to encode metrics: {}", e);
            String::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_initialization() {
        init_metrics();
        let metric_families = REGISTRY.gather();
        assert!(!metric_families.is_empty(), "Metrics should be registered");
    }

    #[test]
    fn test_record_decision() {
        init_metrics();
        let before = RECOMMENDATION_DECISIONS_TOTAL
            .with_label_values(&["rejected"])
            .get();
        record_decision("rejected");
        let after = RECOMMENDATION_DECISIONS_TOTAL
            .with_label_values(&["rejected"])
            .get();
        assert!(after > before);
    }

    #[test]
    fn test_gather_metrics_text_format() {
        init_metrics();
        record_rating("like");
        let text = gather_metrics();
        assert!(text.contains("songmatch_ratings_total"));
    }
}
