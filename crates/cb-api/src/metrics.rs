//! Prometheus counters exposed on `/metrics`.

use prometheus_client::encoding::text::encode;
use prometheus_client::metrics::counter::Counter;
use prometheus_client::registry::Registry;

pub const CONTENT_TYPE: &str = "application/openmetrics-text; version=1.0.0; charset=utf-8";

pub struct Metrics {
    registry: Registry,
    pub complaints_submitted: Counter,
    pub score_refreshes: Counter,
    pub score_refresh_failures: Counter,
}

impl Metrics {
    pub fn new() -> Self {
        let mut registry = Registry::default();

        let complaints_submitted = Counter::default();
        registry.register(
            "complaints_submitted",
            "Complaints accepted by the create endpoint",
            complaints_submitted.clone(),
        );
        let score_refreshes = Counter::default();
        registry.register(
            "score_refreshes",
            "Open complaints whose priority score was recomputed and stored",
            score_refreshes.clone(),
        );
        let score_refresh_failures = Counter::default();
        registry.register(
            "score_refresh_failures",
            "Recomputed priority scores that could not be stored",
            score_refresh_failures.clone(),
        );

        Self {
            registry,
            complaints_submitted,
            score_refreshes,
            score_refresh_failures,
        }
    }

    pub fn render(&self) -> Result<String, std::fmt::Error> {
        let mut buffer = String::new();
        encode(&mut buffer, &self.registry)?;
        Ok(buffer)
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}
