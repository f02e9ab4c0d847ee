//! Prometheus metrics for the History Atlas API.

use prometheus::{
    register_histogram_vec_with_registry, register_int_counter_with_registry, Encoder,
    HistogramVec, IntCounter, Registry, TextEncoder,
};

/// Metrics collector for the History Atlas service.
///
/// Each instance owns its registry, so several collectors can live in one
/// process (one per test, for instance) without clashing on names.
#[derive(Clone)]
pub struct Metrics {
    registry: Registry,
    store_queries: IntCounter,
    store_errors: IntCounter,
    junction_short_circuits: IntCounter,
    store_latency: HistogramVec,
}

impl Metrics {
    /// Create a new metrics instance.
    pub fn new() -> anyhow::Result<Self> {
        let registry = Registry::new();

        let store_queries = register_int_counter_with_registry!(
            "history_atlas_store_queries_total",
            "Total number of queries issued against the remote store",
            registry
        )?;

        let store_errors = register_int_counter_with_registry!(
            "history_atlas_store_errors_total",
            "Total number of failed remote store queries",
            registry
        )?;

        let junction_short_circuits = register_int_counter_with_registry!(
            "history_atlas_junction_short_circuits_total",
            "Junction lookups that found no rows and skipped the related fetch",
            registry
        )?;

        let store_latency = register_histogram_vec_with_registry!(
            "history_atlas_store_latency_seconds",
            "Remote store query latency in seconds",
            &["collection"],
            registry
        )?;

        Ok(Self {
            registry,
            store_queries,
            store_errors,
            junction_short_circuits,
            store_latency,
        })
    }

    /// Increment the store query counter.
    pub fn inc_store_queries(&self) {
        self.store_queries.inc();
    }

    /// Increment the store error counter.
    pub fn inc_store_errors(&self) {
        self.store_errors.inc();
    }

    /// Increment the empty-junction short-circuit counter.
    pub fn inc_junction_short_circuits(&self) {
        self.junction_short_circuits.inc();
    }

    /// Record store latency for a collection.
    pub fn observe_store_latency(&self, collection: &str, duration_secs: f64) {
        self.store_latency
            .with_label_values(&[collection])
            .observe(duration_secs);
    }

    /// Get Prometheus metrics as a string.
    pub fn gather(&self) -> anyhow::Result<String> {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        encoder.encode(&metric_families, &mut buffer)?;
        Ok(String::from_utf8(buffer)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_instances_do_not_collide() {
        let first = Metrics::new().unwrap();
        let second = Metrics::new().unwrap();
        first.inc_store_queries();
        first.inc_junction_short_circuits();
        second.observe_store_latency("routes", 0.01);

        let text = first.gather().unwrap();
        assert!(text.contains("history_atlas_store_queries_total 1"));
        assert!(text.contains("history_atlas_junction_short_circuits_total 1"));

        let other = second.gather().unwrap();
        assert!(other.contains("history_atlas_store_queries_total 0"));
        assert!(other.contains("collection=\"routes\""));
    }
}
