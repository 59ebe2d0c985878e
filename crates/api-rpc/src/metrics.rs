//! Prometheus metrics for the RPC surface
//!
//! Every limiter and the request decorator register their collectors here.
//! The registry is owned by the server instance, never global.

use prometheus::{
    Encoder, HistogramOpts, HistogramVec, IntCounter, IntGauge, Opts, Registry, TextEncoder,
};

pub const NAMESPACE: &str = "ledger_rpc";
pub const NETWORK_SUBSYSTEM: &str = "network";

#[derive(Clone)]
pub struct Metrics {
    registry: Registry,
    namespace: String,
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new(NAMESPACE)
    }
}

impl Metrics {
    pub fn new(namespace: impl Into<String>) -> Self {
        Self {
            registry: Registry::new(),
            namespace: namespace.into(),
        }
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    fn opts(&self, subsystem: &str, name: &str, help: &str) -> Opts {
        Opts::new(name, help)
            .namespace(self.namespace.clone())
            .subsystem(subsystem)
    }

    pub fn int_gauge(
        &self,
        subsystem: &str,
        name: &str,
        help: &str,
    ) -> prometheus::Result<IntGauge> {
        let gauge = IntGauge::with_opts(self.opts(subsystem, name, help))?;
        self.registry.register(Box::new(gauge.clone()))?;
        Ok(gauge)
    }

    pub fn int_counter(
        &self,
        subsystem: &str,
        name: &str,
        help: &str,
    ) -> prometheus::Result<IntCounter> {
        let counter = IntCounter::with_opts(self.opts(subsystem, name, help))?;
        self.registry.register(Box::new(counter.clone()))?;
        Ok(counter)
    }

    pub fn histogram_vec(
        &self,
        subsystem: &str,
        name: &str,
        help: &str,
        labels: &[&str],
    ) -> prometheus::Result<HistogramVec> {
        let opts = HistogramOpts::new(name, help)
            .namespace(self.namespace.clone())
            .subsystem(subsystem);
        let histogram = HistogramVec::new(opts, labels)?;
        self.registry.register(Box::new(histogram.clone()))?;
        Ok(histogram)
    }

    /// Text exposition of everything registered so far
    pub fn encode(&self) -> prometheus::Result<String> {
        let mut buffer = Vec::new();
        TextEncoder::new().encode(&self.registry.gather(), &mut buffer)?;
        String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_names_are_prefixed() {
        let metrics = Metrics::default();
        let gauge = metrics
            .int_gauge(NETWORK_SUBSYSTEM, "get_health_inflight_requests", "in-flight")
            .unwrap();
        gauge.set(3);

        let text = metrics.encode().unwrap();
        assert!(text.contains("ledger_rpc_network_get_health_inflight_requests 3"));
    }

    #[test]
    fn test_duplicate_registration_fails() {
        let metrics = Metrics::default();
        metrics
            .int_counter(NETWORK_SUBSYSTEM, "get_health_execution_threshold_limit", "limit")
            .unwrap();
        assert!(metrics
            .int_counter(NETWORK_SUBSYSTEM, "get_health_execution_threshold_limit", "limit")
            .is_err());
    }
}
