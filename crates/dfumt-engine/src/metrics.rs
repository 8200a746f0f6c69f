//! Prometheus metrics for the action facade

use prometheus::{Histogram, HistogramOpts, IntCounter, Registry};

/// Counters and latency histogram for dispatched actions
#[derive(Clone)]
pub struct DispatchMetrics {
    pub actions_total: IntCounter,
    pub action_failures: IntCounter,
    pub action_timeouts: IntCounter,
    pub action_duration_seconds: Histogram,
}

impl DispatchMetrics {
    pub fn new() -> prometheus::Result<Self> {
        Ok(Self {
            actions_total: IntCounter::new("dfumt_actions_total", "Total actions dispatched")?,
            action_failures: IntCounter::new(
                "dfumt_action_failures_total",
                "Actions that returned a failure response",
            )?,
            action_timeouts: IntCounter::new(
                "dfumt_action_timeouts_total",
                "Actions abandoned after the execution timeout",
            )?,
            action_duration_seconds: Histogram::with_opts(
                HistogramOpts::new("dfumt_action_duration_seconds", "Action execution duration")
                    .buckets(vec![0.0005, 0.001, 0.005, 0.01, 0.05, 0.1, 0.5, 1.0, 5.0]),
            )?,
        })
    }

    pub fn register(&self, registry: &Registry) -> prometheus::Result<()> {
        registry.register(Box::new(self.actions_total.clone()))?;
        registry.register(Box::new(self.action_failures.clone()))?;
        registry.register(Box::new(self.action_timeouts.clone()))?;
        registry.register(Box::new(self.action_duration_seconds.clone()))?;
        Ok(())
    }
}
