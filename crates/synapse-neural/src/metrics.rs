//! Prometheus metrics for the decision engine

use prometheus::{Histogram, HistogramOpts, IntCounter, IntCounterVec, IntGauge, Opts, Registry};
use synapse_common::{Result, SynapseError};

fn metrics_err(err: prometheus::Error) -> SynapseError {
    SynapseError::Metrics(err.to_string())
}

/// Engine-wide counters and gauges
#[derive(Clone)]
pub struct EngineMetrics {
    pub evaluations_total: IntCounter,
    pub rejected_snapshots_total: IntCounter,
    pub mitigations_total: IntCounterVec,
    pub quarantines_total: IntCounter,
    pub restores_total: IntCounter,
    pub quarantined_components: IntGauge,
    pub final_throttle: Histogram,
}

impl EngineMetrics {
    pub fn new() -> Result<Self> {
        Ok(Self {
            evaluations_total: IntCounter::new(
                "synapse_neural_evaluations_total",
                "Telemetry snapshots evaluated",
            )
            .map_err(metrics_err)?,
            rejected_snapshots_total: IntCounter::new(
                "synapse_neural_rejected_snapshots_total",
                "Snapshots rejected for out-of-domain readings",
            )
            .map_err(metrics_err)?,
            mitigations_total: IntCounterVec::new(
                Opts::new(
                    "synapse_neural_mitigations_total",
                    "Mitigation verdicts issued, by action",
                ),
                &["action"],
            )
            .map_err(metrics_err)?,
            quarantines_total: IntCounter::new(
                "synapse_neural_quarantines_total",
                "Components moved into quarantine",
            )
            .map_err(metrics_err)?,
            restores_total: IntCounter::new(
                "synapse_neural_restores_total",
                "Components restored from quarantine",
            )
            .map_err(metrics_err)?,
            quarantined_components: IntGauge::new(
                "synapse_neural_quarantined_components",
                "Components currently quarantined",
            )
            .map_err(metrics_err)?,
            final_throttle: Histogram::with_opts(
                HistogramOpts::new(
                    "synapse_neural_final_throttle",
                    "Final throttle level per evaluation",
                )
                .buckets(vec![0.0, 0.1, 0.2, 0.3, 0.5, 0.7, 0.85, 1.0]),
            )
            .map_err(metrics_err)?,
        })
    }

    pub fn register(&self, registry: &Registry) -> Result<()> {
        registry
            .register(Box::new(self.evaluations_total.clone()))
            .map_err(metrics_err)?;
        registry
            .register(Box::new(self.rejected_snapshots_total.clone()))
            .map_err(metrics_err)?;
        registry
            .register(Box::new(self.mitigations_total.clone()))
            .map_err(metrics_err)?;
        registry
            .register(Box::new(self.quarantines_total.clone()))
            .map_err(metrics_err)?;
        registry
            .register(Box::new(self.restores_total.clone()))
            .map_err(metrics_err)?;
        registry
            .register(Box::new(self.quarantined_components.clone()))
            .map_err(metrics_err)?;
        registry
            .register(Box::new(self.final_throttle.clone()))
            .map_err(metrics_err)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register() {
        let metrics = EngineMetrics::new().unwrap();
        let registry = Registry::new();
        metrics.register(&registry).unwrap();

        metrics.evaluations_total.inc();
        metrics.mitigations_total.with_label_values(&["BRAKE"]).inc();

        let names: Vec<_> = registry
            .gather()
            .iter()
            .map(|family| family.get_name().to_string())
            .collect();
        assert!(names.contains(&"synapse_neural_evaluations_total".to_string()));
        assert!(names.contains(&"synapse_neural_mitigations_total".to_string()));

        // Same collectors cannot be registered twice
        assert!(metrics.register(&registry).is_err());
    }
}
