//! System-wide health summary

use serde::{Deserialize, Serialize};
use synapse_common::thresholds::DEBT_WARNING;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HealthStatus {
    NoComponents,
    Healthy,
    Warning,
    Critical,
}

/// What the summary needs to know about one component
#[derive(Debug, Clone, PartialEq)]
pub struct ComponentHealth {
    pub component_id: String,
    pub health_score: f64,
    pub debt_score: f64,
    pub quarantined: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SystemHealth {
    pub status: HealthStatus,
    /// Mean health score, one decimal
    pub average_health: f64,
    pub total_components: usize,
    pub healthy_count: usize,
    pub warning_count: usize,
    pub quarantined_count: usize,
    pub quarantined_components: Vec<String>,
}

impl SystemHealth {
    pub fn empty() -> Self {
        Self {
            status: HealthStatus::NoComponents,
            average_health: 0.0,
            total_components: 0,
            healthy_count: 0,
            warning_count: 0,
            quarantined_count: 0,
            quarantined_components: Vec::new(),
        }
    }

    /// Any quarantined component makes the system critical; otherwise any
    /// component at or above the warning debt makes it a warning.
    pub fn summarize<I>(components: I) -> Self
    where
        I: IntoIterator<Item = ComponentHealth>,
    {
        let mut summary = Self::empty();
        let mut total_health = 0.0;

        for component in components {
            summary.total_components += 1;
            total_health += component.health_score;

            if component.quarantined {
                summary.quarantined_components.push(component.component_id);
            } else if component.debt_score >= DEBT_WARNING {
                summary.warning_count += 1;
            } else {
                summary.healthy_count += 1;
            }
        }

        if summary.total_components == 0 {
            return summary;
        }

        summary.quarantined_components.sort();
        summary.quarantined_count = summary.quarantined_components.len();
        let average = total_health / summary.total_components as f64;
        summary.average_health = (average * 10.0).round() / 10.0;
        summary.status = if summary.quarantined_count > 0 {
            HealthStatus::Critical
        } else if summary.warning_count > 0 {
            HealthStatus::Warning
        } else {
            HealthStatus::Healthy
        };
        summary
    }
}
