//! Integration debt: IDI = days × (loc / 1000) × (deps / 10)

use serde::{Deserialize, Serialize};
use synapse_common::thresholds::{DEBT_HEALTHY, DEBT_QUARANTINE, DEBT_WARNING};
use synapse_common::SeverityLevel;

/// Change-risk inputs of a component
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct IntegrationStats {
    pub days_since_integration: i64,
    pub loc_changed: i64,
    pub dependencies: i64,
}

impl IntegrationStats {
    pub fn new(days_since_integration: i64, loc_changed: i64, dependencies: i64) -> Self {
        Self {
            days_since_integration,
            loc_changed,
            dependencies,
        }
    }

    pub fn score(&self) -> f64 {
        DebtScorer::score(self.days_since_integration, self.loc_changed, self.dependencies)
    }

    /// Projected debt `days_ahead` days out at the current change rate
    pub fn predict(&self, days_ahead: i64) -> f64 {
        DebtScorer::predict_from_trend(
            self.days_since_integration,
            self.loc_changed,
            self.dependencies,
            days_ahead,
        )
    }
}

pub struct DebtScorer;

impl DebtScorer {
    /// Calculate debt. Negative days and loc count as zero; fewer than one
    /// dependency counts as one.
    pub fn score(days: i64, loc_changed: i64, dependencies: i64) -> f64 {
        let d = days.max(0) as f64;
        let l = loc_changed.max(0) as f64 / 1000.0;
        let dep = dependencies.max(1) as f64 / 10.0;
        d * l * dep
    }

    pub fn severity(debt: f64) -> SeverityLevel {
        if debt < DEBT_HEALTHY {
            SeverityLevel::Healthy
        } else if debt < DEBT_WARNING {
            SeverityLevel::Warning
        } else if debt < DEBT_QUARANTINE {
            SeverityLevel::Critical
        } else {
            SeverityLevel::Quarantine
        }
    }

    /// Extrapolate days and loc linearly, then score
    pub fn predict(
        days: i64,
        loc_changed: i64,
        dependencies: i64,
        days_ahead: i64,
        daily_loc_rate: f64,
    ) -> f64 {
        let days_ahead = days_ahead.max(0);
        let future_days = days.saturating_add(days_ahead);
        let future_loc = loc_changed.saturating_add((daily_loc_rate * days_ahead as f64).round() as i64);
        Self::score(future_days, future_loc, dependencies)
    }

    /// [`DebtScorer::predict`] with the rate taken from the change history so far
    pub fn predict_from_trend(days: i64, loc_changed: i64, dependencies: i64, days_ahead: i64) -> f64 {
        let daily_loc_rate = loc_changed.max(0) as f64 / days.max(1) as f64;
        Self::predict(days, loc_changed, dependencies, days_ahead, daily_loc_rate)
    }
}
