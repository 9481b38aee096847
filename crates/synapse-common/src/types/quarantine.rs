//! QuarantineRecord - bookkeeping for a component held in quarantine

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Active quarantine of one component
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuarantineRecord {
    pub component_id: String,
    /// Why the component was isolated
    pub reason: String,
    pub quarantined_at: DateTime<Utc>,
    pub debt_score_at_quarantine: f64,
    /// Health score (0-100) when isolated
    pub health_at_quarantine: f64,
}

impl QuarantineRecord {
    pub fn new(
        component_id: impl Into<String>,
        reason: impl Into<String>,
        debt_score: f64,
        health: f64,
    ) -> Self {
        Self {
            component_id: component_id.into(),
            reason: reason.into(),
            quarantined_at: Utc::now(),
            debt_score_at_quarantine: debt_score,
            health_at_quarantine: health,
        }
    }

    /// Override the quarantine start time
    pub fn at(mut self, quarantined_at: DateTime<Utc>) -> Self {
        self.quarantined_at = quarantined_at;
        self
    }

    /// Time spent in quarantine as of `now`
    pub fn elapsed(&self, now: DateTime<Utc>) -> Duration {
        now - self.quarantined_at
    }
}
