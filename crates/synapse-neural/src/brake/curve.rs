//! Debt brake: automatic slowdown as integration debt rises
//!
//! ```text
//! throttle
//!   1.0 ─────┐
//!            └╲          healthy → warning
//!   0.7        ╲──╲
//!                  ╲     hard brake (5.0 - 7.0)
//!   0.3             ╲──╲
//!   0.1                 ╲┐ near stop (7.0 - 10.0)
//!   0.0                  └──── quarantine
//!        0   3   5   7   10    debt
//! ```

use synapse_common::thresholds::{DEBT_HARD_BRAKE, DEBT_HEALTHY, DEBT_QUARANTINE, DEBT_WARNING};
use synapse_common::{MitigationAction, MitigationVerdict, SeverityLevel};

use crate::debt::DebtScorer;

pub struct BrakeCurve;

impl BrakeCurve {
    /// Throttle level for a debt score (0.0 = stopped, 1.0 = full speed)
    pub fn throttle_level(debt: f64) -> f64 {
        if debt.is_nan() {
            return 0.0;
        }

        if debt < DEBT_HEALTHY {
            return 1.0;
        }

        if debt < DEBT_WARNING {
            return 1.0 - Self::ratio(debt, DEBT_HEALTHY, DEBT_WARNING) * 0.3;
        }

        if debt < DEBT_HARD_BRAKE {
            return 0.7 - Self::ratio(debt, DEBT_WARNING, DEBT_HARD_BRAKE) * 0.4;
        }

        if debt < DEBT_QUARANTINE {
            return 0.3 - Self::ratio(debt, DEBT_HARD_BRAKE, DEBT_QUARANTINE) * 0.2;
        }

        0.0
    }

    fn ratio(debt: f64, low: f64, high: f64) -> f64 {
        (debt - low) / (high - low)
    }

    /// Brake verdict for a component: action from the severity tier, throttle
    /// from the curve
    pub fn apply_brake(
        component_id: &str,
        debt: f64,
        days_since_integration: i64,
        loc_changed: i64,
        dependencies: i64,
    ) -> MitigationVerdict {
        let severity = DebtScorer::severity(debt);

        let (action, reason) = match severity {
            SeverityLevel::Quarantine => (
                MitigationAction::Quarantine,
                "IDI exceeded quarantine threshold - component isolated",
            ),
            SeverityLevel::Critical => (
                MitigationAction::Brake,
                "IDI in critical zone - hard brake applied",
            ),
            SeverityLevel::Warning => (
                MitigationAction::Throttle,
                "IDI in warning zone - soft throttle applied",
            ),
            SeverityLevel::Healthy => (
                MitigationAction::None,
                "IDI healthy - no mitigation needed",
            ),
        };

        tracing::trace!(
            component_id,
            debt,
            %severity,
            days_since_integration,
            loc_changed,
            dependencies,
            "Applied debt brake"
        );

        MitigationVerdict::new(action, component_id, reason)
            .with_debt_score(debt)
            .with_throttle(Self::throttle_level(debt))
    }
}
