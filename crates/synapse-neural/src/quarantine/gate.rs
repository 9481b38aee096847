//! Quarantine gate: automatic isolation of failing components
//!
//! Like synaptic pruning, a connection that keeps misbehaving is cut off.
//!
//! ```text
//!   ACTIVE ──(any trigger)──> QUARANTINED
//!   QUARANTINED ──(debt < 5, health ≥ 70, ≥ 1h elapsed)──> ACTIVE
//! ```
//!
//! Entry needs any single trigger; exit needs every condition. The asymmetry
//! and the dwell time keep components from flapping between the two states.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use synapse_common::thresholds::{
    CPU_EMERGENCY, DEBT_QUARANTINE, DEBT_WARNING, ERROR_RATE_CRITICAL, HEALTH_PRUNE_BELOW,
    HEALTH_RESTORE_AT, MEMORY_CRITICAL, MIN_QUARANTINE_SECS, TEMPERATURE_SHUTDOWN,
};
use synapse_common::TelemetrySnapshot;
use thiserror::Error;

/// Reason a component is pulled into quarantine
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "trigger", rename_all = "snake_case")]
pub enum QuarantineTrigger {
    DebtExceeded { debt: f64 },
    ErrorRate { error_rate: f64 },
    Overheated { celsius: f64 },
    HealthCollapsed { health: f64 },
    ResourceExhaustion { cpu_usage: f64, memory_usage: f64 },
}

impl std::fmt::Display for QuarantineTrigger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            QuarantineTrigger::DebtExceeded { debt } => {
                write!(f, "IDI ({:.2}) >= {}", debt, DEBT_QUARANTINE)
            }
            QuarantineTrigger::ErrorRate { error_rate } => write!(
                f,
                "Error rate ({:.1}%) >= {}%",
                error_rate * 100.0,
                ERROR_RATE_CRITICAL * 100.0
            ),
            QuarantineTrigger::Overheated { celsius } => {
                write!(f, "Temperature ({:.1}°C) >= {}°C", celsius, TEMPERATURE_SHUTDOWN)
            }
            QuarantineTrigger::HealthCollapsed { health } => {
                write!(f, "Health score ({:.1}) critically low", health)
            }
            QuarantineTrigger::ResourceExhaustion {
                cpu_usage,
                memory_usage,
            } => write!(
                f,
                "System resources critically exhausted (cpu {:.1}%, memory {:.1}%)",
                cpu_usage, memory_usage
            ),
        }
    }
}

/// Why a quarantined component has to stay isolated
#[derive(Debug, Clone, PartialEq, Error, Serialize, Deserialize)]
#[serde(tag = "blocker", rename_all = "snake_case")]
pub enum RestoreBlocker {
    #[error("Component not in quarantine")]
    NotQuarantined,

    #[error("IDI ({debt:.2}) still too high")]
    DebtTooHigh { debt: f64 },

    #[error("Health score ({health:.1}) still too low")]
    HealthTooLow { health: f64 },

    #[error("Minimum quarantine time not met ({elapsed_secs}s of {}s)", MIN_QUARANTINE_SECS)]
    DwellTimeNotMet { elapsed_secs: i64 },
}

pub struct QuarantineGate;

impl QuarantineGate {
    /// Minimum time in quarantine before restoration is considered
    pub fn min_dwell() -> Duration {
        Duration::seconds(MIN_QUARANTINE_SECS)
    }

    pub fn should_quarantine(
        debt: f64,
        error_rate: f64,
        health: f64,
        temperature: Option<f64>,
    ) -> bool {
        !Self::triggers(debt, error_rate, health, temperature).is_empty()
    }

    /// Every tripped trigger, in check order
    pub fn triggers(
        debt: f64,
        error_rate: f64,
        health: f64,
        temperature: Option<f64>,
    ) -> Vec<QuarantineTrigger> {
        let mut tripped = Vec::new();

        if debt >= DEBT_QUARANTINE {
            tripped.push(QuarantineTrigger::DebtExceeded { debt });
        }

        if error_rate >= ERROR_RATE_CRITICAL {
            tripped.push(QuarantineTrigger::ErrorRate { error_rate });
        }

        if let Some(celsius) = temperature {
            if celsius >= TEMPERATURE_SHUTDOWN {
                tripped.push(QuarantineTrigger::Overheated { celsius });
            }
        }

        if health < HEALTH_PRUNE_BELOW {
            tripped.push(QuarantineTrigger::HealthCollapsed { health });
        }

        tripped
    }

    /// [`QuarantineGate::triggers`] read from a snapshot, plus resource
    /// exhaustion (CPU and memory both at their emergency levels)
    pub fn snapshot_triggers(
        debt: f64,
        health: f64,
        snapshot: &TelemetrySnapshot,
    ) -> Vec<QuarantineTrigger> {
        let mut tripped = Self::triggers(
            debt,
            snapshot.error_rate,
            health,
            snapshot.temperature_celsius,
        );

        if snapshot.cpu_usage >= CPU_EMERGENCY && snapshot.memory_usage >= MEMORY_CRITICAL {
            tripped.push(QuarantineTrigger::ResourceExhaustion {
                cpu_usage: snapshot.cpu_usage,
                memory_usage: snapshot.memory_usage,
            });
        }

        tripped
    }

    pub fn can_restore(debt: f64, health: f64, quarantined_at: DateTime<Utc>) -> bool {
        Self::can_restore_at(debt, health, quarantined_at, Utc::now())
    }

    pub fn can_restore_at(
        debt: f64,
        health: f64,
        quarantined_at: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> bool {
        Self::restore_blocker(debt, health, quarantined_at, now).is_none()
    }

    /// First unmet restoration condition, if any
    pub fn restore_blocker(
        debt: f64,
        health: f64,
        quarantined_at: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> Option<RestoreBlocker> {
        if debt.is_nan() || debt >= DEBT_WARNING {
            return Some(RestoreBlocker::DebtTooHigh { debt });
        }

        if health.is_nan() || health < HEALTH_RESTORE_AT {
            return Some(RestoreBlocker::HealthTooLow { health });
        }

        let elapsed = now - quarantined_at;
        if elapsed < Self::min_dwell() {
            return Some(RestoreBlocker::DwellTimeNotMet {
                elapsed_secs: elapsed.num_seconds(),
            });
        }

        None
    }
}

/// Join trigger reasons into one human-readable line
pub fn describe(triggers: &[QuarantineTrigger]) -> String {
    triggers
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_should_quarantine_boundaries() {
        assert!(QuarantineGate::should_quarantine(10.0, 0.0, 100.0, None));
        assert!(!QuarantineGate::should_quarantine(9.99, 0.049, 21.0, Some(94.0)));
    }

    #[test]
    fn test_each_trigger_is_sufficient() {
        assert!(QuarantineGate::should_quarantine(0.0, 0.05, 100.0, None));
        assert!(QuarantineGate::should_quarantine(0.0, 0.0, 100.0, Some(95.0)));
        assert!(QuarantineGate::should_quarantine(0.0, 0.0, 19.9, None));
        assert!(!QuarantineGate::should_quarantine(0.0, 0.0, 20.0, None));
        assert!(!QuarantineGate::should_quarantine(0.0, 0.0, 100.0, None));
    }

    #[test]
    fn test_triggers_collects_all() {
        let tripped = QuarantineGate::triggers(12.0, 0.2, 5.0, Some(101.0));
        assert_eq!(tripped.len(), 4);
        let reason = describe(&tripped);
        assert!(reason.contains("IDI (12.00)"));
        assert!(reason.contains("Error rate (20.0%)"));
        assert!(reason.contains("Temperature"));
        assert!(reason.contains("Health score"));
    }

    #[test]
    fn test_resource_exhaustion_trigger() {
        let snapshot = TelemetrySnapshot::new("plc").with_usage(96.0, 92.0);
        let tripped = QuarantineGate::snapshot_triggers(0.0, 100.0, &snapshot);
        assert!(matches!(
            tripped.as_slice(),
            [QuarantineTrigger::ResourceExhaustion { .. }]
        ));

        // One of the two alone is not exhaustion
        let snapshot = TelemetrySnapshot::new("plc").with_usage(96.0, 50.0);
        assert!(QuarantineGate::snapshot_triggers(0.0, 100.0, &snapshot).is_empty());
    }

    #[test]
    fn test_dwell_time() {
        let start = Utc::now();
        assert!(!QuarantineGate::can_restore_at(
            0.0,
            100.0,
            start,
            start + Duration::minutes(59)
        ));
        assert!(QuarantineGate::can_restore_at(
            4.9,
            70.0,
            start,
            start + Duration::minutes(60)
        ));
    }

    #[test]
    fn test_restore_requires_all_conditions() {
        let start = Utc::now();
        let later = start + Duration::hours(3);
        assert_eq!(
            QuarantineGate::restore_blocker(5.0, 100.0, start, later),
            Some(RestoreBlocker::DebtTooHigh { debt: 5.0 })
        );
        assert_eq!(
            QuarantineGate::restore_blocker(0.0, 69.9, start, later),
            Some(RestoreBlocker::HealthTooLow { health: 69.9 })
        );
        assert_eq!(
            QuarantineGate::restore_blocker(0.0, 100.0, start, start + Duration::seconds(30)),
            Some(RestoreBlocker::DwellTimeNotMet { elapsed_secs: 30 })
        );
        assert_eq!(QuarantineGate::restore_blocker(0.0, 100.0, start, later), None);
    }

    #[test]
    fn test_can_restore_uses_wall_clock() {
        let long_ago = Utc::now() - Duration::hours(2);
        assert!(QuarantineGate::can_restore(1.0, 90.0, long_ago));
        assert!(!QuarantineGate::can_restore(1.0, 90.0, Utc::now()));
    }
}
