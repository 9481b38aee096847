//! Neural engine configuration

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use synapse_common::thresholds::{RECOVERY_STEP, RESTORE_THROTTLE};
use synapse_common::{ConfigError, Result};

use crate::balance::{DEFAULT_TARGET_THROUGHPUT, DEFAULT_WINDOW, MAX_WINDOW};
use crate::controller::PidGains;
use crate::events::DEFAULT_EVENT_CAPACITY;

/// Environment variable prefix
pub const ENV_PREFIX: &str = "SYNAPSE_";

/// Neural engine configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NeuralConfig {
    /// Moving-average window for imbalance smoothing (samples)
    pub smoothing_window: usize,
    /// Throughput counted as full software demand (requests/sec)
    pub target_throughput: f64,
    /// Adaptive throttling gains and target utilization
    pub pid: PidGains,
    /// Whether the PID stage adjusts the balance throttle
    pub pid_enabled: bool,
    /// Minimum PID-driven change worth applying
    pub pid_deadband: f64,
    /// Throttle a component resumes at after quarantine
    pub restore_throttle: f64,
    /// Per-tick throttle recovery while the balance stage reports no action
    pub recovery_step: f64,
    /// Broadcast buffer per event subscriber
    pub event_capacity: usize,
}

impl Default for NeuralConfig {
    fn default() -> Self {
        Self {
            smoothing_window: DEFAULT_WINDOW,
            target_throughput: DEFAULT_TARGET_THROUGHPUT,
            pid: PidGains::default(),
            pid_enabled: true,
            pid_deadband: 0.05,
            restore_throttle: RESTORE_THROTTLE,
            recovery_step: RECOVERY_STEP,
            event_capacity: DEFAULT_EVENT_CAPACITY,
        }
    }
}

impl NeuralConfig {
    /// Load configuration from `.env` and `SYNAPSE_*` environment variables
    pub fn load() -> Result<Self> {
        // Try to load .env file
        let _ = dotenvy::dotenv();

        let mut cfg = Self::default();
        cfg.apply_overrides(|key| std::env::var(key).ok())?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Apply overrides from any key/value source (environment, tests)
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        override_from(&lookup, "SMOOTHING_WINDOW", &mut self.smoothing_window)?;
        override_from(&lookup, "TARGET_THROUGHPUT", &mut self.target_throughput)?;
        override_from(&lookup, "PID_KP", &mut self.pid.kp)?;
        override_from(&lookup, "PID_KI", &mut self.pid.ki)?;
        override_from(&lookup, "PID_KD", &mut self.pid.kd)?;
        override_from(&lookup, "PID_TARGET", &mut self.pid.target)?;
        override_from(&lookup, "PID_ENABLED", &mut self.pid_enabled)?;
        override_from(&lookup, "PID_DEADBAND", &mut self.pid_deadband)?;
        override_from(&lookup, "RESTORE_THROTTLE", &mut self.restore_throttle)?;
        override_from(&lookup, "RECOVERY_STEP", &mut self.recovery_step)?;
        override_from(&lookup, "EVENT_CAPACITY", &mut self.event_capacity)?;
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.smoothing_window == 0 {
            return Err(ConfigError::ZeroWindow.into());
        }
        if self.smoothing_window > MAX_WINDOW {
            return Err(ConfigError::WindowTooLarge {
                window: self.smoothing_window,
                max: MAX_WINDOW,
            }
            .into());
        }
        if !(self.target_throughput.is_finite() && self.target_throughput > 0.0) {
            return Err(ConfigError::NonPositiveThroughput(self.target_throughput).into());
        }
        for (name, value) in [
            ("pid.kp", self.pid.kp),
            ("pid.ki", self.pid.ki),
            ("pid.kd", self.pid.kd),
            ("pid.target", self.pid.target),
        ] {
            if !value.is_finite() {
                return Err(ConfigError::NonFinite { name, value }.into());
            }
        }
        check_unit("pid_deadband", self.pid_deadband)?;
        check_unit("restore_throttle", self.restore_throttle)?;
        check_unit("recovery_step", self.recovery_step)?;
        Ok(())
    }
}

fn check_unit(name: &'static str, value: f64) -> Result<()> {
    if !(0.0..=1.0).contains(&value) {
        return Err(ConfigError::OutOfRange {
            name,
            value,
            min: 0.0,
            max: 1.0,
        }
        .into());
    }
    Ok(())
}

fn override_from<F, T>(lookup: &F, key: &str, field: &mut T) -> Result<()>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::fmt::Display,
{
    let full_key = format!("{}{}", ENV_PREFIX, key);
    if let Some(raw) = lookup(&full_key) {
        *field = raw.trim().parse().map_err(|e: T::Err| ConfigError::Parse {
            key: full_key.clone(),
            reason: e.to_string(),
        })?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn source(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_default_is_valid() {
        let cfg = NeuralConfig::default();
        assert!(cfg.validate().is_ok());
        assert_eq!(cfg.smoothing_window, 10);
        assert_eq!(cfg.pid.target, 70.0);
    }

    #[test]
    fn test_overrides() {
        let mut cfg = NeuralConfig::default();
        cfg.apply_overrides(source(&[
            ("SYNAPSE_SMOOTHING_WINDOW", "4"),
            ("SYNAPSE_PID_KP", " 0.8 "),
            ("SYNAPSE_PID_ENABLED", "false"),
        ]))
        .unwrap();
        assert_eq!(cfg.smoothing_window, 4);
        assert_eq!(cfg.pid.kp, 0.8);
        assert!(!cfg.pid_enabled);
    }

    #[test]
    fn test_bad_override_is_reported() {
        let mut cfg = NeuralConfig::default();
        let err = cfg
            .apply_overrides(source(&[("SYNAPSE_TARGET_THROUGHPUT", "lots")]))
            .unwrap_err();
        assert!(err.to_string().contains("SYNAPSE_TARGET_THROUGHPUT"));
    }

    #[test]
    fn test_oversized_window_rejected() {
        let mut cfg = NeuralConfig::default();
        cfg.apply_overrides(source(&[("SYNAPSE_SMOOTHING_WINDOW", "1000000000000")]))
            .unwrap();
        let err = cfg.validate().unwrap_err();
        assert!(err.to_string().contains("at most 10000"));

        cfg.smoothing_window = MAX_WINDOW;
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn test_validate() {
        let cfg = NeuralConfig {
            smoothing_window: 0,
            ..NeuralConfig::default()
        };
        assert!(cfg.validate().is_err());

        let cfg = NeuralConfig {
            target_throughput: -10.0,
            ..NeuralConfig::default()
        };
        assert!(cfg.validate().is_err());

        let mut cfg = NeuralConfig::default();
        cfg.pid.ki = f64::NAN;
        assert!(cfg.validate().is_err());

        let cfg = NeuralConfig {
            restore_throttle: 1.5,
            ..NeuralConfig::default()
        };
        assert!(cfg.validate().is_err());
    }
}
