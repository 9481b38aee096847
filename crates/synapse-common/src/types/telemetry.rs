//! TelemetrySnapshot - one sampling tick of a monitored component
//!
//! Snapshots are produced by an external collector and are never mutated by
//! the engine. Hardware-only readings (temperature, power) are optional; an
//! absent reading means "no penalty", never zero.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::TelemetryError;

/// Component class
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComponentKind {
    Hardware,
    #[default]
    Software,
    Firmware,
    Hybrid,
}

impl std::fmt::Display for ComponentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ComponentKind::Hardware => write!(f, "hardware"),
            ComponentKind::Software => write!(f, "software"),
            ComponentKind::Firmware => write!(f, "firmware"),
            ComponentKind::Hybrid => write!(f, "hybrid"),
        }
    }
}

/// Hardware and software telemetry for a single component
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TelemetrySnapshot {
    /// Monitored component
    pub component_id: String,
    /// Sample time; receipt time when the producer omits it
    #[serde(default = "Utc::now")]
    pub timestamp: DateTime<Utc>,
    /// CPU usage (0-100)
    pub cpu_usage: f64,
    /// Memory usage (0-100)
    pub memory_usage: f64,
    /// I/O latency in milliseconds
    pub io_latency_ms: f64,
    /// Network latency in milliseconds
    pub network_latency_ms: f64,
    /// Error rate (0-1)
    pub error_rate: f64,
    /// Requests per second
    pub throughput: f64,
    /// Hardware only (Celsius)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature_celsius: Option<f64>,
    /// Hardware only (Watts)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub power_watts: Option<f64>,
}

impl TelemetrySnapshot {
    /// Create an idle snapshot stamped with the current time
    pub fn new(component_id: impl Into<String>) -> Self {
        Self {
            component_id: component_id.into(),
            timestamp: Utc::now(),
            cpu_usage: 0.0,
            memory_usage: 0.0,
            io_latency_ms: 0.0,
            network_latency_ms: 0.0,
            error_rate: 0.0,
            throughput: 0.0,
            temperature_celsius: None,
            power_watts: None,
        }
    }

    /// Set CPU and memory usage
    pub fn with_usage(mut self, cpu_usage: f64, memory_usage: f64) -> Self {
        self.cpu_usage = cpu_usage;
        self.memory_usage = memory_usage;
        self
    }

    /// Set I/O and network latency
    pub fn with_latency(mut self, io_latency_ms: f64, network_latency_ms: f64) -> Self {
        self.io_latency_ms = io_latency_ms;
        self.network_latency_ms = network_latency_ms;
        self
    }

    /// Set request throughput
    pub fn with_throughput(mut self, throughput: f64) -> Self {
        self.throughput = throughput;
        self
    }

    /// Set error rate
    pub fn with_error_rate(mut self, error_rate: f64) -> Self {
        self.error_rate = error_rate;
        self
    }

    /// Attach a temperature reading
    pub fn with_temperature(mut self, celsius: f64) -> Self {
        self.temperature_celsius = Some(celsius);
        self
    }

    /// Attach a power reading
    pub fn with_power(mut self, watts: f64) -> Self {
        self.power_watts = Some(watts);
        self
    }

    /// Override the sample time
    pub fn at(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = timestamp;
        self
    }

    /// Whether hardware-only readings are present
    pub fn is_hardware_sample(&self) -> bool {
        self.temperature_celsius.is_some() || self.power_watts.is_some()
    }

    /// Validate every reading against its documented domain
    pub fn validate(&self) -> Result<(), TelemetryError> {
        if self.component_id.is_empty() {
            return Err(TelemetryError::MissingComponentId);
        }
        check_range("cpu_usage", self.cpu_usage, 0.0, 100.0)?;
        check_range("memory_usage", self.memory_usage, 0.0, 100.0)?;
        check_range("error_rate", self.error_rate, 0.0, 1.0)?;
        check_non_negative("io_latency_ms", self.io_latency_ms)?;
        check_non_negative("network_latency_ms", self.network_latency_ms)?;
        check_non_negative("throughput", self.throughput)?;
        if let Some(temp) = self.temperature_celsius {
            if !temp.is_finite() {
                return Err(TelemetryError::NotFinite {
                    field: "temperature_celsius",
                });
            }
        }
        if let Some(watts) = self.power_watts {
            check_non_negative("power_watts", watts)?;
        }
        Ok(())
    }
}

fn check_range(field: &'static str, value: f64, min: f64, max: f64) -> Result<(), TelemetryError> {
    if !value.is_finite() {
        return Err(TelemetryError::NotFinite { field });
    }
    if value < min || value > max {
        return Err(TelemetryError::OutOfRange {
            field,
            value,
            min,
            max,
        });
    }
    Ok(())
}

fn check_non_negative(field: &'static str, value: f64) -> Result<(), TelemetryError> {
    if !value.is_finite() {
        return Err(TelemetryError::NotFinite { field });
    }
    if value < 0.0 {
        return Err(TelemetryError::Negative { field, value });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_snapshot() {
        let snapshot = TelemetrySnapshot::new("edge-gateway")
            .with_usage(45.0, 60.0)
            .with_latency(20.0, 5.0)
            .with_throughput(800.0)
            .with_error_rate(0.002);
        assert!(snapshot.validate().is_ok());
        assert!(!snapshot.is_hardware_sample());
    }

    #[test]
    fn test_rejects_negative_throughput() {
        let snapshot = TelemetrySnapshot::new("edge-gateway").with_throughput(-1.0);
        assert_eq!(
            snapshot.validate(),
            Err(TelemetryError::Negative {
                field: "throughput",
                value: -1.0
            })
        );
    }

    #[test]
    fn test_rejects_out_of_range_usage() {
        let snapshot = TelemetrySnapshot::new("edge-gateway").with_usage(101.0, 10.0);
        assert!(matches!(
            snapshot.validate(),
            Err(TelemetryError::OutOfRange { field: "cpu_usage", .. })
        ));

        let snapshot = TelemetrySnapshot::new("edge-gateway").with_error_rate(f64::NAN);
        assert_eq!(
            snapshot.validate(),
            Err(TelemetryError::NotFinite { field: "error_rate" })
        );
    }

    #[test]
    fn test_rejects_missing_id() {
        let snapshot = TelemetrySnapshot::new("");
        assert_eq!(snapshot.validate(), Err(TelemetryError::MissingComponentId));
    }

    #[test]
    fn test_hardware_fields_roundtrip_as_absent() {
        let snapshot = TelemetrySnapshot::new("fpga-1");
        let json = serde_json::to_string(&snapshot).unwrap();
        assert!(!json.contains("temperature_celsius"));

        let hw = snapshot.with_temperature(72.5).with_power(110.0);
        assert!(hw.is_hardware_sample());
        assert!(hw.validate().is_ok());
    }
}
