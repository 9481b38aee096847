//! # Synapse Common
//!
//! Shared types, thresholds, and errors for the Synapse neural mitigation layer.
//!
//! ## Core Types
//!
//! - [`TelemetrySnapshot`]: Per-component hardware/software telemetry sample
//! - [`MitigationVerdict`]: The engine's recommended action for one evaluation
//! - [`SeverityLevel`]: Ordinal classification of an integration debt score
//! - [`QuarantineRecord`]: Bookkeeping for a component held in quarantine
//! - [`BalanceSample`]: One entry in a component's capacity/demand history
//!
//! ## Thresholds
//!
//! All tuning constants shared by the engine live in [`thresholds`].

pub mod error;
pub mod thresholds;
pub mod types;

// Re-export commonly used types at crate root
pub use error::{ConfigError, Result, SynapseError, TelemetryError};
pub use types::{
    balance::BalanceSample,
    quarantine::QuarantineRecord,
    telemetry::{ComponentKind, TelemetrySnapshot},
    verdict::{MitigationAction, MitigationVerdict, SeverityLevel},
};

/// Synapse version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Throttle level for an unrestricted component
pub const FULL_THROTTLE: f64 = 1.0;

/// Throttle level for a stopped component
pub const STOPPED_THROTTLE: f64 = 0.0;

/// Clamp a throttle level into `[0, 1]`.
///
/// NaN collapses to [`STOPPED_THROTTLE`] so a corrupt upstream value can never
/// leave a component running unrestricted.
#[inline]
pub fn clamp_throttle(level: f64) -> f64 {
    if level.is_nan() {
        return STOPPED_THROTTLE;
    }
    level.clamp(STOPPED_THROTTLE, FULL_THROTTLE)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clamp_throttle() {
        assert_eq!(clamp_throttle(1.7), 1.0);
        assert_eq!(clamp_throttle(-0.2), 0.0);
        assert_eq!(clamp_throttle(0.42), 0.42);
        assert_eq!(clamp_throttle(f64::NAN), 0.0);
    }
}
