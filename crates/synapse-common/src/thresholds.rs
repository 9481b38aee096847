//! Thresholds shared by every stage of the decision engine

// Integration debt index
pub const DEBT_HEALTHY: f64 = 3.0;
pub const DEBT_WARNING: f64 = 5.0;
/// Knee of the brake curve inside the critical tier. Not a severity boundary.
pub const DEBT_HARD_BRAKE: f64 = 7.0;
pub const DEBT_QUARANTINE: f64 = 10.0;

// Hardware constraints
pub const CPU_EMERGENCY: f64 = 95.0;

pub const MEMORY_CRITICAL: f64 = 90.0;

pub const TEMPERATURE_WARNING: f64 = 70.0;
pub const TEMPERATURE_CRITICAL: f64 = 85.0;
pub const TEMPERATURE_SHUTDOWN: f64 = 95.0;

// Software speed
pub const ERROR_RATE_CRITICAL: f64 = 0.05;

pub const LATENCY_WARNING_MS: f64 = 100.0;
pub const LATENCY_CRITICAL_MS: f64 = 500.0;

// Balancing
pub const IMBALANCE_THRESHOLD: f64 = 0.3;
pub const MAX_THROTTLE_CUT: f64 = 0.5;
pub const MIN_BALANCED_THROTTLE: f64 = 0.2;
pub const MAX_BOOST: f64 = 0.3;

// Component health (0-100)
pub const HEALTH_PRUNE_BELOW: f64 = 20.0;
pub const HEALTH_RESTORE_AT: f64 = 70.0;

/// Minimum time a component stays quarantined
pub const MIN_QUARANTINE_SECS: i64 = 3600;

/// Throttle a component resumes at after leaving quarantine
pub const RESTORE_THROTTLE: f64 = 0.5;

/// Throttle regained per balanced tick
pub const RECOVERY_STEP: f64 = 0.1;
