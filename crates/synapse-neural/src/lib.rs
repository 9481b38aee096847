//! # Synapse Neural
//!
//! Adaptive throttling decision engine for Synapse.
//!
//! ## Integration Debt
//!
//! ```text
//! IDI = days × (loc / 1000) × (deps / 10)
//! ```
//!
//! Where:
//! - days: Days since the component was last integrated
//! - loc: Lines of code changed since then
//! - deps: Dependency count (at least 1)
//!
//! ## Decision Pipeline
//!
//! Every telemetry tick passes the debt brake, the quarantine gate, the
//! hardware/software balance model (with PID smoothing) and finally the
//! throttle combiner. A quarantined component always runs at 0.0.

pub mod balance;
pub mod brake;
pub mod config;
pub mod controller;
pub mod debt;
pub mod events;
pub mod health;
pub mod metrics;
pub mod orchestra;
pub mod quarantine;
pub mod throttle;

pub use balance::BalanceModel;
pub use brake::BrakeCurve;
pub use config::NeuralConfig;
pub use controller::{FeedbackController, PidGains};
pub use debt::{DebtScorer, IntegrationStats};
pub use events::{EngineEvent, EventBus, EventEnvelope};
pub use health::{HealthStatus, SystemHealth};
pub use metrics::EngineMetrics;
pub use orchestra::{ComponentProfile, ComponentStatus, Decision, NeuralOrchestra, Transition};
pub use quarantine::{QuarantineGate, QuarantineRegistry, QuarantineTrigger, RestoreBlocker};
pub use throttle::ThrottleCombiner;

/// Neural engine version
pub const NEURAL_VERSION: &str = env!("CARGO_PKG_VERSION");
