//! Error types for the Synapse neural layer
//!
//! Provides a unified error type and domain-specific error variants

use thiserror::Error;

/// Result type alias using SynapseError
pub type Result<T> = std::result::Result<T, SynapseError>;

/// Unified error type for Synapse operations
#[derive(Debug, Error)]
pub enum SynapseError {
    // Telemetry errors
    #[error("Invalid telemetry: {0}")]
    Telemetry(#[from] TelemetryError),

    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    // Input outside a documented domain
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    // Registry errors
    #[error("Component not found: {0}")]
    ComponentNotFound(String),

    #[error("Component already registered: {0}")]
    DuplicateComponent(String),

    // Metrics errors
    #[error("Metrics error: {0}")]
    Metrics(String),

    // Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Telemetry snapshot validation errors
#[derive(Debug, Error, PartialEq)]
pub enum TelemetryError {
    #[error("component_id is required")]
    MissingComponentId,

    #[error("{field} must be within [{min}, {max}], got {value}")]
    OutOfRange {
        field: &'static str,
        value: f64,
        min: f64,
        max: f64,
    },

    #[error("{field} cannot be negative, got {value}")]
    Negative { field: &'static str, value: f64 },

    #[error("{field} is not a finite number")]
    NotFinite { field: &'static str },
}

/// Configuration validation errors
#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("smoothing window must be at least 1")]
    ZeroWindow,

    #[error("smoothing window must be at most {max}, got {window}")]
    WindowTooLarge { window: usize, max: usize },

    #[error("target throughput must be positive, got {0}")]
    NonPositiveThroughput(f64),

    #[error("{name} must be finite, got {value}")]
    NonFinite { name: &'static str, value: f64 },

    #[error("{name} must be within [{min}, {max}], got {value}")]
    OutOfRange {
        name: &'static str,
        value: f64,
        min: f64,
        max: f64,
    },

    #[error("failed to parse {key}: {reason}")]
    Parse { key: String, reason: String },
}

// Implement From for common external error types
impl From<serde_json::Error> for SynapseError {
    fn from(err: serde_json::Error) -> Self {
        SynapseError::Serialization(err.to_string())
    }
}
