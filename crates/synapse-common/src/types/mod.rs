//! Core data types for the Synapse neural layer

pub mod balance;
pub mod quarantine;
pub mod telemetry;
pub mod verdict;
