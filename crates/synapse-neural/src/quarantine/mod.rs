//! Quarantine module
//!
//! - QuarantineGate: stateless entry and exit conditions
//! - QuarantineRegistry: the active records behind the gate

pub mod gate;
pub mod registry;

pub use gate::{describe, QuarantineGate, QuarantineTrigger, RestoreBlocker};
pub use registry::QuarantineRegistry;
