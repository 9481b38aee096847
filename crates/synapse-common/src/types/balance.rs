//! BalanceSample - one point of a component's capacity/demand history

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Hardware capacity vs software demand at one sampling tick
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BalanceSample {
    /// Available hardware capacity (0-100)
    pub hw_capacity: f64,
    /// Software demand (0-100)
    pub sw_demand: f64,
    /// Signed mismatch (-1 to +1)
    pub imbalance: f64,
    /// Sample time
    pub timestamp: DateTime<Utc>,
}
