//! Final throttle: the more restrictive recommendation wins

use synapse_common::{clamp_throttle, STOPPED_THROTTLE};

pub struct ThrottleCombiner;

impl ThrottleCombiner {
    /// Merge the brake and balance recommendations. Quarantine always stops
    /// the component. No temporal smoothing is applied here.
    pub fn combine(brake_throttle: f64, balance_throttle: f64, is_quarantined: bool) -> f64 {
        if is_quarantined {
            return STOPPED_THROTTLE;
        }
        clamp_throttle(brake_throttle.min(balance_throttle))
    }
}
