//! PID controller for adaptive throttling
//!
//! The derivative is the difference between consecutive errors, not a time
//! derivative, so the controller assumes roughly fixed-interval sampling.

use serde::{Deserialize, Serialize};

/// Anti-windup bounds for the accumulated error
pub const INTEGRAL_LIMIT: f64 = 50.0;

/// Bound on a single adjustment
pub const OUTPUT_LIMIT: f64 = 0.3;

/// Throttle bounds used by [`FeedbackController::adjust_throttle`]
pub const MIN_ADJUSTED_THROTTLE: f64 = 0.1;
pub const MAX_ADJUSTED_THROTTLE: f64 = 1.0;

/// Controller gains and set-point
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PidGains {
    pub kp: f64,
    pub ki: f64,
    pub kd: f64,
    /// Target utilization (percent)
    pub target: f64,
}

impl Default for PidGains {
    fn default() -> Self {
        Self {
            kp: 0.5,
            ki: 0.1,
            kd: 0.05,
            target: 70.0,
        }
    }
}

#[derive(Debug, Clone)]
pub struct FeedbackController {
    kp: f64,
    ki: f64,
    kd: f64,
    target: f64,
    integral: f64,
    previous_error: f64,
}

impl FeedbackController {
    pub fn new(target: f64, kp: f64, ki: f64, kd: f64) -> Self {
        Self {
            kp,
            ki,
            kd,
            target,
            integral: 0.0,
            previous_error: 0.0,
        }
    }

    pub fn from_gains(gains: PidGains) -> Self {
        Self::new(gains.target, gains.kp, gains.ki, gains.kd)
    }

    pub fn target(&self) -> f64 {
        self.target
    }

    /// Replace the set-point. History is kept.
    pub fn set_target(&mut self, target: f64) {
        self.target = target;
    }

    /// Drop accumulated history, e.g. after a restart or mode change
    pub fn reset(&mut self) {
        self.integral = 0.0;
        self.previous_error = 0.0;
    }

    pub fn integral(&self) -> f64 {
        self.integral
    }

    pub fn previous_error(&self) -> f64 {
        self.previous_error
    }

    /// Feed one measurement and get an adjustment in `[-0.3, 0.3]`
    pub fn step(&mut self, current_value: f64) -> f64 {
        let error = self.target - current_value;

        let p_term = self.kp * error;

        self.integral = (self.integral + error).clamp(-INTEGRAL_LIMIT, INTEGRAL_LIMIT);
        let i_term = self.ki * self.integral;

        let d_term = self.kd * (error - self.previous_error);
        self.previous_error = error;

        let adjustment = (p_term + i_term + d_term) / 100.0;
        if adjustment.is_nan() {
            return 0.0;
        }
        adjustment.clamp(-OUTPUT_LIMIT, OUTPUT_LIMIT)
    }

    /// Apply one step to `current_throttle` given a utilization reading.
    ///
    /// The result stays within `[0.1, 1.0]` and is rounded to two decimals.
    pub fn adjust_throttle(&mut self, current_throttle: f64, utilization: f64) -> f64 {
        let adjusted = (current_throttle + self.step(utilization))
            .clamp(MIN_ADJUSTED_THROTTLE, MAX_ADJUSTED_THROTTLE);
        (adjusted * 100.0).round() / 100.0
    }
}

impl Default for FeedbackController {
    fn default() -> Self {
        Self::from_gains(PidGains::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_first_step() {
        let mut pid = FeedbackController::default();
        // error = 20: (0.5×20 + 0.1×20 + 0.05×20) / 100
        let out = pid.step(50.0);
        assert!((out - 0.13).abs() < 1e-9);
        assert_eq!(pid.previous_error(), 20.0);
        assert_eq!(pid.integral(), 20.0);
    }

    #[test]
    fn test_derivative_uses_error_difference() {
        let mut pid = FeedbackController::new(70.0, 0.0, 0.0, 1.0);
        pid.step(60.0); // error 10, derivative 10
        let out = pid.step(65.0); // error 5, derivative -5
        assert!((out - (-0.05)).abs() < 1e-9);
    }

    #[test]
    fn test_anti_windup() {
        let mut pid = FeedbackController::default();
        for _ in 0..1000 {
            let out = pid.step(-1_000_000.0);
            assert!((-OUTPUT_LIMIT..=OUTPUT_LIMIT).contains(&out));
        }
        assert_eq!(pid.integral(), INTEGRAL_LIMIT);

        for _ in 0..1000 {
            pid.step(1_000_000.0);
        }
        assert_eq!(pid.integral(), -INTEGRAL_LIMIT);
    }

    #[test]
    fn test_set_target_keeps_history() {
        let mut pid = FeedbackController::default();
        pid.step(60.0);
        pid.set_target(50.0);
        assert_eq!(pid.target(), 50.0);
        assert_eq!(pid.integral(), 10.0);
        assert_eq!(pid.previous_error(), 10.0);
    }

    #[test]
    fn test_reset() {
        let mut pid = FeedbackController::default();
        pid.step(10.0);
        pid.reset();
        assert_eq!(pid.integral(), 0.0);
        assert_eq!(pid.previous_error(), 0.0);
    }

    #[test]
    fn test_adjust_throttle() {
        let mut pid = FeedbackController::default();
        // Far over target: maximum cut, floored at 0.1
        assert_eq!(pid.adjust_throttle(0.2, 100.0), 0.1);

        let mut pid = FeedbackController::default();
        // Far under target: boost capped at 1.0
        assert_eq!(pid.adjust_throttle(0.9, 0.0), 1.0);

        let mut pid = FeedbackController::default();
        // 0.5 + 0.13
        assert_eq!(pid.adjust_throttle(0.5, 50.0), 0.63);
    }

    proptest! {
        #[test]
        fn prop_output_bounded(values in proptest::collection::vec(-1e12f64..1e12, 1..200)) {
            let mut pid = FeedbackController::default();
            for v in values {
                let out = pid.step(v);
                prop_assert!((-OUTPUT_LIMIT..=OUTPUT_LIMIT).contains(&out));
                prop_assert!(pid.integral().abs() <= INTEGRAL_LIMIT);
            }
        }
    }
}
