//! Hardware-software balancing
//!
//! Hardware capacity is the slow, reliable side; software demand is the fast,
//! resource-hungry side. The model keeps a short history per component and
//! acts on the moving average of their mismatch:
//!
//! - Negative imbalance: hardware insufficient, throttle software
//! - Positive imbalance: hardware idle, boost potential available
//! - Near zero: balanced

use std::collections::VecDeque;

use parking_lot::Mutex;
use synapse_common::thresholds::{
    IMBALANCE_THRESHOLD, LATENCY_CRITICAL_MS, LATENCY_WARNING_MS, MAX_BOOST, MAX_THROTTLE_CUT,
    MIN_BALANCED_THROTTLE, TEMPERATURE_CRITICAL, TEMPERATURE_WARNING,
};
use synapse_common::{
    clamp_throttle, BalanceSample, ConfigError, MitigationAction, MitigationVerdict, Result,
    TelemetrySnapshot,
};
use tracing::{debug, trace};

/// Default moving-average window (samples)
pub const DEFAULT_WINDOW: usize = 10;

/// Largest accepted moving-average window (samples)
pub const MAX_WINDOW: usize = 10_000;

/// Default throughput treated as full demand (requests/sec)
pub const DEFAULT_TARGET_THROUGHPUT: f64 = 1000.0;

/// Capacity/demand balancer for a single component
#[derive(Debug)]
pub struct BalanceModel {
    window: usize,
    target_throughput: f64,
    history: Mutex<VecDeque<BalanceSample>>,
}

impl BalanceModel {
    /// Create a model; history retains up to `2 × window` samples
    pub fn new(window: usize, target_throughput: f64) -> Result<Self> {
        if window == 0 {
            return Err(ConfigError::ZeroWindow.into());
        }
        if window > MAX_WINDOW {
            return Err(ConfigError::WindowTooLarge {
                window,
                max: MAX_WINDOW,
            }
            .into());
        }
        if !(target_throughput.is_finite() && target_throughput > 0.0) {
            return Err(ConfigError::NonPositiveThroughput(target_throughput).into());
        }
        Ok(Self {
            window,
            target_throughput,
            history: Mutex::new(VecDeque::with_capacity(window * 2)),
        })
    }

    pub fn window(&self) -> usize {
        self.window
    }

    pub fn target_throughput(&self) -> f64 {
        self.target_throughput
    }

    /// Maximum number of retained samples
    pub fn capacity(&self) -> usize {
        self.window * 2
    }

    /// Hardware capacity score (0-100); higher means more headroom
    pub fn hardware_capacity(snapshot: &TelemetrySnapshot) -> f64 {
        let cpu_capacity = 100.0 - snapshot.cpu_usage;
        let memory_capacity = 100.0 - snapshot.memory_usage;

        let temp_factor = match snapshot.temperature_celsius {
            Some(temp) if temp > TEMPERATURE_CRITICAL => 0.3,
            Some(temp) if temp > TEMPERATURE_WARNING => 0.7,
            _ => 1.0,
        };

        cpu_capacity * 0.4 + memory_capacity * 0.4 + 100.0 * temp_factor * 0.2
    }

    /// Software demand score (0-100); higher means more resources requested
    pub fn software_demand(snapshot: &TelemetrySnapshot, target_throughput: f64) -> f64 {
        let throughput_demand = (snapshot.throughput / target_throughput * 100.0).min(100.0);

        let latency_urgency = if snapshot.io_latency_ms > LATENCY_CRITICAL_MS {
            100.0
        } else if snapshot.io_latency_ms > LATENCY_WARNING_MS {
            70.0
        } else {
            snapshot.io_latency_ms / LATENCY_WARNING_MS * 50.0
        };

        let error_stress = (snapshot.error_rate * 1000.0).min(100.0);

        throughput_demand * 0.5 + latency_urgency * 0.3 + error_stress * 0.2
    }

    /// Signed mismatch in `[-1, 1]`; zero when both sides are zero
    pub fn imbalance(hw_capacity: f64, sw_demand: f64) -> f64 {
        if hw_capacity + sw_demand == 0.0 {
            return 0.0;
        }
        ((hw_capacity - sw_demand) / 100.0).clamp(-1.0, 1.0)
    }

    /// Map a (smoothed) imbalance to an action and throttle level
    pub fn balancing_action(
        imbalance: f64,
        component_id: &str,
        current_throttle: f64,
    ) -> MitigationVerdict {
        let current_throttle = clamp_throttle(current_throttle);

        let (action, reason, throttle) = if imbalance.abs() < IMBALANCE_THRESHOLD {
            (MitigationAction::None, "System is balanced", current_throttle)
        } else if imbalance < -IMBALANCE_THRESHOLD {
            let cut = imbalance.abs().min(MAX_THROTTLE_CUT);
            (
                MitigationAction::Throttle,
                "Hardware overloaded - throttling software",
                (current_throttle - cut).max(MIN_BALANCED_THROTTLE),
            )
        } else {
            let boost = imbalance.min(MAX_BOOST);
            (
                MitigationAction::Alert,
                "Hardware underutilized - boost potential available",
                (current_throttle + boost).min(1.0),
            )
        };

        MitigationVerdict::new(action, component_id, reason)
            .with_throttle(throttle)
            .with_imbalance(imbalance)
    }

    /// Score a snapshot, record it, and decide on the smoothed imbalance.
    ///
    /// Rejects snapshots outside their documented domains.
    pub fn evaluate(
        &self,
        snapshot: &TelemetrySnapshot,
        current_throttle: f64,
    ) -> Result<MitigationVerdict> {
        snapshot.validate()?;

        let hw_capacity = Self::hardware_capacity(snapshot);
        let sw_demand = Self::software_demand(snapshot, self.target_throughput);
        let imbalance = Self::imbalance(hw_capacity, sw_demand);

        let smoothed = self.record(BalanceSample {
            hw_capacity,
            sw_demand,
            imbalance,
            timestamp: snapshot.timestamp,
        });

        debug!(
            component_id = %snapshot.component_id,
            hw_capacity,
            sw_demand,
            imbalance,
            smoothed,
            "Evaluated balance"
        );

        Ok(Self::balancing_action(
            smoothed,
            &snapshot.component_id,
            current_throttle,
        ))
    }

    /// Append a sample and return the smoothed imbalance. Append, eviction and
    /// averaging happen under one lock acquisition.
    fn record(&self, sample: BalanceSample) -> f64 {
        let mut history = self.history.lock();
        history.push_back(sample);
        while history.len() > self.capacity() {
            history.pop_front();
        }

        if history.len() < self.window {
            trace!(len = history.len(), window = self.window, "Warming up moving average");
            return sample.imbalance;
        }

        let sum: f64 = history
            .iter()
            .rev()
            .take(self.window)
            .map(|s| s.imbalance)
            .sum();
        sum / self.window as f64
    }

    /// Up to `count` most recent samples, oldest first
    pub fn recent_samples(&self, count: usize) -> Vec<BalanceSample> {
        let history = self.history.lock();
        let skip = history.len().saturating_sub(count);
        history.iter().skip(skip).copied().collect()
    }

    /// Number of retained samples
    pub fn history_len(&self) -> usize {
        self.history.lock().len()
    }

    /// Forget all samples
    pub fn clear(&self) {
        self.history.lock().clear();
    }
}

impl Default for BalanceModel {
    fn default() -> Self {
        Self {
            window: DEFAULT_WINDOW,
            target_throughput: DEFAULT_TARGET_THROUGHPUT,
            history: Mutex::new(VecDeque::with_capacity(DEFAULT_WINDOW * 2)),
        }
    }
}
