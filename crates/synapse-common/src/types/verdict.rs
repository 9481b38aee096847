//! Mitigation verdicts and severity tiers
//!
//! A [`MitigationVerdict`] is built once per evaluation and never changed
//! afterwards. The builder clamps throttle and imbalance into their domains so
//! every verdict that leaves the engine satisfies them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::clamp_throttle;

/// Ordinal classification of an integration debt score
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SeverityLevel {
    Healthy,
    Warning,
    Critical,
    Quarantine,
}

impl std::fmt::Display for SeverityLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SeverityLevel::Healthy => write!(f, "HEALTHY"),
            SeverityLevel::Warning => write!(f, "WARNING"),
            SeverityLevel::Critical => write!(f, "CRITICAL"),
            SeverityLevel::Quarantine => write!(f, "QUARANTINE"),
        }
    }
}

/// Recommended mitigation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MitigationAction {
    None,
    Throttle,
    Brake,
    Quarantine,
    Rebalance,
    Alert,
    AutoIntegrate,
}

impl MitigationAction {
    /// Whether this action asks the enforcement layer to do anything
    pub fn is_active(&self) -> bool {
        !matches!(self, MitigationAction::None)
    }
}

impl std::fmt::Display for MitigationAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            MitigationAction::None => "NONE",
            MitigationAction::Throttle => "THROTTLE",
            MitigationAction::Brake => "BRAKE",
            MitigationAction::Quarantine => "QUARANTINE",
            MitigationAction::Rebalance => "REBALANCE",
            MitigationAction::Alert => "ALERT",
            MitigationAction::AutoIntegrate => "AUTO_INTEGRATE",
        };
        f.write_str(name)
    }
}

/// The engine's recommended action for one evaluation cycle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "VerdictFields")]
pub struct MitigationVerdict {
    action: MitigationAction,
    component_id: String,
    reason: String,
    timestamp: DateTime<Utc>,
    debt_score: f64,
    throttle_level: f64,
    imbalance: f64,
}

/// Wire form of a verdict; decoding goes through the clamping builders
#[derive(Deserialize)]
struct VerdictFields {
    action: MitigationAction,
    component_id: String,
    reason: String,
    timestamp: DateTime<Utc>,
    debt_score: f64,
    throttle_level: f64,
    imbalance: f64,
}

impl From<VerdictFields> for MitigationVerdict {
    fn from(fields: VerdictFields) -> Self {
        MitigationVerdict::new(fields.action, fields.component_id, fields.reason)
            .with_debt_score(fields.debt_score)
            .with_throttle(fields.throttle_level)
            .with_imbalance(fields.imbalance)
            .at(fields.timestamp)
    }
}

impl MitigationVerdict {
    /// Create a verdict at full throttle with no debt and no imbalance
    pub fn new(
        action: MitigationAction,
        component_id: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self {
            action,
            component_id: component_id.into(),
            reason: reason.into(),
            timestamp: Utc::now(),
            debt_score: 0.0,
            throttle_level: crate::FULL_THROTTLE,
            imbalance: 0.0,
        }
    }

    /// Attach the debt score
    pub fn with_debt_score(mut self, debt_score: f64) -> Self {
        self.debt_score = debt_score;
        self
    }

    /// Attach the throttle level, clamped to `[0, 1]`
    pub fn with_throttle(mut self, throttle_level: f64) -> Self {
        self.throttle_level = clamp_throttle(throttle_level);
        self
    }

    /// Attach the imbalance, clamped to `[-1, 1]`
    pub fn with_imbalance(mut self, imbalance: f64) -> Self {
        self.imbalance = if imbalance.is_nan() {
            0.0
        } else {
            imbalance.clamp(-1.0, 1.0)
        };
        self
    }

    /// Override the verdict time
    pub fn at(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = timestamp;
        self
    }

    pub fn action(&self) -> MitigationAction {
        self.action
    }

    pub fn component_id(&self) -> &str {
        &self.component_id
    }

    pub fn reason(&self) -> &str {
        &self.reason
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    pub fn debt_score(&self) -> f64 {
        self.debt_score
    }

    pub fn throttle_level(&self) -> f64 {
        self.throttle_level
    }

    pub fn imbalance(&self) -> f64 {
        self.imbalance
    }
}

impl std::fmt::Display for MitigationVerdict {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}[{}] throttle={:.2} debt={:.2} imbalance={:+.3}: {}",
            self.action,
            self.component_id,
            self.throttle_level,
            self.debt_score,
            self.imbalance,
            self.reason
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_clamps() {
        let verdict = MitigationVerdict::new(MitigationAction::Alert, "cam-2", "boost")
            .with_throttle(1.4)
            .with_imbalance(-3.0);
        assert_eq!(verdict.throttle_level(), 1.0);
        assert_eq!(verdict.imbalance(), -1.0);
    }

    #[test]
    fn test_severity_ordering() {
        assert!(SeverityLevel::Healthy < SeverityLevel::Warning);
        assert!(SeverityLevel::Critical < SeverityLevel::Quarantine);
    }

    #[test]
    fn test_action_serializes_screaming_case() {
        let json = serde_json::to_string(&MitigationAction::AutoIntegrate).unwrap();
        assert_eq!(json, "\"AUTO_INTEGRATE\"");
        assert!(!MitigationAction::None.is_active());
        assert!(MitigationAction::Brake.is_active());
    }

    #[test]
    fn test_display() {
        let verdict = MitigationVerdict::new(MitigationAction::Brake, "plc-7", "hard brake")
            .with_throttle(0.5)
            .with_debt_score(6.0);
        let text = verdict.to_string();
        assert!(text.starts_with("BRAKE[plc-7]"));
        assert!(text.contains("throttle=0.50"));
    }

    #[test]
    fn test_decoding_applies_clamps() {
        let json = r#"{
            "action": "ALERT",
            "component_id": "cam-2",
            "reason": "boost",
            "timestamp": "2026-03-01T12:00:00Z",
            "debt_score": 1.5,
            "throttle_level": 3.0,
            "imbalance": -4.0
        }"#;
        let verdict: MitigationVerdict = serde_json::from_str(json).unwrap();
        assert_eq!(verdict.action(), MitigationAction::Alert);
        assert_eq!(verdict.throttle_level(), 1.0);
        assert_eq!(verdict.imbalance(), -1.0);
        assert_eq!(verdict.debt_score(), 1.5);
        assert_eq!(verdict.timestamp().to_rfc3339(), "2026-03-01T12:00:00+00:00");

        let round_trip: MitigationVerdict =
            serde_json::from_str(&serde_json::to_string(&verdict).unwrap()).unwrap();
        assert_eq!(round_trip, verdict);
    }
}
