//! Engine events for external notification layers
//!
//! The engine only announces what happened; the transport is up to the host.
//! Publishing never blocks: events go to a broadcast channel and are dropped
//! when nobody listens.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use synapse_common::{
    BalanceSample, MitigationVerdict, QuarantineRecord, Result, SeverityLevel, TelemetrySnapshot,
};
use tokio::sync::broadcast;
use tracing::trace;
use uuid::Uuid;

use crate::health::SystemHealth;

pub const TELEMETRY_UPDATE: &str = "telemetry:update";
pub const IDI_UPDATE: &str = "idi:update";
pub const MITIGATION_TRIGGERED: &str = "mitigation:triggered";
pub const COMPONENT_QUARANTINED: &str = "component:quarantined";
pub const COMPONENT_RESTORED: &str = "component:restored";
pub const SYSTEM_HEALTH_UPDATE: &str = "system:health";
pub const BALANCE_UPDATE: &str = "balance:update";

/// Default broadcast buffer per subscriber
pub const DEFAULT_EVENT_CAPACITY: usize = 256;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DebtUpdate {
    pub component_id: String,
    pub debt_score: f64,
    pub severity: SeverityLevel,
    pub prediction_7_days: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Restoration {
    pub component_id: String,
    pub throttle_level: f64,
    pub quarantined_for_secs: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BalanceUpdate {
    pub component_id: String,
    pub sample: BalanceSample,
    pub smoothed_imbalance: f64,
}

/// Something the engine observed or decided
#[derive(Debug, Clone, PartialEq)]
pub enum EngineEvent {
    TelemetryUpdate(TelemetrySnapshot),
    DebtUpdate(DebtUpdate),
    MitigationTriggered(MitigationVerdict),
    ComponentQuarantined(QuarantineRecord),
    ComponentRestored(Restoration),
    SystemHealthUpdate(SystemHealth),
    BalanceUpdate(BalanceUpdate),
}

impl EngineEvent {
    /// Stable event name
    pub fn name(&self) -> &'static str {
        match self {
            EngineEvent::TelemetryUpdate(_) => TELEMETRY_UPDATE,
            EngineEvent::DebtUpdate(_) => IDI_UPDATE,
            EngineEvent::MitigationTriggered(_) => MITIGATION_TRIGGERED,
            EngineEvent::ComponentQuarantined(_) => COMPONENT_QUARANTINED,
            EngineEvent::ComponentRestored(_) => COMPONENT_RESTORED,
            EngineEvent::SystemHealthUpdate(_) => SYSTEM_HEALTH_UPDATE,
            EngineEvent::BalanceUpdate(_) => BALANCE_UPDATE,
        }
    }

    /// Component the event concerns, if any
    pub fn component_id(&self) -> Option<&str> {
        match self {
            EngineEvent::TelemetryUpdate(s) => Some(&s.component_id),
            EngineEvent::DebtUpdate(d) => Some(&d.component_id),
            EngineEvent::MitigationTriggered(v) => Some(v.component_id()),
            EngineEvent::ComponentQuarantined(r) => Some(&r.component_id),
            EngineEvent::ComponentRestored(r) => Some(&r.component_id),
            EngineEvent::SystemHealthUpdate(_) => None,
            EngineEvent::BalanceUpdate(b) => Some(&b.component_id),
        }
    }

    fn payload(&self) -> serde_json::Result<serde_json::Value> {
        match self {
            EngineEvent::TelemetryUpdate(s) => serde_json::to_value(s),
            EngineEvent::DebtUpdate(d) => serde_json::to_value(d),
            EngineEvent::MitigationTriggered(v) => serde_json::to_value(v),
            EngineEvent::ComponentQuarantined(r) => serde_json::to_value(r),
            EngineEvent::ComponentRestored(r) => serde_json::to_value(r),
            EngineEvent::SystemHealthUpdate(h) => serde_json::to_value(h),
            EngineEvent::BalanceUpdate(b) => serde_json::to_value(b),
        }
    }
}

/// Wire-neutral wrapper handed to notification layers
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventEnvelope {
    pub event_id: Uuid,
    pub event: String,
    pub timestamp: DateTime<Utc>,
    pub data: serde_json::Value,
}

impl EventEnvelope {
    pub fn from_event(event: &EngineEvent) -> Result<Self> {
        Ok(Self {
            event_id: Uuid::new_v4(),
            event: event.name().to_string(),
            timestamp: Utc::now(),
            data: event.payload()?,
        })
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

/// Fan-out of engine events
#[derive(Debug, Clone)]
pub struct EventBus {
    sender: broadcast::Sender<EngineEvent>,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<EngineEvent> {
        self.sender.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }

    /// Publish without waiting; returns how many subscribers got the event
    pub fn publish(&self, event: EngineEvent) -> usize {
        let name = event.name();
        match self.sender.send(event) {
            Ok(delivered) => delivered,
            Err(_) => {
                trace!(event = name, "No subscribers, event dropped");
                0
            }
        }
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_EVENT_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use synapse_common::MitigationAction;

    #[test]
    fn test_event_names() {
        let verdict = MitigationVerdict::new(MitigationAction::Brake, "vpu", "hard brake");
        let event = EngineEvent::MitigationTriggered(verdict);
        assert_eq!(event.name(), "mitigation:triggered");
        assert_eq!(event.component_id(), Some("vpu"));

        let health = EngineEvent::SystemHealthUpdate(SystemHealth::empty());
        assert_eq!(health.name(), "system:health");
        assert_eq!(health.component_id(), None);
    }

    #[test]
    fn test_envelope_json() {
        let event = EngineEvent::DebtUpdate(DebtUpdate {
            component_id: "vpu".into(),
            debt_score: 6.5,
            severity: SeverityLevel::Critical,
            prediction_7_days: 11.2,
        });
        let envelope = EventEnvelope::from_event(&event).unwrap();
        assert_eq!(envelope.event, IDI_UPDATE);
        assert_eq!(envelope.data["severity"], "CRITICAL");

        let json = envelope.to_json().unwrap();
        assert!(json.contains("\"event\":\"idi:update\""));
    }

    #[tokio::test]
    async fn test_bus_delivers_to_subscribers() {
        let bus = EventBus::default();
        assert_eq!(
            bus.publish(EngineEvent::SystemHealthUpdate(SystemHealth::empty())),
            0
        );

        let mut rx = bus.subscribe();
        assert_eq!(bus.subscriber_count(), 1);
        let delivered = bus.publish(EngineEvent::SystemHealthUpdate(SystemHealth::empty()));
        assert_eq!(delivered, 1);

        let received = rx.recv().await.unwrap();
        assert_eq!(received.name(), SYSTEM_HEALTH_UPDATE);
    }
}
