//! Neural orchestra: per-component coordination of every mitigation stage
//!
//! Each telemetry tick for a component runs, in order:
//!
//! 1. Debt brake (integration debt → throttle + verdict)
//! 2. Quarantine entry check (any trigger isolates an active component)
//! 3. Active components: balance evaluation and adaptive PID adjustment
//! 4. Quarantined components: restoration check
//! 5. Combination into the final throttle
//!
//! Components share nothing. Each one owns its balance history and feedback
//! controller, and its evaluations are serialized by a per-component lock.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use synapse_common::{
    BalanceSample, ComponentKind, MitigationAction, MitigationVerdict, QuarantineRecord, Result,
    SynapseError, TelemetrySnapshot, FULL_THROTTLE,
};
use tokio::sync::broadcast;
use tracing::{debug, info, instrument, warn};

use crate::balance::BalanceModel;
use crate::brake::BrakeCurve;
use crate::config::NeuralConfig;
use crate::controller::FeedbackController;
use crate::debt::{DebtScorer, IntegrationStats};
use crate::events::{BalanceUpdate, DebtUpdate, EngineEvent, EventBus, Restoration};
use crate::health::{ComponentHealth, SystemHealth};
use crate::metrics::EngineMetrics;
use crate::quarantine::{describe, QuarantineGate, QuarantineRegistry};
use crate::throttle::ThrottleCombiner;

/// Horizon of the debt prediction attached to debt updates
pub const PREDICTION_DAYS: i64 = 7;

/// Static description of a monitored component
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComponentProfile {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub kind: ComponentKind,
    #[serde(default)]
    pub integration: IntegrationStats,
    /// Health score (0-100)
    #[serde(default = "default_health")]
    pub health_score: f64,
}

fn default_health() -> f64 {
    100.0
}

impl ComponentProfile {
    pub fn new(id: impl Into<String>, name: impl Into<String>, kind: ComponentKind) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            kind,
            integration: IntegrationStats::default(),
            health_score: default_health(),
        }
    }

    pub fn with_integration(mut self, integration: IntegrationStats) -> Self {
        self.integration = integration;
        self
    }

    pub fn with_health(mut self, health_score: f64) -> Self {
        self.health_score = health_score;
        self
    }
}

/// Current view of a registered component
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComponentStatus {
    pub id: String,
    pub name: String,
    pub kind: ComponentKind,
    pub integration: IntegrationStats,
    pub health_score: f64,
    pub debt_score: f64,
    /// Throttle requested by the balance stage alone
    pub balance_throttle: f64,
    /// Final throttle of the last evaluation
    pub throttle_level: f64,
    pub quarantine: Option<QuarantineRecord>,
}

/// Quarantine state change produced by one evaluation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "transition", content = "record", rename_all = "snake_case")]
pub enum Transition {
    Quarantined(QuarantineRecord),
    Restored(QuarantineRecord),
}

/// Authoritative outcome of one evaluation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Decision {
    pub component_id: String,
    /// Throttle the enforcement layer should apply (0-1)
    pub final_throttle: f64,
    pub quarantined: bool,
    pub transition: Option<Transition>,
    pub brake: MitigationVerdict,
    /// Absent while the component is quarantined
    pub balance: Option<MitigationVerdict>,
    /// Every verdict that asks for action, in the order it was produced
    pub verdicts: Vec<MitigationVerdict>,
}

struct ComponentState {
    profile: ComponentProfile,
    debt_score: f64,
    /// Balance and PID stage output, carried between ticks without the brake
    balance_throttle: f64,
    /// Last final throttle
    throttle_level: f64,
    controller: FeedbackController,
}

struct ComponentSlot {
    state: Mutex<ComponentState>,
    balance: BalanceModel,
}

pub struct NeuralOrchestra {
    config: NeuralConfig,
    components: DashMap<String, Arc<ComponentSlot>>,
    quarantine: QuarantineRegistry,
    events: EventBus,
    metrics: EngineMetrics,
}

impl NeuralOrchestra {
    pub fn new(config: NeuralConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            events: EventBus::new(config.event_capacity),
            metrics: EngineMetrics::new()?,
            components: DashMap::new(),
            quarantine: QuarantineRegistry::new(),
            config,
        })
    }

    pub fn config(&self) -> &NeuralConfig {
        &self.config
    }

    pub fn metrics(&self) -> &EngineMetrics {
        &self.metrics
    }

    /// Receive every event published from now on
    pub fn subscribe(&self) -> broadcast::Receiver<EngineEvent> {
        self.events.subscribe()
    }

    #[instrument(skip(self, profile), fields(component_id = %profile.id))]
    pub fn register_component(&self, profile: ComponentProfile) -> Result<()> {
        if profile.id.is_empty() {
            return Err(SynapseError::InvalidInput("component id is required".into()));
        }
        check_health(profile.health_score)?;

        let balance = BalanceModel::new(self.config.smoothing_window, self.config.target_throughput)?;

        match self.components.entry(profile.id.clone()) {
            Entry::Occupied(_) => Err(SynapseError::DuplicateComponent(profile.id)),
            Entry::Vacant(slot) => {
                info!(name = %profile.name, kind = %profile.kind, "Registered component");
                let debt_score = profile.integration.score();
                slot.insert(Arc::new(ComponentSlot {
                    state: Mutex::new(ComponentState {
                        profile,
                        debt_score,
                        balance_throttle: FULL_THROTTLE,
                        throttle_level: FULL_THROTTLE,
                        controller: FeedbackController::from_gains(self.config.pid),
                    }),
                    balance,
                }));
                Ok(())
            }
        }
    }

    pub fn component_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.components.iter().map(|e| e.key().clone()).collect();
        ids.sort();
        ids
    }

    fn slot(&self, component_id: &str) -> Result<Arc<ComponentSlot>> {
        self.components
            .get(component_id)
            .map(|entry| Arc::clone(entry.value()))
            .ok_or_else(|| SynapseError::ComponentNotFound(component_id.to_string()))
    }

    /// Replace the change-risk inputs of a component
    pub fn update_integration(&self, component_id: &str, stats: IntegrationStats) -> Result<()> {
        let slot = self.slot(component_id)?;
        let mut state = slot.state.lock();
        state.profile.integration = stats;
        state.debt_score = stats.score();
        debug!(component_id, debt = state.debt_score, "Updated integration stats");
        Ok(())
    }

    /// Replace the health score (0-100) of a component
    pub fn update_health(&self, component_id: &str, health_score: f64) -> Result<()> {
        check_health(health_score)?;
        let slot = self.slot(component_id)?;
        slot.state.lock().profile.health_score = health_score;
        debug!(component_id, health_score, "Updated health score");
        Ok(())
    }

    pub fn component_status(&self, component_id: &str) -> Result<ComponentStatus> {
        let slot = self.slot(component_id)?;
        let state = slot.state.lock();
        Ok(ComponentStatus {
            id: state.profile.id.clone(),
            name: state.profile.name.clone(),
            kind: state.profile.kind,
            integration: state.profile.integration,
            health_score: state.profile.health_score,
            debt_score: state.debt_score,
            balance_throttle: state.balance_throttle,
            throttle_level: state.throttle_level,
            quarantine: self.quarantine.get(component_id),
        })
    }

    /// Up to `count` most recent balance samples of a component, oldest first
    pub fn recent_balance(&self, component_id: &str, count: usize) -> Result<Vec<BalanceSample>> {
        Ok(self.slot(component_id)?.balance.recent_samples(count))
    }

    pub fn quarantine_records(&self) -> Vec<QuarantineRecord> {
        self.quarantine.active()
    }

    pub fn system_health(&self) -> SystemHealth {
        let views: Vec<ComponentHealth> = self
            .components
            .iter()
            .map(|entry| {
                let state = entry.value().state.lock();
                ComponentHealth {
                    component_id: entry.key().clone(),
                    health_score: state.profile.health_score,
                    debt_score: state.debt_score,
                    quarantined: self.quarantine.is_quarantined(entry.key()),
                }
            })
            .collect();
        SystemHealth::summarize(views)
    }

    /// Compute the system health summary and announce it
    pub fn publish_system_health(&self) -> SystemHealth {
        let health = self.system_health();
        self.events
            .publish(EngineEvent::SystemHealthUpdate(health.clone()));
        health
    }

    /// Evaluate one telemetry tick against the wall clock
    pub fn process_telemetry(
        &self,
        component_id: &str,
        snapshot: &TelemetrySnapshot,
    ) -> Result<Decision> {
        self.process_telemetry_at(component_id, snapshot, Utc::now())
    }

    /// Evaluate one telemetry tick as of `now`
    #[instrument(skip(self, snapshot, now))]
    pub fn process_telemetry_at(
        &self,
        component_id: &str,
        snapshot: &TelemetrySnapshot,
        now: DateTime<Utc>,
    ) -> Result<Decision> {
        let slot = self.slot(component_id)?;

        if snapshot.component_id != component_id {
            self.metrics.rejected_snapshots_total.inc();
            return Err(SynapseError::InvalidInput(format!(
                "snapshot for {} routed to {}",
                snapshot.component_id, component_id
            )));
        }
        if let Err(err) = snapshot.validate() {
            self.metrics.rejected_snapshots_total.inc();
            warn!(error = %err, "Rejected telemetry snapshot");
            return Err(err.into());
        }

        self.metrics.evaluations_total.inc();
        self.events
            .publish(EngineEvent::TelemetryUpdate(snapshot.clone()));

        let mut state = slot.state.lock();
        let stats = state.profile.integration;
        let health = state.profile.health_score;
        let debt = DebtScorer::score(
            stats.days_since_integration,
            stats.loc_changed,
            stats.dependencies,
        );
        state.debt_score = debt;

        self.events.publish(EngineEvent::DebtUpdate(DebtUpdate {
            component_id: component_id.to_string(),
            debt_score: debt,
            severity: DebtScorer::severity(debt),
            prediction_7_days: stats.predict(PREDICTION_DAYS),
        }));

        let mut verdicts = Vec::new();

        // 1. Debt brake
        let brake = BrakeCurve::apply_brake(
            component_id,
            debt,
            stats.days_since_integration,
            stats.loc_changed,
            stats.dependencies,
        )
        .at(now);
        if brake.action().is_active() {
            verdicts.push(brake.clone());
        }

        // 2. Quarantine entry
        let mut quarantined = self.quarantine.is_quarantined(component_id);
        let mut transition = None;
        if !quarantined {
            let triggers = QuarantineGate::snapshot_triggers(debt, health, snapshot);
            if !triggers.is_empty() {
                let reason = describe(&triggers);
                let record = QuarantineRecord::new(component_id, reason.clone(), debt, health).at(now);
                if self.quarantine.admit(record.clone()) {
                    self.metrics.quarantines_total.inc();
                    verdicts.push(
                        MitigationVerdict::new(
                            MitigationAction::Quarantine,
                            component_id,
                            format!("Neural pruning: {}", reason),
                        )
                        .with_debt_score(debt)
                        .with_throttle(0.0)
                        .at(now),
                    );
                    self.events
                        .publish(EngineEvent::ComponentQuarantined(record.clone()));
                    transition = Some(Transition::Quarantined(record));
                }
                quarantined = true;
            }
        }

        // 3. Balance and adaptive throttling, or 4. restoration
        let mut balance = None;
        let balance_throttle = if !quarantined {
            let verdict = slot.balance.evaluate(snapshot, state.balance_throttle)?.at(now);

            if let Some(sample) = slot.balance.recent_samples(1).pop() {
                self.events.publish(EngineEvent::BalanceUpdate(BalanceUpdate {
                    component_id: component_id.to_string(),
                    sample,
                    smoothed_imbalance: verdict.imbalance(),
                }));
            }

            let mut throttle = verdict.throttle_level();
            if verdict.action() == MitigationAction::None && throttle < FULL_THROTTLE {
                // Balanced: recover toward full speed after cuts and restores
                throttle = (throttle + self.config.recovery_step).min(FULL_THROTTLE);
            }
            if self.config.pid_enabled {
                let adjusted = state.controller.adjust_throttle(throttle, snapshot.cpu_usage);
                if (adjusted - throttle).abs() > self.config.pid_deadband {
                    debug!(from = throttle, to = adjusted, "Adaptive throttle adjustment");
                    throttle = adjusted;
                }
            }

            if verdict.action().is_active() {
                verdicts.push(verdict.clone());
            }
            balance = Some(verdict);
            state.balance_throttle = throttle;
            throttle
        } else if transition.is_none() {
            match self.quarantine.release(component_id, debt, health, now) {
                Ok(record) => {
                    quarantined = false;
                    state.controller.reset();
                    slot.balance.clear();
                    self.metrics.restores_total.inc();

                    let restore_throttle = self.config.restore_throttle;
                    verdicts.push(
                        MitigationVerdict::new(
                            MitigationAction::Alert,
                            component_id,
                            format!(
                                "Component restored from quarantine - starting at {:.0}% throttle",
                                restore_throttle * 100.0
                            ),
                        )
                        .with_debt_score(debt)
                        .with_throttle(restore_throttle)
                        .at(now),
                    );
                    self.events.publish(EngineEvent::ComponentRestored(Restoration {
                        component_id: component_id.to_string(),
                        throttle_level: restore_throttle,
                        quarantined_for_secs: record.elapsed(now).num_seconds(),
                    }));
                    transition = Some(Transition::Restored(record));
                    state.balance_throttle = restore_throttle;
                    restore_throttle
                }
                Err(blocker) => {
                    debug!(%blocker, "Component stays quarantined");
                    0.0
                }
            }
        } else {
            0.0
        };

        // 5. Final throttle
        let final_throttle =
            ThrottleCombiner::combine(brake.throttle_level(), balance_throttle, quarantined);
        state.throttle_level = final_throttle;
        drop(state);

        self.metrics.final_throttle.observe(final_throttle);
        self.metrics
            .quarantined_components
            .set(self.quarantine.len() as i64);
        for verdict in &verdicts {
            self.metrics
                .mitigations_total
                .with_label_values(&[&verdict.action().to_string()])
                .inc();
            self.events
                .publish(EngineEvent::MitigationTriggered(verdict.clone()));
        }

        debug!(
            debt,
            final_throttle,
            quarantined,
            verdicts = verdicts.len(),
            "Evaluated telemetry"
        );

        Ok(Decision {
            component_id: component_id.to_string(),
            final_throttle,
            quarantined,
            transition,
            brake,
            balance,
            verdicts,
        })
    }
}

fn check_health(health_score: f64) -> Result<()> {
    if !(0.0..=100.0).contains(&health_score) {
        return Err(SynapseError::InvalidInput(format!(
            "health score must be within [0, 100], got {}",
            health_score
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn orchestra() -> NeuralOrchestra {
        NeuralOrchestra::new(NeuralConfig::default()).unwrap()
    }

    fn calm(id: &str) -> TelemetrySnapshot {
        TelemetrySnapshot::new(id)
            .with_usage(65.0, 50.0)
            .with_throughput(500.0)
            .with_latency(20.0, 5.0)
            .with_error_rate(0.001)
    }

    #[test]
    fn test_registration() {
        let engine = orchestra();
        let profile = ComponentProfile::new("mcu-1", "Motor controller", ComponentKind::Firmware);
        engine.register_component(profile.clone()).unwrap();

        assert!(matches!(
            engine.register_component(profile),
            Err(SynapseError::DuplicateComponent(_))
        ));
        assert!(matches!(
            engine.register_component(ComponentProfile::new("x", "x", ComponentKind::Software).with_health(120.0)),
            Err(SynapseError::InvalidInput(_))
        ));
        assert_eq!(engine.component_ids(), vec!["mcu-1".to_string()]);
    }

    #[test]
    fn test_unknown_component() {
        let engine = orchestra();
        assert!(matches!(
            engine.process_telemetry("ghost", &calm("ghost")),
            Err(SynapseError::ComponentNotFound(_))
        ));
        assert!(engine.update_health("ghost", 50.0).is_err());
    }

    #[test]
    fn test_misrouted_snapshot() {
        let engine = orchestra();
        engine
            .register_component(ComponentProfile::new("a", "A", ComponentKind::Software))
            .unwrap();
        assert!(matches!(
            engine.process_telemetry("a", &calm("b")),
            Err(SynapseError::InvalidInput(_))
        ));
        assert_eq!(engine.metrics().rejected_snapshots_total.get(), 1);
    }

    #[test]
    fn test_healthy_component_runs_free() {
        let engine = orchestra();
        engine
            .register_component(ComponentProfile::new("svc", "API", ComponentKind::Software))
            .unwrap();

        let decision = engine.process_telemetry("svc", &calm("svc")).unwrap();
        assert!(!decision.quarantined);
        assert_eq!(decision.brake.action(), MitigationAction::None);
        assert!(decision.transition.is_none());
        assert!(decision.final_throttle > 0.9);
        assert_eq!(engine.recent_balance("svc", 10).unwrap().len(), 1);
    }

    #[test]
    fn test_brake_limits_final_throttle() {
        let engine = orchestra();
        engine
            .register_component(
                ComponentProfile::new("svc", "API", ComponentKind::Software)
                    .with_integration(IntegrationStats::new(10, 6000, 1)),
            )
            .unwrap();

        // debt 6.0: hard brake to 0.5
        let decision = engine.process_telemetry("svc", &calm("svc")).unwrap();
        assert_eq!(decision.brake.action(), MitigationAction::Brake);
        assert!((decision.final_throttle - 0.5).abs() < 1e-9);
        assert!(decision
            .verdicts
            .iter()
            .any(|v| v.action() == MitigationAction::Brake));
    }

    #[test]
    fn test_quarantine_and_restore() {
        let engine = orchestra();
        engine
            .register_component(ComponentProfile::new("gpu", "GPU", ComponentKind::Hardware))
            .unwrap();
        let start = Utc::now();

        let overheated = calm("gpu").with_temperature(97.0);
        let decision = engine.process_telemetry_at("gpu", &overheated, start).unwrap();
        assert!(decision.quarantined);
        assert_eq!(decision.final_throttle, 0.0);
        assert!(matches!(decision.transition, Some(Transition::Quarantined(_))));
        assert!(decision.balance.is_none());
        assert_eq!(engine.quarantine_records().len(), 1);

        // Still hot: no second record, still stopped
        let decision = engine
            .process_telemetry_at("gpu", &overheated, start + Duration::minutes(5))
            .unwrap();
        assert!(decision.quarantined);
        assert!(decision.transition.is_none());

        // Cooled down but too early
        let decision = engine
            .process_telemetry_at("gpu", &calm("gpu"), start + Duration::minutes(59))
            .unwrap();
        assert!(decision.quarantined);
        assert_eq!(decision.final_throttle, 0.0);

        // Dwell time met
        let decision = engine
            .process_telemetry_at("gpu", &calm("gpu"), start + Duration::minutes(60))
            .unwrap();
        assert!(!decision.quarantined);
        assert!(matches!(decision.transition, Some(Transition::Restored(_))));
        assert!((decision.final_throttle - 0.5).abs() < 1e-9);
        assert!(engine.quarantine_records().is_empty());

        let status = engine.component_status("gpu").unwrap();
        assert!(status.quarantine.is_none());
        assert!((status.throttle_level - 0.5).abs() < 1e-9);
        assert_eq!(engine.metrics().quarantines_total.get(), 1);
        assert_eq!(engine.metrics().restores_total.get(), 1);
    }

    #[test]
    fn test_restore_blocked_by_health() {
        let engine = orchestra();
        engine
            .register_component(
                ComponentProfile::new("nic", "NIC", ComponentKind::Hardware).with_health(15.0),
            )
            .unwrap();
        let start = Utc::now();

        let decision = engine.process_telemetry_at("nic", &calm("nic"), start).unwrap();
        assert!(decision.quarantined);

        engine.update_health("nic", 65.0).unwrap();
        let decision = engine
            .process_telemetry_at("nic", &calm("nic"), start + Duration::hours(2))
            .unwrap();
        assert!(decision.quarantined);

        engine.update_health("nic", 70.0).unwrap();
        let decision = engine
            .process_telemetry_at("nic", &calm("nic"), start + Duration::hours(2))
            .unwrap();
        assert!(!decision.quarantined);
    }

    #[test]
    fn test_system_health() {
        let engine = orchestra();
        assert_eq!(engine.system_health(), SystemHealth::empty());

        engine
            .register_component(ComponentProfile::new("a", "A", ComponentKind::Software))
            .unwrap();
        engine
            .register_component(
                ComponentProfile::new("b", "B", ComponentKind::Software)
                    .with_integration(IntegrationStats::new(5, 10_000, 1))
                    .with_health(60.0),
            )
            .unwrap();

        let health = engine.system_health();
        assert_eq!(health.total_components, 2);
        assert_eq!(health.warning_count, 1);
        assert_eq!(health.average_health, 80.0);
    }
}
