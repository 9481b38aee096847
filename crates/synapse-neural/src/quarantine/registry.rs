//! Active quarantine records, one per isolated component

use chrono::{DateTime, Utc};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use synapse_common::QuarantineRecord;
use tracing::{info, warn};

use super::gate::{QuarantineGate, RestoreBlocker};

#[derive(Debug, Default)]
pub struct QuarantineRegistry {
    records: DashMap<String, QuarantineRecord>,
}

impl QuarantineRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a quarantine. Returns `false` and keeps the existing record if
    /// the component is already isolated.
    pub fn admit(&self, record: QuarantineRecord) -> bool {
        match self.records.entry(record.component_id.clone()) {
            Entry::Occupied(_) => false,
            Entry::Vacant(slot) => {
                warn!(
                    component_id = %record.component_id,
                    debt = record.debt_score_at_quarantine,
                    health = record.health_at_quarantine,
                    reason = %record.reason,
                    "Component quarantined"
                );
                slot.insert(record);
                true
            }
        }
    }

    /// Release a component if every restoration condition holds as of `now`
    pub fn release(
        &self,
        component_id: &str,
        debt: f64,
        health: f64,
        now: DateTime<Utc>,
    ) -> Result<QuarantineRecord, RestoreBlocker> {
        match self.records.entry(component_id.to_string()) {
            Entry::Vacant(_) => Err(RestoreBlocker::NotQuarantined),
            Entry::Occupied(slot) => {
                let quarantined_at = slot.get().quarantined_at;
                if let Some(blocker) =
                    QuarantineGate::restore_blocker(debt, health, quarantined_at, now)
                {
                    return Err(blocker);
                }
                let record = slot.remove();
                info!(
                    component_id,
                    held_secs = record.elapsed(now).num_seconds(),
                    "Component restored from quarantine"
                );
                Ok(record)
            }
        }
    }

    pub fn get(&self, component_id: &str) -> Option<QuarantineRecord> {
        self.records.get(component_id).map(|r| r.clone())
    }

    pub fn is_quarantined(&self, component_id: &str) -> bool {
        self.records.contains_key(component_id)
    }

    /// Snapshot of all active records
    pub fn active(&self) -> Vec<QuarantineRecord> {
        self.records.iter().map(|r| r.value().clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
