use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use tokio::sync::RwLock;
use uuid::Uuid;
use crate::models::{
    Garment, MeasurementRecord, MeasurementSlot, NewMeasurementRecord, NewSizeRule, RuleTable,
    SizeCount, SizeRule, SlotLayout,
};
use crate::services::store::{CatalogStore, RecordStore, StoreError};

#[derive(Debug, Default)]
struct State {
    garments: HashMap<Uuid, Garment>,
    slots: HashMap<Uuid, Vec<MeasurementSlot>>,
    // Stored order per garment is the Vec order
    rules: HashMap<Uuid, Vec<SizeRule>>,
    assignments: HashMap<Uuid, HashSet<Uuid>>,
    records: Vec<MeasurementRecord>,
}

/// In-process store for development and tests
///
/// All state sits behind one lock, so an upsert's existence check and
/// write happen atomically.
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: RwLock<State>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a garment in the catalog
    pub async fn insert_garment(&self, garment: Garment) {
        let mut state = self.state.write().await;
        state.garments.insert(garment.id, garment);
    }

    /// Replace the measurement slots of a garment
    pub async fn set_slots(
        &self,
        garment_id: Uuid,
        slots: Vec<MeasurementSlot>,
    ) -> Result<(), StoreError> {
        let mut seen_slots = HashSet::new();
        let mut seen_keys = HashSet::new();
        for slot in &slots {
            if !seen_slots.insert(slot.slot) || !seen_keys.insert(slot.measure_key.as_str()) {
                return Err(StoreError::InvalidInput(format!(
                    "duplicate slot {} ({})",
                    slot.slot, slot.measure_key
                )));
            }
        }

        let mut state = self.state.write().await;
        if !state.garments.contains_key(&garment_id) {
            return Err(StoreError::garment_not_found(garment_id));
        }
        state.slots.insert(garment_id, slots);
        Ok(())
    }

    /// Make a garment orderable for a company
    pub async fn assign_garment(&self, company_id: Uuid, garment_id: Uuid) -> Result<(), StoreError> {
        let mut state = self.state.write().await;
        if !state.garments.contains_key(&garment_id) {
            return Err(StoreError::garment_not_found(garment_id));
        }
        state
            .assignments
            .entry(company_id)
            .or_default()
            .insert(garment_id);
        Ok(())
    }
}

#[async_trait]
impl CatalogStore for MemoryStore {
    async fn garment(&self, garment_id: Uuid) -> Result<Garment, StoreError> {
        let state = self.state.read().await;
        state
            .garments
            .get(&garment_id)
            .cloned()
            .ok_or_else(|| StoreError::garment_not_found(garment_id))
    }

    async fn garments(&self, garment_ids: &[Uuid]) -> Result<Vec<Garment>, StoreError> {
        let state = self.state.read().await;
        Ok(garment_ids
            .iter()
            .filter_map(|id| state.garments.get(id).cloned())
            .collect())
    }

    async fn company_garments(&self, company_id: Uuid) -> Result<Vec<Garment>, StoreError> {
        let state = self.state.read().await;
        let mut garments: Vec<Garment> = state
            .assignments
            .get(&company_id)
            .map(|ids| {
                ids.iter()
                    .filter_map(|id| state.garments.get(id).cloned())
                    .collect()
            })
            .unwrap_or_default();
        garments.sort_by(|a, b| a.key.cmp(&b.key));
        Ok(garments)
    }

    async fn slots(&self, garment_id: Uuid) -> Result<SlotLayout, StoreError> {
        let state = self.state.read().await;
        if !state.garments.contains_key(&garment_id) {
            return Err(StoreError::garment_not_found(garment_id));
        }
        let slots = state.slots.get(&garment_id).cloned().unwrap_or_default();
        Ok(SlotLayout::from_slots(slots))
    }

    async fn rules(&self, garment_id: Uuid) -> Result<RuleTable, StoreError> {
        let state = self.state.read().await;
        if !state.garments.contains_key(&garment_id) {
            return Err(StoreError::garment_not_found(garment_id));
        }
        let rules = state.rules.get(&garment_id).cloned().unwrap_or_default();
        Ok(RuleTable::from_rules(rules))
    }

    async fn add_rule(&self, rule: NewSizeRule) -> Result<SizeRule, StoreError> {
        rule.validate().map_err(StoreError::InvalidInput)?;

        let mut state = self.state.write().await;
        if !state.garments.contains_key(&rule.garment_id) {
            return Err(StoreError::garment_not_found(rule.garment_id));
        }
        let rule = rule.into_rule(Uuid::new_v4());
        state
            .rules
            .entry(rule.garment_id)
            .or_default()
            .push(rule.clone());
        Ok(rule)
    }

    async fn remove_rule(&self, garment_id: Uuid, rule_id: Uuid) -> Result<bool, StoreError> {
        let mut state = self.state.write().await;
        let Some(rules) = state.rules.get_mut(&garment_id) else {
            return Ok(false);
        };
        let before = rules.len();
        // retain keeps the relative order of what remains
        rules.retain(|r| r.id != rule_id);
        Ok(rules.len() < before)
    }
}

#[async_trait]
impl RecordStore for MemoryStore {
    async fn upsert_record(
        &self,
        record: NewMeasurementRecord,
    ) -> Result<MeasurementRecord, StoreError> {
        let mut state = self.state.write().await;
        if !state.garments.contains_key(&record.garment_id) {
            return Err(StoreError::garment_not_found(record.garment_id));
        }

        let now = chrono::Utc::now();
        let existing = state
            .records
            .iter_mut()
            .find(|r| r.user_id == record.user_id && r.garment_id == record.garment_id);

        let stored = match existing {
            Some(current) => {
                current.company_id = record.company_id;
                current.size_label = record.size_label;
                current.values = record.values;
                current.updated_at = now;
                current.clone()
            }
            None => {
                let created = MeasurementRecord {
                    id: Uuid::new_v4(),
                    user_id: record.user_id,
                    company_id: record.company_id,
                    garment_id: record.garment_id,
                    size_label: record.size_label,
                    values: record.values,
                    updated_at: now,
                };
                state.records.push(created.clone());
                created
            }
        };

        tracing::debug!(
            "Stored record {} for user {} garment {}",
            stored.id,
            stored.user_id,
            stored.garment_id
        );
        Ok(stored)
    }

    async fn list_records(&self, user_id: &str) -> Result<Vec<MeasurementRecord>, StoreError> {
        let state = self.state.read().await;
        let mut records: Vec<MeasurementRecord> = state
            .records
            .iter()
            .filter(|r| r.user_id == user_id)
            .cloned()
            .collect();
        records.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        Ok(records)
    }

    async fn delete_record(&self, user_id: &str, record_id: Uuid) -> Result<bool, StoreError> {
        let mut state = self.state.write().await;
        let before = state.records.len();
        state
            .records
            .retain(|r| !(r.id == record_id && r.user_id == user_id));
        Ok(state.records.len() < before)
    }

    async fn size_counts(&self, company_id: Uuid) -> Result<Vec<SizeCount>, StoreError> {
        let state = self.state.read().await;
        let mut counts: HashMap<(Uuid, String), i64> = HashMap::new();
        for record in state.records.iter().filter(|r| r.company_id == company_id) {
            *counts
                .entry((record.garment_id, record.size_label.clone()))
                .or_insert(0) += 1;
        }
        Ok(counts
            .into_iter()
            .map(|((garment_id, size_label), count)| SizeCount {
                garment_id,
                size_label,
                count,
            })
            .collect())
    }

    async fn health_check(&self) -> Result<bool, StoreError> {
        Ok(true)
    }
}
