//! Catalog seed data for the in-memory store.
//!
//! A seed file lists garments with their measurement slots, size rules and
//! the companies they are assigned to:
//!
//! ```toml
//! [[garments]]
//! id = "7d9f3c1e-2a4b-4c5d-8e6f-0a1b2c3d4e5f"
//! key = "work_jacket"
//! category = "outerwear"
//! slots = ["chest", "waist"]
//! companies = ["5b8e2f10-9c3d-4a7e-b1f2-3c4d5e6f7a8b"]
//!
//! [[garments.rules]]
//! measure_key = "chest"
//! label = "S"
//! min_value = 88
//! max_value = 96
//! priority = 1
//! ```

use config::{Config, ConfigError, File};
use serde::Deserialize;
use std::path::Path;
use uuid::Uuid;
use crate::models::{Garment, MeasurementSlot, NewSizeRule};
use crate::services::memory::MemoryStore;
use crate::services::store::{CatalogStore, StoreError};

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SeedData {
    #[serde(default)]
    pub garments: Vec<SeedGarment>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SeedGarment {
    pub id: Uuid,
    pub key: String,
    #[serde(default)]
    pub description: Option<String>,
    pub category: String,
    /// Measure keys in slot order; empty means the generic slot
    #[serde(default)]
    pub slots: Vec<String>,
    #[serde(default)]
    pub companies: Vec<Uuid>,
    /// Rules in stored order
    #[serde(default)]
    pub rules: Vec<SeedRule>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SeedRule {
    pub measure_key: String,
    pub label: String,
    pub min_value: i32,
    pub max_value: i32,
    #[serde(default)]
    pub priority: i32,
}

impl SeedData {
    /// Read a seed file (any format the config loader understands)
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        Config::builder()
            .add_source(File::from(path.as_ref()))
            .build()?
            .try_deserialize()
    }

    /// Write the seed into a store; returns the number of garments loaded
    pub async fn apply(self, store: &MemoryStore) -> Result<usize, StoreError> {
        let count = self.garments.len();

        for seed in self.garments {
            store
                .insert_garment(Garment {
                    id: seed.id,
                    key: seed.key,
                    description: seed.description,
                    category: seed.category,
                })
                .await;

            if !seed.slots.is_empty() {
                let slots = seed
                    .slots
                    .into_iter()
                    .enumerate()
                    .map(|(i, key)| MeasurementSlot::new(i as u16 + 1, key))
                    .collect();
                store.set_slots(seed.id, slots).await?;
            }

            for company_id in seed.companies {
                store.assign_garment(company_id, seed.id).await?;
            }

            for rule in seed.rules {
                store
                    .add_rule(NewSizeRule {
                        garment_id: seed.id,
                        measure_key: rule.measure_key,
                        label: rule.label,
                        min_value: rule.min_value,
                        max_value: rule.max_value,
                        priority: rule.priority,
                    })
                    .await?;
            }
        }

        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_seed(contents: &str) -> std::path::PathBuf {
        let path = std::env::temp_dir().join(format!("seed-{}.toml", Uuid::new_v4()));
        std::fs::write(&path, contents).unwrap();
        path
    }

    #[tokio::test]
    async fn test_seed_file_populates_store() {
        let garment_id = Uuid::new_v4();
        let company_id = Uuid::new_v4();
        let path = write_seed(&format!(
            r#"
            [[garments]]
            id = "{garment_id}"
            key = "work_jacket"
            category = "outerwear"
            slots = ["chest", "waist"]
            companies = ["{company_id}"]

            [[garments.rules]]
            measure_key = "chest"
            label = "S"
            min_value = 88
            max_value = 96
            priority = 1

            [[garments.rules]]
            measure_key = "chest"
            label = "M"
            min_value = 97
            max_value = 104
            priority = 1
            "#
        ));

        let seed = SeedData::load(&path).unwrap();
        std::fs::remove_file(&path).ok();

        let store = MemoryStore::new();
        assert_eq!(seed.apply(&store).await.unwrap(), 1);

        let keys: Vec<String> = store
            .slots(garment_id)
            .await
            .unwrap()
            .measure_keys()
            .map(str::to_string)
            .collect();
        assert_eq!(keys, vec!["chest", "waist"]);

        let rules = store.rules(garment_id).await.unwrap();
        let labels: Vec<&str> = rules
            .get("chest")
            .unwrap()
            .iter()
            .map(|r| r.label.as_str())
            .collect();
        assert_eq!(labels, vec!["S", "M"]);

        let garments = store.company_garments(company_id).await.unwrap();
        assert_eq!(garments.len(), 1);
        assert_eq!(garments[0].key, "work_jacket");
    }

    #[tokio::test]
    async fn test_seed_without_slots_uses_generic_slot() {
        let garment_id = Uuid::new_v4();
        let path = write_seed(&format!(
            r#"
            [[garments]]
            id = "{garment_id}"
            key = "cap"
            category = "headwear"
            "#
        ));

        let seed = SeedData::load(&path).unwrap();
        std::fs::remove_file(&path).ok();

        let store = MemoryStore::new();
        seed.apply(&store).await.unwrap();
        assert!(store.slots(garment_id).await.unwrap().is_fallback());
    }

    #[tokio::test]
    async fn test_seed_rejects_inverted_range() {
        let path = write_seed(&format!(
            r#"
            [[garments]]
            id = "{}"
            key = "polo"
            category = "shirts"

            [[garments.rules]]
            measure_key = "chest"
            label = "L"
            min_value = 110
            max_value = 100
            "#,
            Uuid::new_v4()
        ));

        let seed = SeedData::load(&path).unwrap();
        std::fs::remove_file(&path).ok();

        let result = seed.apply(&MemoryStore::new()).await;
        assert!(matches!(result, Err(StoreError::InvalidInput(_))));
    }

    #[tokio::test]
    async fn test_bundled_seed_file_loads() {
        let seed = SeedData::load("config/seed.toml").unwrap();
        let store = MemoryStore::new();
        assert!(seed.apply(&store).await.unwrap() > 0);
    }
}
