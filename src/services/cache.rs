use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use uuid::Uuid;
use crate::models::{NewSizeRule, RuleTable, SizeRule, SlotLayout};
use crate::services::store::{CatalogStore, StoreError};

/// Everything the resolver needs to know about one garment
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GarmentSizing {
    pub layout: SlotLayout,
    pub rules: RuleTable,
}

/// Read-through cache in front of the catalog
///
/// Slot layouts and rule tables are read on every keystroke of a
/// measurement form but change rarely, so they are kept in an in-memory
/// L1 cache with a TTL. Rule mutations made through this cache evict the
/// affected garment right away.
///
/// Every eviction bumps the garment's generation. A load only fills the
/// cache if the generation it started under is still current, so a read
/// racing a rule change cannot put the old table back.
pub struct CatalogCache {
    catalog: Arc<dyn CatalogStore>,
    l1_cache: moka::future::Cache<String, Arc<GarmentSizing>>,
    generations: Mutex<HashMap<Uuid, u64>>,
}

impl CatalogCache {
    /// Create a new catalog cache
    pub fn new(catalog: Arc<dyn CatalogStore>, capacity: u64, ttl_secs: u64) -> Self {
        let l1_cache = moka::future::CacheBuilder::new(capacity)
            .time_to_live(Duration::from_secs(ttl_secs))
            .build();

        Self {
            catalog,
            l1_cache,
            generations: Mutex::new(HashMap::new()),
        }
    }

    /// Underlying catalog store
    pub fn catalog(&self) -> &Arc<dyn CatalogStore> {
        &self.catalog
    }

    /// Get the slot layout and rules of a garment, loading them on a miss
    pub async fn sizing(&self, garment_id: Uuid) -> Result<Arc<GarmentSizing>, StoreError> {
        let key = CacheKey::sizing(garment_id);

        if let Some(sizing) = self.l1_cache.get(&key).await {
            tracing::trace!("L1 cache hit: {}", key);
            return Ok(sizing);
        }

        tracing::trace!("Cache miss: {}", key);
        let started = self.generation(garment_id).await;
        let layout = self.catalog.slots(garment_id).await?;
        let rules = self.catalog.rules(garment_id).await?;
        let sizing = Arc::new(GarmentSizing { layout, rules });

        // Held across the insert so an eviction cannot slip in between
        let generations = self.generations.lock().await;
        if generations.get(&garment_id).copied().unwrap_or(0) == started {
            self.l1_cache.insert(key, sizing.clone()).await;
        } else {
            tracing::debug!("Discarded load of {} after a concurrent rule change", key);
        }
        Ok(sizing)
    }

    /// Append a rule and evict the garment
    pub async fn add_rule(&self, rule: NewSizeRule) -> Result<SizeRule, StoreError> {
        let garment_id = rule.garment_id;
        let created = self.catalog.add_rule(rule).await?;
        self.invalidate(garment_id).await;
        Ok(created)
    }

    /// Remove a rule and evict the garment
    pub async fn remove_rule(&self, garment_id: Uuid, rule_id: Uuid) -> Result<bool, StoreError> {
        let removed = self.catalog.remove_rule(garment_id, rule_id).await?;
        self.invalidate(garment_id).await;
        Ok(removed)
    }

    /// Drop the cached entry of one garment
    pub async fn invalidate(&self, garment_id: Uuid) {
        let key = CacheKey::sizing(garment_id);
        let mut generations = self.generations.lock().await;
        *generations.entry(garment_id).or_insert(0) += 1;
        self.l1_cache.invalidate(&key).await;
        tracing::debug!("Invalidated cache entry: {}", key);
    }

    async fn generation(&self, garment_id: Uuid) -> u64 {
        self.generations
            .lock()
            .await
            .get(&garment_id)
            .copied()
            .unwrap_or(0)
    }

    /// Number of cached garments
    pub fn entry_count(&self) -> u64 {
        self.l1_cache.entry_count()
    }
}

/// Cache key builder
pub struct CacheKey;

impl CacheKey {
    /// Build a cache key for a garment's slots and rules
    pub fn sizing(garment_id: Uuid) -> String {
        format!("sizing:{}", garment_id)
    }
}
