//! Storage ports of the sizing service.
//!
//! The engine is written against these traits; `PostgresStore` and
//! `MemoryStore` are the two adapters.

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;
use crate::models::{
    Garment, MeasurementRecord, NewMeasurementRecord, NewSizeRule, RuleTable, SizeCount, SizeRule,
    SlotLayout,
};

/// Errors that can occur in a storage adapter
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("SQLx error: {0}")]
    SqlxError(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    MigrateError(#[from] sqlx::migrate::MigrateError),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl StoreError {
    pub fn garment_not_found(garment_id: Uuid) -> Self {
        StoreError::NotFound(format!("garment {}", garment_id))
    }
}

/// Garment catalog, measurement slots and size rules
#[async_trait]
pub trait CatalogStore: Send + Sync {
    /// Fetch one garment, `NotFound` if the id is unknown
    async fn garment(&self, garment_id: Uuid) -> Result<Garment, StoreError>;

    /// Fetch the garments among `garment_ids` that exist
    async fn garments(&self, garment_ids: &[Uuid]) -> Result<Vec<Garment>, StoreError>;

    /// Garments assigned to a company, ordered by key
    async fn company_garments(&self, company_id: Uuid) -> Result<Vec<Garment>, StoreError>;

    /// Measurement form of a garment, `NotFound` if the garment is unknown
    async fn slots(&self, garment_id: Uuid) -> Result<SlotLayout, StoreError>;

    /// Size rules of a garment in stored order, `NotFound` if the garment is unknown
    async fn rules(&self, garment_id: Uuid) -> Result<RuleTable, StoreError>;

    /// Append a rule after the garment's existing rules
    async fn add_rule(&self, rule: NewSizeRule) -> Result<SizeRule, StoreError>;

    /// Remove a rule; returns false if the garment has no such rule
    async fn remove_rule(&self, garment_id: Uuid, rule_id: Uuid) -> Result<bool, StoreError>;
}

/// Current measurement records of users
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Create the (user, garment) record or replace its values and label
    ///
    /// Must be atomic with respect to the existence check.
    async fn upsert_record(
        &self,
        record: NewMeasurementRecord,
    ) -> Result<MeasurementRecord, StoreError>;

    /// Records of a user, newest first
    async fn list_records(&self, user_id: &str) -> Result<Vec<MeasurementRecord>, StoreError>;

    /// Delete a record owned by `user_id`; returns false if none matched
    async fn delete_record(&self, user_id: &str, record_id: Uuid) -> Result<bool, StoreError>;

    /// Count current records per (garment, size) across a company
    async fn size_counts(&self, company_id: Uuid) -> Result<Vec<SizeCount>, StoreError>;

    /// Health check for the backing storage
    async fn health_check(&self) -> Result<bool, StoreError>;
}
