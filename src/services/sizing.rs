use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;
use uuid::Uuid;
use crate::core::{build_distribution, parse_measurement, Resolution, SizeResolver};
use crate::models::{
    Garment, Identity, MeasurementInput, MeasurementRecord, MeasurementValue, NewMeasurementRecord,
    NewSizeRule, SizeDistributionRow, SizeRule, SlotLayout,
};
use crate::services::cache::CatalogCache;
use crate::services::store::{RecordStore, StoreError};

/// Errors surfaced to callers of the sizing service
#[derive(Debug, Error)]
pub enum SizingError {
    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Authentication required: {0}")]
    Auth(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Storage error: {0}")]
    Storage(#[source] StoreError),
}

impl From<StoreError> for SizingError {
    fn from(value: StoreError) -> Self {
        match value {
            StoreError::NotFound(what) => SizingError::NotFound(what),
            StoreError::InvalidInput(message) => SizingError::Validation(message),
            other => SizingError::Storage(other),
        }
    }
}

/// Application service tying the engine to the catalog and the record store
///
/// Identities are taken from the caller as already authenticated; a
/// missing identity on a write is an `Auth` error.
#[derive(Clone)]
pub struct SizingService {
    catalog: Arc<CatalogCache>,
    records: Arc<dyn RecordStore>,
    resolver: SizeResolver,
}

impl SizingService {
    pub fn new(
        catalog: Arc<CatalogCache>,
        records: Arc<dyn RecordStore>,
        resolver: SizeResolver,
    ) -> Self {
        Self {
            catalog,
            records,
            resolver,
        }
    }

    /// Measurement form of a garment
    pub async fn slots(&self, garment_id: Uuid) -> Result<SlotLayout, SizingError> {
        let sizing = self.catalog.sizing(garment_id).await?;
        Ok(sizing.layout.clone())
    }

    /// Size rules of a garment in stored order
    pub async fn rules(&self, garment_id: Uuid) -> Result<Vec<SizeRule>, SizingError> {
        let sizing = self.catalog.sizing(garment_id).await?;
        Ok(sizing
            .rules
            .groups()
            .iter()
            .flat_map(|g| g.rules.iter().cloned())
            .collect())
    }

    /// Garments the caller's company can order
    pub async fn company_garments(
        &self,
        identity: Option<&Identity>,
    ) -> Result<Vec<Garment>, SizingError> {
        let identity = require_identity(identity)?;
        Ok(self
            .catalog
            .catalog()
            .company_garments(identity.company_id)
            .await?)
    }

    /// Resolve a size label without storing anything
    pub async fn resolve(
        &self,
        garment_id: Uuid,
        measurements: &MeasurementInput,
    ) -> Result<Resolution, SizingError> {
        let sizing = self.catalog.sizing(garment_id).await?;
        Ok(self
            .resolver
            .resolve(&sizing.layout, &sizing.rules, measurements))
    }

    /// Save the caller's measurements for a garment, replacing any earlier set
    pub async fn save(
        &self,
        identity: Option<&Identity>,
        garment_id: Uuid,
        measurements: &MeasurementInput,
    ) -> Result<MeasurementRecord, SizingError> {
        let identity = require_identity(identity)?;

        let sizing = match self.catalog.sizing(garment_id).await {
            Ok(sizing) => sizing,
            Err(StoreError::NotFound(_)) => {
                return Err(SizingError::Validation(format!(
                    "unknown garment {}",
                    garment_id
                )))
            }
            Err(e) => return Err(e.into()),
        };

        let values = stored_values(&sizing.layout, measurements);
        if values.is_empty() {
            return Err(SizingError::Validation(
                "at least one numeric measurement is required".to_string(),
            ));
        }

        let resolution = self
            .resolver
            .resolve(&sizing.layout, &sizing.rules, measurements);

        tracing::info!(
            "Saving {} measurements for user {} garment {} as {} ({:?})",
            values.len(),
            identity.user_id,
            garment_id,
            resolution.label,
            resolution.source
        );

        let record = self
            .records
            .upsert_record(NewMeasurementRecord {
                user_id: identity.user_id.clone(),
                company_id: identity.company_id,
                garment_id,
                size_label: resolution.label,
                values,
            })
            .await
            .map_err(|e| match e {
                // Garment vanished between lookup and write
                StoreError::NotFound(what) => SizingError::Validation(what),
                other => SizingError::from(other),
            })?;

        Ok(record)
    }

    /// Current records of the caller, newest first
    pub async fn list(
        &self,
        identity: Option<&Identity>,
    ) -> Result<Vec<MeasurementRecord>, SizingError> {
        let identity = require_identity(identity)?;
        Ok(self.records.list_records(&identity.user_id).await?)
    }

    /// Delete one of the caller's records
    pub async fn delete(
        &self,
        identity: Option<&Identity>,
        record_id: Uuid,
    ) -> Result<(), SizingError> {
        let identity = require_identity(identity)?;
        if self
            .records
            .delete_record(&identity.user_id, record_id)
            .await?
        {
            tracing::info!("Deleted record {} of user {}", record_id, identity.user_id);
            Ok(())
        } else {
            Err(SizingError::NotFound(format!("record {}", record_id)))
        }
    }

    /// Size distribution of a company
    pub async fn aggregate(&self, company_id: Uuid) -> Result<Vec<SizeDistributionRow>, SizingError> {
        let counts = self.records.size_counts(company_id).await?;

        let mut garment_ids: Vec<Uuid> = counts.iter().map(|c| c.garment_id).collect();
        garment_ids.sort();
        garment_ids.dedup();

        let garments: HashMap<Uuid, Garment> = self
            .catalog
            .catalog()
            .garments(&garment_ids)
            .await?
            .into_iter()
            .map(|g| (g.id, g))
            .collect();

        Ok(build_distribution(counts, &garments))
    }

    /// Append a size rule (administrators only)
    pub async fn add_rule(
        &self,
        identity: Option<&Identity>,
        rule: NewSizeRule,
    ) -> Result<SizeRule, SizingError> {
        require_admin(identity)?;
        Ok(self.catalog.add_rule(rule).await?)
    }

    /// Remove a size rule (administrators only)
    pub async fn remove_rule(
        &self,
        identity: Option<&Identity>,
        garment_id: Uuid,
        rule_id: Uuid,
    ) -> Result<(), SizingError> {
        require_admin(identity)?;
        if self.catalog.remove_rule(garment_id, rule_id).await? {
            Ok(())
        } else {
            Err(SizingError::NotFound(format!("rule {}", rule_id)))
        }
    }

    /// Health check for the record store
    pub async fn health_check(&self) -> bool {
        self.records.health_check().await.unwrap_or(false)
    }
}

fn require_identity(identity: Option<&Identity>) -> Result<&Identity, SizingError> {
    identity.ok_or_else(|| SizingError::Auth("no authenticated user".to_string()))
}

fn require_admin(identity: Option<&Identity>) -> Result<&Identity, SizingError> {
    let identity = require_identity(identity)?;
    if identity.is_admin {
        Ok(identity)
    } else {
        Err(SizingError::Forbidden("administrator role required".to_string()))
    }
}

/// Parsed values to persist, slot keys first, then the rest by key
fn stored_values(layout: &SlotLayout, measurements: &MeasurementInput) -> Vec<MeasurementValue> {
    let mut keys: Vec<&str> = layout.measure_keys().collect();
    let mut extra: Vec<&str> = measurements
        .keys()
        .map(String::as_str)
        .filter(|k| !keys.contains(k))
        .collect();
    extra.sort_unstable();
    keys.extend(extra);

    keys.into_iter()
        .filter_map(|key| {
            let value = parse_measurement(measurements.get(key)?)?;
            Some(MeasurementValue {
                measure_key: key.to_string(),
                value,
            })
        })
        .collect()
}
