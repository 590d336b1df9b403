use serde::{Deserialize, Serialize};
use uuid::Uuid;
use crate::core::ResolutionSource;
use crate::models::domain::{MeasurementRecord, MeasurementSlot, SizeDistributionRow};

/// Response for the resolve endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolveSizeResponse {
    #[serde(rename = "garmentId")]
    pub garment_id: Uuid,
    #[serde(rename = "sizeLabel")]
    pub size_label: String,
    pub source: ResolutionSource,
}

/// Measurement form of a garment
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SlotsResponse {
    #[serde(rename = "garmentId")]
    pub garment_id: Uuid,
    /// True when the garment has no configured slots and shows the generic one
    pub fallback: bool,
    pub slots: Vec<MeasurementSlot>,
}

/// Stored records of the caller
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordsResponse {
    pub records: Vec<MeasurementRecord>,
    pub count: usize,
}

/// Company size distribution
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DistributionResponse {
    #[serde(rename = "companyId")]
    pub company_id: Uuid,
    pub rows: Vec<SizeDistributionRow>,
}

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

/// Error response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
    pub status_code: u16,
}
