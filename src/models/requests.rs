use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;
use validator::Validate;

/// Request to resolve a size for a measurement set without saving it
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ResolveSizeRequest {
    #[serde(alias = "garment_id", rename = "garmentId")]
    pub garment_id: Uuid,
    #[serde(default)]
    pub measurements: HashMap<String, String>,
}

/// Request to save the caller's measurements for a garment
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct SaveMeasurementsRequest {
    #[serde(alias = "garment_id", rename = "garmentId")]
    pub garment_id: Uuid,
    #[validate(length(min = 1))]
    pub measurements: HashMap<String, String>,
}

/// Request to append a size rule to a garment
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateSizeRuleRequest {
    #[validate(length(min = 1, max = 64))]
    #[serde(alias = "measure_key", rename = "measureKey")]
    pub measure_key: String,
    #[validate(length(min = 1, max = 32))]
    pub label: String,
    #[serde(alias = "min_value", rename = "minValue")]
    pub min_value: i32,
    #[serde(alias = "max_value", rename = "maxValue")]
    pub max_value: i32,
    #[serde(default)]
    pub priority: i32,
}
