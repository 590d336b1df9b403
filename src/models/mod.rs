// Model exports
pub mod domain;
pub mod requests;
pub mod responses;

pub use domain::{
    Garment, Identity, MeasurementInput, MeasurementRecord, MeasurementSlot, MeasurementValue,
    NewMeasurementRecord, NewSizeRule, RuleGroup, RuleTable, SizeCount, SizeDistributionRow,
    SizeRule, SlotLayout, GENERIC_MEASURE_KEY,
};
pub use requests::{CreateSizeRuleRequest, ResolveSizeRequest, SaveMeasurementsRequest};
pub use responses::{
    DistributionResponse, ErrorResponse, HealthResponse, RecordsResponse, ResolveSizeResponse,
    SlotsResponse,
};
