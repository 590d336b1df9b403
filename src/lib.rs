//! Workwear Sizing - size determination for employee work clothing
//!
//! This library maps body measurements to garment size labels using
//! per-garment range tables, stores each employee's current measurement
//! set and aggregates company-wide size distributions.

pub mod config;
pub mod core;
pub mod models;
pub mod routes;
pub mod services;

// Re-export commonly used types
pub use crate::core::{Resolution, ResolutionSource, SizeResolver, parse_measurement};
pub use models::{MeasurementRecord, RuleTable, SizeRule, SlotLayout, SizeDistributionRow};
pub use services::{SizingError, SizingService};
