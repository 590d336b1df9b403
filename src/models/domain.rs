use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

/// Measure key used by the single slot a garment exposes when no slots are configured
pub const GENERIC_MEASURE_KEY: &str = "generic";

/// Catalog clothing item
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Garment {
    pub id: Uuid,
    pub key: String,
    #[serde(default)]
    pub description: Option<String>,
    pub category: String,
}

/// Numbered measurement input position of a garment
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MeasurementSlot {
    pub slot: u16,
    #[serde(rename = "measureKey")]
    pub measure_key: String,
}

impl MeasurementSlot {
    pub fn new(slot: u16, measure_key: impl Into<String>) -> Self {
        Self {
            slot,
            measure_key: measure_key.into(),
        }
    }
}

/// Measurement form of a garment
///
/// `FallbackGeneric` means the garment exists but nobody configured its
/// slots yet. It is not the same thing as a garment that needs no
/// measurements at all.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "slots", rename_all = "camelCase")]
pub enum SlotLayout {
    Defined(Vec<MeasurementSlot>),
    FallbackGeneric,
}

impl SlotLayout {
    /// Build a layout from stored slots, sorting by slot number
    pub fn from_slots(mut slots: Vec<MeasurementSlot>) -> Self {
        if slots.is_empty() {
            return SlotLayout::FallbackGeneric;
        }
        slots.sort_by_key(|s| s.slot);
        SlotLayout::Defined(slots)
    }

    /// Slots the measurement form should render
    pub fn slots(&self) -> Vec<MeasurementSlot> {
        match self {
            SlotLayout::Defined(slots) => slots.clone(),
            SlotLayout::FallbackGeneric => vec![MeasurementSlot::new(1, GENERIC_MEASURE_KEY)],
        }
    }

    /// Measure keys of the configured slots, in slot order
    pub fn measure_keys(&self) -> impl Iterator<Item = &str> {
        let slots: &[MeasurementSlot] = match self {
            SlotLayout::Defined(slots) => slots.as_slice(),
            SlotLayout::FallbackGeneric => &[],
        };
        slots.iter().map(|s| s.measure_key.as_str())
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self, SlotLayout::FallbackGeneric)
    }
}

/// A range rule mapping one measurement to a size label
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SizeRule {
    pub id: Uuid,
    #[serde(rename = "garmentId")]
    pub garment_id: Uuid,
    #[serde(rename = "measureKey")]
    pub measure_key: String,
    pub label: String,
    #[serde(rename = "minValue")]
    pub min_value: i32,
    #[serde(rename = "maxValue")]
    pub max_value: i32,
    pub priority: i32,
}

impl SizeRule {
    /// Inclusive range containment
    #[inline]
    pub fn contains(&self, value: i32) -> bool {
        self.min_value <= value && value <= self.max_value
    }
}

/// A size rule before the store assigned it an id
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewSizeRule {
    #[serde(rename = "garmentId")]
    pub garment_id: Uuid,
    #[serde(rename = "measureKey")]
    pub measure_key: String,
    pub label: String,
    #[serde(rename = "minValue")]
    pub min_value: i32,
    #[serde(rename = "maxValue")]
    pub max_value: i32,
    #[serde(default)]
    pub priority: i32,
}

impl NewSizeRule {
    /// Check the range and the required strings
    pub fn validate(&self) -> Result<(), String> {
        if self.measure_key.trim().is_empty() {
            return Err("measure key must not be empty".to_string());
        }
        if self.label.trim().is_empty() {
            return Err("size label must not be empty".to_string());
        }
        if self.min_value > self.max_value {
            return Err(format!(
                "minValue {} exceeds maxValue {}",
                self.min_value, self.max_value
            ));
        }
        Ok(())
    }

    pub fn into_rule(self, id: Uuid) -> SizeRule {
        SizeRule {
            id,
            garment_id: self.garment_id,
            measure_key: self.measure_key,
            label: self.label,
            min_value: self.min_value,
            max_value: self.max_value,
            priority: self.priority,
        }
    }
}

/// Size rules of one garment grouped by measure key
///
/// Groups appear in the order their key was first seen, and rules inside a
/// group keep the order they were stored in. Both orders matter to the
/// resolver.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleTable {
    groups: Vec<RuleGroup>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleGroup {
    #[serde(rename = "measureKey")]
    pub measure_key: String,
    pub rules: Vec<SizeRule>,
}

impl RuleTable {
    /// Group rules, given in stored order
    pub fn from_rules<I>(rules: I) -> Self
    where
        I: IntoIterator<Item = SizeRule>,
    {
        let mut table = RuleTable::default();
        for rule in rules {
            table.push(rule);
        }
        table
    }

    /// Append a rule at the end of its key's group
    pub fn push(&mut self, rule: SizeRule) {
        match self
            .groups
            .iter_mut()
            .find(|g| g.measure_key == rule.measure_key)
        {
            Some(group) => group.rules.push(rule),
            None => self.groups.push(RuleGroup {
                measure_key: rule.measure_key.clone(),
                rules: vec![rule],
            }),
        }
    }

    pub fn get(&self, measure_key: &str) -> Option<&[SizeRule]> {
        self.groups
            .iter()
            .find(|g| g.measure_key == measure_key)
            .map(|g| g.rules.as_slice())
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.groups.iter().map(|g| g.measure_key.as_str())
    }

    pub fn groups(&self) -> &[RuleGroup] {
        &self.groups
    }

    pub fn is_empty(&self) -> bool {
        self.groups.iter().all(|g| g.rules.is_empty())
    }

    pub fn len(&self) -> usize {
        self.groups.iter().map(|g| g.rules.len()).sum()
    }
}

/// Raw form values keyed by measure key
pub type MeasurementInput = HashMap<String, String>;

/// One stored measurement of a record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MeasurementValue {
    #[serde(rename = "measureKey")]
    pub measure_key: String,
    pub value: i32,
}

/// The current measurement set of one user for one garment
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MeasurementRecord {
    pub id: Uuid,
    #[serde(rename = "userId")]
    pub user_id: String,
    #[serde(rename = "companyId")]
    pub company_id: Uuid,
    #[serde(rename = "garmentId")]
    pub garment_id: Uuid,
    #[serde(rename = "sizeLabel")]
    pub size_label: String,
    pub values: Vec<MeasurementValue>,
    #[serde(rename = "updatedAt")]
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

/// Write model handed to the record store
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewMeasurementRecord {
    pub user_id: String,
    pub company_id: Uuid,
    pub garment_id: Uuid,
    pub size_label: String,
    pub values: Vec<MeasurementValue>,
}

/// Number of current records per garment and size in one company
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SizeCount {
    #[serde(rename = "garmentId")]
    pub garment_id: Uuid,
    #[serde(rename = "sizeLabel")]
    pub size_label: String,
    pub count: i64,
}

/// One row of the company size distribution report
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SizeDistributionRow {
    #[serde(rename = "garmentId")]
    pub garment_id: Uuid,
    #[serde(rename = "garmentLabel")]
    pub garment_label: String,
    pub category: String,
    #[serde(rename = "sizeLabel")]
    pub size_label: String,
    pub count: i64,
}

/// Authenticated actor, as supplied by the identity provider
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub user_id: String,
    pub company_id: Uuid,
    pub is_admin: bool,
}
