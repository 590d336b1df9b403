use serde::{Deserialize, Serialize};
use crate::core::parse::parse_measurement;
use crate::models::{MeasurementInput, RuleTable, SizeRule, SlotLayout};

/// Label returned when no measurement produced a candidate
pub const DEFAULT_SIZE_LABEL: &str = "M";

/// How a resolved label was obtained
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum ResolutionSource {
    /// A rule's range contained the value
    #[serde(rename_all = "camelCase")]
    Matched { measure_key: String, priority: i32 },
    /// The value was outside every range and took the nearest end
    #[serde(rename_all = "camelCase")]
    BoundaryFallback { measure_key: String, priority: i32 },
    /// No measurement produced a candidate
    Default,
}

/// Result of a size resolution
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resolution {
    pub label: String,
    pub source: ResolutionSource,
}

#[derive(Debug, Clone, Copy)]
enum CandidateKind {
    Matched,
    BoundaryFallback,
}

#[derive(Debug, Clone)]
struct Candidate<'a> {
    measure_key: &'a str,
    rule: &'a SizeRule,
    kind: CandidateKind,
}

/// Size resolution engine
///
/// Pure and synchronous; safe to call from any thread as often as needed.
///
/// # Algorithm
/// 1. Per measure key, take the first rule (stored order) whose inclusive
///    range contains the value.
/// 2. Failing that, a value below the lowest range takes the lowest rule,
///    a value above the highest range takes the highest rule.
/// 3. Across keys the highest priority wins; equal priorities keep the
///    candidate produced first.
/// 4. Without any candidate the default label is returned.
///
/// Keys are visited in slot order first, then any remaining rule-table
/// keys in table order, so tie-breaking never depends on input map order.
#[derive(Debug, Clone)]
pub struct SizeResolver {
    default_label: String,
}

impl SizeResolver {
    pub fn new(default_label: impl Into<String>) -> Self {
        Self {
            default_label: default_label.into(),
        }
    }

    pub fn default_label(&self) -> &str {
        &self.default_label
    }

    /// Resolve a size label for one garment
    pub fn resolve(
        &self,
        layout: &SlotLayout,
        rules: &RuleTable,
        input: &MeasurementInput,
    ) -> Resolution {
        let mut best: Option<Candidate<'_>> = None;

        for measure_key in evaluation_order(layout, rules) {
            let Some(key_rules) = rules.get(measure_key) else {
                continue;
            };
            let Some(raw) = input.get(measure_key) else {
                continue;
            };
            let Some(value) = parse_measurement(raw) else {
                tracing::debug!("Skipping unparseable value for {}: {:?}", measure_key, raw);
                continue;
            };

            let Some(candidate) = candidate_for(measure_key, key_rules, value) else {
                continue;
            };

            // Strictly greater keeps the earlier candidate on ties
            let replace = match &best {
                Some(current) => candidate.rule.priority > current.rule.priority,
                None => true,
            };
            if replace {
                best = Some(candidate);
            }
        }

        match best {
            Some(candidate) => {
                let measure_key = candidate.measure_key.to_string();
                let priority = candidate.rule.priority;
                let source = match candidate.kind {
                    CandidateKind::Matched => ResolutionSource::Matched { measure_key, priority },
                    CandidateKind::BoundaryFallback => {
                        ResolutionSource::BoundaryFallback { measure_key, priority }
                    }
                };
                Resolution {
                    label: candidate.rule.label.clone(),
                    source,
                }
            }
            None => {
                tracing::debug!(
                    "No size candidate from {} rules and {} inputs, using default {}",
                    rules.len(),
                    input.len(),
                    self.default_label
                );
                Resolution {
                    label: self.default_label.clone(),
                    source: ResolutionSource::Default,
                }
            }
        }
    }

    /// Convenience wrapper returning only the label
    pub fn resolve_label(
        &self,
        layout: &SlotLayout,
        rules: &RuleTable,
        input: &MeasurementInput,
    ) -> String {
        self.resolve(layout, rules, input).label
    }
}

impl Default for SizeResolver {
    fn default() -> Self {
        Self::new(DEFAULT_SIZE_LABEL)
    }
}

/// Slot keys first, then rule keys without a slot
fn evaluation_order<'a>(layout: &'a SlotLayout, rules: &'a RuleTable) -> Vec<&'a str> {
    let mut order: Vec<&str> = Vec::new();
    for key in layout.measure_keys().chain(rules.keys()) {
        if !order.contains(&key) {
            order.push(key);
        }
    }
    order
}

/// Candidate of a single measure key
fn candidate_for<'a>(
    measure_key: &'a str,
    rules: &'a [SizeRule],
    value: i32,
) -> Option<Candidate<'a>> {
    if let Some(rule) = rules.iter().find(|r| r.contains(value)) {
        return Some(Candidate {
            measure_key,
            rule,
            kind: CandidateKind::Matched,
        });
    }

    let mut by_min: Vec<&SizeRule> = rules.iter().collect();
    by_min.sort_by_key(|r| r.min_value);

    let smallest = by_min.first()?;
    let largest = by_min.last()?;

    let rule = if value < smallest.min_value {
        *smallest
    } else if value > largest.max_value {
        *largest
    } else {
        // Between two ranges
        return None;
    };

    Some(Candidate {
        measure_key,
        rule,
        kind: CandidateKind::BoundaryFallback,
    })
}
