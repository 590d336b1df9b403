use std::collections::HashMap;
use uuid::Uuid;
use crate::models::{Garment, SizeCount, SizeDistributionRow};

/// Build the company size distribution from per-garment size counts
///
/// Counts for the same (garment, size) are summed. Rows are ordered by
/// garment label, then category, then size label. Counts whose garment is
/// missing from the catalog are reported under the garment id.
pub fn build_distribution(
    counts: Vec<SizeCount>,
    garments: &HashMap<Uuid, Garment>,
) -> Vec<SizeDistributionRow> {
    let mut grouped: HashMap<(Uuid, String), i64> = HashMap::new();
    for count in counts {
        *grouped
            .entry((count.garment_id, count.size_label))
            .or_insert(0) += count.count;
    }

    let mut rows: Vec<SizeDistributionRow> = grouped
        .into_iter()
        .map(|((garment_id, size_label), count)| {
            let (garment_label, category) = match garments.get(&garment_id) {
                Some(garment) => (garment.key.clone(), garment.category.clone()),
                None => {
                    tracing::warn!("Size counts reference unknown garment {}", garment_id);
                    (garment_id.to_string(), String::new())
                }
            };
            SizeDistributionRow {
                garment_id,
                garment_label,
                category,
                size_label,
                count,
            }
        })
        .collect();

    rows.sort_by(|a, b| {
        a.garment_label
            .cmp(&b.garment_label)
            .then_with(|| a.category.cmp(&b.category))
            .then_with(|| a.size_label.cmp(&b.size_label))
            .then_with(|| a.garment_id.cmp(&b.garment_id))
    });

    rows
}

#[cfg(test)]
mod tests {
    use super::*;

    fn garment(key: &str, category: &str) -> Garment {
        Garment {
            id: Uuid::new_v4(),
            key: key.to_string(),
            description: None,
            category: category.to_string(),
        }
    }

    fn count(garment_id: Uuid, size: &str, n: i64) -> SizeCount {
        SizeCount {
            garment_id,
            size_label: size.to_string(),
            count: n,
        }
    }

    #[test]
    fn test_groups_and_sums() {
        let jacket = garment("jacket", "outerwear");
        let catalog: HashMap<Uuid, Garment> = [(jacket.id, jacket.clone())].into_iter().collect();

        let rows = build_distribution(
            vec![count(jacket.id, "S", 1), count(jacket.id, "M", 1), count(jacket.id, "S", 1)],
            &catalog,
        );

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].size_label, "M");
        assert_eq!(rows[0].count, 1);
        assert_eq!(rows[1].size_label, "S");
        assert_eq!(rows[1].count, 2);
    }

    #[test]
    fn test_sorted_by_garment_category_size() {
        let trousers = garment("trousers", "bottoms");
        let apron = garment("apron", "kitchen");
        let catalog: HashMap<Uuid, Garment> = [
            (trousers.id, trousers.clone()),
            (apron.id, apron.clone()),
        ]
        .into_iter()
        .collect();

        let rows = build_distribution(
            vec![
                count(trousers.id, "52", 3),
                count(apron.id, "L", 1),
                count(trousers.id, "48", 2),
            ],
            &catalog,
        );

        let order: Vec<(&str, &str)> = rows
            .iter()
            .map(|r| (r.garment_label.as_str(), r.size_label.as_str()))
            .collect();
        assert_eq!(order, vec![("apron", "L"), ("trousers", "48"), ("trousers", "52")]);
        assert_eq!(rows[1].category, "bottoms");
    }

    #[test]
    fn test_unknown_garment_uses_id() {
        let id = Uuid::new_v4();
        let rows = build_distribution(vec![count(id, "S", 1)], &HashMap::new());
        assert_eq!(rows[0].garment_label, id.to_string());
    }
}
