use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

use crate::cards::ResolvedItem;

/// Every card ever sold, plus a per-name tally kept in step with it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AggregationStore {
    pub per_name_counts: BTreeMap<String, u64>,
    pub all_items: Vec<ResolvedItem>,
}

impl AggregationStore {
    pub fn record(&mut self, items: &[ResolvedItem]) {
        for item in items {
            *self.per_name_counts.entry(item.name.clone()).or_insert(0) += 1;
            self.all_items.push(item.clone());
        }
    }

    pub fn total(&self) -> usize {
        self.all_items.len()
    }

    /// The `n` most sold names, highest count first. Equal counts keep the
    /// order in which the names were first recorded.
    pub fn top_n(&self, n: usize) -> Vec<(String, u64)> {
        let mut first_seen: HashMap<&str, usize> = HashMap::new();
        for (index, item) in self.all_items.iter().enumerate() {
            first_seen.entry(item.name.as_str()).or_insert(index);
        }

        let mut ranking: Vec<(&String, u64)> = self.per_name_counts
            .iter()
            .map(|(name, count)| (name, *count))
            .collect();
        ranking.sort_by_key(|(name, _)| first_seen.get(name.as_str()).copied().unwrap_or(usize::MAX));
        ranking.sort_by(|a, b| b.1.cmp(&a.1));

        ranking
            .into_iter()
            .take(n)
            .map(|(name, count)| (name.clone(), count))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(name: &str) -> ResolvedItem {
        ResolvedItem {
            name: name.to_string(),
            set: "svp".to_string(),
            number: "1".to_string(),
            image_url: String::new(),
        }
    }

    #[test]
    fn test_counts_match_items() {
        let mut store = AggregationStore::default();

        store.record(&[item("Mew"), item("Pikachu")]);
        store.record(&[]);
        store.record(&[item("Mew")]);

        assert_eq!(store.per_name_counts.get("Mew"), Some(&2));
        assert_eq!(store.per_name_counts.get("Pikachu"), Some(&1));
        assert_eq!(store.per_name_counts.values().sum::<u64>() as usize, store.all_items.len());
        assert_eq!(store.total(), 3);
    }

    #[test]
    fn test_top_n_ties_keep_first_seen_order() {
        let mut store = AggregationStore::default();

        store.record(&[item("Zapdos"), item("Articuno"), item("Moltres")]);
        store.record(&[item("Moltres"), item("Articuno"), item("Mew")]);

        assert_eq!(store.top_n(3), vec![
            ("Articuno".to_string(), 2),
            ("Moltres".to_string(), 2),
            ("Zapdos".to_string(), 1),
        ]);
        assert_eq!(store.top_n(10).len(), 4);
        assert!(store.top_n(0).is_empty());
    }
}
