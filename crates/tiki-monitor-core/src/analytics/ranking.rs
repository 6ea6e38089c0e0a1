//! Grouping and top-N selection.
//!
//! Groups are emitted in first-seen order and the sort is stable, so ties
//! keep the order in which their first row appeared.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::hash::Hash;

use crate::types::Money;

/// Sorts descending by a score and truncates to `k`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TopK {
    pub k: usize,
}

impl Default for TopK {
    fn default() -> Self {
        Self { k: 10 }
    }
}

impl TopK {
    pub fn new(k: usize) -> Self {
        Self { k }
    }

    pub fn select<T>(&self, mut items: Vec<T>, score: impl Fn(&T) -> Decimal) -> Vec<T> {
        // slice::sort_by is stable
        items.sort_by(|a, b| score(b).cmp(&score(a)));
        items.truncate(self.k);
        items
    }
}

/// Totals for one group of products.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupTotal {
    /// Enclosing category when groups are split by category.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    pub label: String,
    pub products: usize,
    pub quantity: Decimal,
    pub revenue: Money,
}

/// One row's contribution to a group.
pub struct Contribution<K> {
    pub key: K,
    pub quantity: Decimal,
    pub revenue: Money,
}

/// Sum contributions per key, in first-seen key order.
pub fn group_totals<K, I>(rows: I) -> Vec<(K, usize, Decimal, Money)>
where
    K: Eq + Hash + Clone,
    I: IntoIterator<Item = Contribution<K>>,
{
    let mut order: Vec<K> = Vec::new();
    let mut sums: HashMap<K, (usize, Decimal, Money)> = HashMap::new();
    for c in rows {
        let entry = sums.entry(c.key.clone()).or_insert_with(|| {
            order.push(c.key.clone());
            (0, Decimal::ZERO, Decimal::ZERO)
        });
        entry.0 += 1;
        entry.1 = entry.1.saturating_add(c.quantity);
        entry.2 = entry.2.saturating_add(c.revenue);
    }
    order
        .into_iter()
        .filter_map(|k| {
            let (n, q, r) = sums.remove(&k)?;
            Some((k, n, q, r))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_select_truncates_to_k() {
        let items: Vec<Decimal> = (0..50).map(Decimal::from).collect();
        let top = TopK::new(10).select(items, |v| *v);
        assert_eq!(top.len(), 10);
        assert_eq!(top[0], dec!(49));
        assert_eq!(top[9], dec!(40));
    }

    #[test]
    fn test_ties_keep_input_order() {
        let items = vec![("a", dec!(1)), ("b", dec!(2)), ("c", dec!(1)), ("d", dec!(2))];
        let top = TopK::new(4).select(items, |(_, v)| *v);
        let names: Vec<_> = top.iter().map(|(n, _)| *n).collect();
        assert_eq!(names, vec!["b", "d", "a", "c"]);
    }

    #[test]
    fn test_fewer_items_than_k() {
        let top = TopK::new(5).select(vec![dec!(3)], |v| *v);
        assert_eq!(top, vec![dec!(3)]);
    }

    #[test]
    fn test_group_totals_first_seen_order() {
        let rows = vec![
            Contribution { key: "x", quantity: dec!(1), revenue: dec!(10) },
            Contribution { key: "y", quantity: dec!(2), revenue: dec!(5) },
            Contribution { key: "x", quantity: dec!(3), revenue: dec!(1) },
        ];
        let groups = group_totals(rows);
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0], ("x", 2, dec!(4), dec!(11)));
        assert_eq!(groups[1], ("y", 1, dec!(2), dec!(5)));
    }
}
