//! Pure reductions over query row sets.
//!
//! Nothing in here touches the database or the clock; every function is a
//! deterministic fold over the rows it is given.

pub mod attendance;
pub mod fees;
pub mod gpa;
pub mod library;

use std::collections::HashMap;
use std::hash::Hash;

/// Rounds to two decimal places, half away from zero.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// `part / whole * 100` rounded to two decimals, or 0 when `whole` is 0.
pub fn percentage(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        return 0.0;
    }
    round2(part as f64 / whole as f64 * 100.0)
}

/// Partitions `items` by `key`, keeping groups in the order their key was
/// first seen and items in their original relative order.
pub fn group_in_order<T, K, F>(items: impl IntoIterator<Item = T>, mut key: F) -> Vec<(K, Vec<T>)>
where
    K: Eq + Hash + Clone,
    F: FnMut(&T) -> K,
{
    let mut index: HashMap<K, usize> = HashMap::new();
    let mut groups: Vec<(K, Vec<T>)> = Vec::new();

    for item in items {
        let k = key(&item);
        match index.get(&k) {
            Some(&slot) => groups[slot].1.push(item),
            None => {
                index.insert(k.clone(), groups.len());
                groups.push((k, vec![item]));
            }
        }
    }

    groups
}

/// Display label for an academic term, e.g. `2025-2026 - Fall`.
pub fn term_label(academic_year: &str, semester: &str) -> String {
    format!("{academic_year} - {semester}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn percentage_of_empty_set_is_zero() {
        assert_eq!(percentage(0, 0), 0.0);
        assert!(!percentage(0, 0).is_nan());
    }

    #[test]
    fn percentage_rounds_to_two_places() {
        assert_eq!(percentage(3, 4), 75.0);
        assert_eq!(percentage(1, 3), 33.33);
        assert_eq!(percentage(2, 3), 66.67);
    }

    #[test]
    fn grouping_keeps_first_seen_order() {
        let rows = vec![("A", 1), ("B", 2), ("A", 3)];
        let groups = group_in_order(rows, |(k, _)| *k);

        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].0, "A");
        assert_eq!(groups[1].0, "B");
        assert_eq!(groups[0].1, vec![("A", 1), ("A", 3)]);
        assert_eq!(groups[1].1, vec![("B", 2)]);
    }

    #[test]
    fn grouping_does_not_sort_keys() {
        let rows = vec!["zeta", "alpha", "zeta", "mid"];
        let keys: Vec<&str> = group_in_order(rows, |s| *s)
            .into_iter()
            .map(|(k, _)| k)
            .collect();
        assert_eq!(keys, vec!["zeta", "alpha", "mid"]);
    }

    #[test]
    fn term_label_joins_year_and_semester() {
        assert_eq!(term_label("2025-2026", "Fall"), "2025-2026 - Fall");
    }
}
