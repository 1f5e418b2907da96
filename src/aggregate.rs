//! Generic KPI primitives shared by every dashboard page.
//!
//! All functions are single pass over a borrowed slice and never fail: empty
//! input yields 0, an empty map or `None`.

use std::hash::Hash;

use indexmap::IndexMap;

/// Which end of the metric an extremum search keeps.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Extremum {
    Min,
    Max,
}

pub fn count_where<T>(items: &[T], predicate: impl Fn(&T) -> bool) -> usize {
    items.iter().filter(|item| predicate(item)).count()
}

pub fn sum_by<T>(items: &[T], value: impl Fn(&T) -> f64) -> f64 {
    items.iter().map(value).sum()
}

pub fn sum_int_by<T>(items: &[T], value: impl Fn(&T) -> i64) -> i64 {
    saturating_total(items.iter().map(value))
}

/// Integer sum clamped to the `i64` range. Counts come straight from the
/// wire, so an oversized value saturates with a warning instead of wrapping.
pub fn saturating_total(values: impl IntoIterator<Item = i64>) -> i64 {
    let mut saturated = false;
    let total = values.into_iter().fold(0i64, |acc, v| {
        acc.checked_add(v).unwrap_or_else(|| {
            saturated = true;
            acc.saturating_add(v)
        })
    });
    if saturated {
        log::warn!("Integer total overflowed; clamped to {}", total);
    }
    total
}

/// Arithmetic mean, 0 for an empty sequence.
pub fn average(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// `numerator / denominator`, 0 when the denominator is not positive.
pub fn ratio(numerator: f64, denominator: f64) -> f64 {
    if denominator > 0.0 {
        numerator / denominator
    } else {
        0.0
    }
}

/// `numerator / denominator * 100`, 0 when the denominator is not positive.
pub fn percentage(numerator: f64, denominator: f64) -> f64 {
    ratio(numerator, denominator) * 100.0
}

/// Count per group label, in first-seen order. Records without a key land
/// under `default_label`.
pub fn group_count<'a, T, K>(
    items: &'a [T],
    key: impl Fn(&'a T) -> Option<K>,
    default_label: K,
) -> IndexMap<K, usize>
where
    K: Hash + Eq + Clone,
{
    let mut counts: IndexMap<K, usize> = IndexMap::new();
    for item in items {
        let label = key(item).unwrap_or_else(|| default_label.clone());
        *counts.entry(label).or_insert(0) += 1;
    }
    counts
}

/// Sum per group label, in first-seen order.
pub fn group_sum<'a, T, K>(
    items: &'a [T],
    key: impl Fn(&'a T) -> K,
    value: impl Fn(&'a T) -> f64,
) -> IndexMap<K, f64>
where
    K: Hash + Eq,
{
    let mut sums: IndexMap<K, f64> = IndexMap::new();
    for item in items {
        *sums.entry(key(item)).or_insert(0.0) += value(item);
    }
    sums
}

/// Mean per group label, in first-seen order.
///
/// Items whose value is `None` do not contribute to their group, and a group
/// that only ever saw `None` is not emitted.
pub fn group_average<'a, T, K>(
    items: &'a [T],
    key: impl Fn(&'a T) -> K,
    value: impl Fn(&'a T) -> Option<f64>,
) -> IndexMap<K, f64>
where
    K: Hash + Eq + Clone,
{
    let mut sums: IndexMap<K, f64> = IndexMap::new();
    let mut counts: IndexMap<K, usize> = IndexMap::new();
    for item in items {
        let Some(v) = value(item) else {
            continue;
        };
        let label = key(item);
        *sums.entry(label.clone()).or_insert(0.0) += v;
        *counts.entry(label).or_insert(0) += 1;
    }
    sums.into_iter()
        .map(|(label, sum)| {
            let n = counts.get(&label).copied().unwrap_or(1);
            (label, sum / n as f64)
        })
        .collect()
}

/// Single-pass extremum. Ties keep the first element seen.
pub fn extremum_by<T>(items: &[T], metric: impl Fn(&T) -> f64, which: Extremum) -> Option<&T> {
    let mut best: Option<(&T, f64)> = None;
    for item in items {
        let m = metric(item);
        let better = match best {
            None => true,
            Some((_, current)) => match which {
                Extremum::Min => m < current,
                Extremum::Max => m > current,
            },
        };
        if better {
            best = Some((item, m));
        }
    }
    best.map(|(item, _)| item)
}

pub fn min_by<T>(items: &[T], metric: impl Fn(&T) -> f64) -> Option<&T> {
    extremum_by(items, metric, Extremum::Min)
}

pub fn max_by<T>(items: &[T], metric: impl Fn(&T) -> f64) -> Option<&T> {
    extremum_by(items, metric, Extremum::Max)
}

/// Smallest and largest value of a sequence, `None` when empty.
pub fn min_max(values: &[f64]) -> Option<(f64, f64)> {
    let first = *values.first()?;
    Some(
        values
            .iter()
            .fold((first, first), |(lo, hi), v| (lo.min(*v), hi.max(*v))),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_average_empty_is_zero() {
        assert_eq!(average(&[]), 0.0);
        assert_eq!(average(&[10.0, 20.0]), 15.0);
    }

    #[test]
    fn test_integer_sum_saturates() {
        assert_eq!(saturating_total([i64::MAX, 1, 2]), i64::MAX);
        assert_eq!(saturating_total([i64::MIN, -1]), i64::MIN);
        assert_eq!(saturating_total([i64::MAX, 1, -1]), i64::MAX - 1);
        assert_eq!(sum_int_by(&[4i64, -1], |v| *v), 3);
    }

    #[test]
    fn test_ratio_never_divides_by_zero() {
        assert_eq!(percentage(3.0, 0.0), 0.0);
        assert_eq!(percentage(1.0, 4.0), 25.0);
        assert_eq!(ratio(-5.0, -1.0), 0.0);
    }

    #[test]
    fn test_group_count_totals_match_input_len() {
        let services = vec![Some("achats"), None, Some("rd"), Some("achats"), None];
        let counts = group_count(&services, |s| *s, "Inconnu");
        assert_eq!(counts.values().sum::<usize>(), services.len());
        assert_eq!(counts.get("achats"), Some(&2));
        assert_eq!(counts.get("Inconnu"), Some(&2));
        let order: Vec<_> = counts.keys().copied().collect();
        assert_eq!(order, vec!["achats", "Inconnu", "rd"]);
    }

    #[test]
    fn test_group_average_uses_running_sums() {
        let rows = vec![("a", 10.0), ("b", 4.0), ("a", 20.0), ("b", 0.0)];
        let means = group_average(&rows, |r| r.0, |r| Some(r.1));
        assert_eq!(means.get("a"), Some(&15.0));
        assert_eq!(means.get("b"), Some(&2.0));
    }

    #[test]
    fn test_group_average_skips_absent_values() {
        let rows = vec![("a", None), ("a", Some(80.0)), ("b", None)];
        let means = group_average(&rows, |r| r.0, |r| r.1);
        assert_eq!(means.get("a"), Some(&80.0));
        assert!(!means.contains_key("b"));
    }

    #[test]
    fn test_group_sum_keeps_first_seen_order() {
        let rows = vec![("x", 1.5), ("y", 2.0), ("x", 1.0)];
        let sums = group_sum(&rows, |r| r.0, |r| r.1);
        assert_eq!(sums.into_iter().collect::<Vec<_>>(), vec![("x", 2.5), ("y", 2.0)]);
    }

    #[test]
    fn test_extremum_first_seen_wins_on_ties() {
        let rows = vec![("first", 1.0), ("second", 1.0), ("third", 3.0), ("fourth", 3.0)];
        assert_eq!(min_by(&rows, |r| r.1).map(|r| r.0), Some("first"));
        assert_eq!(max_by(&rows, |r| r.1).map(|r| r.0), Some("third"));
    }

    #[test]
    fn test_extremum_empty_is_none() {
        let rows: Vec<f64> = Vec::new();
        assert!(min_by(&rows, |v| *v).is_none());
        assert!(min_max(&rows).is_none());
    }

    #[test]
    fn test_count_and_sums() {
        let values = vec![3_i64, 0, 5, 0];
        assert_eq!(count_where(&values, |v| *v == 0), 2);
        assert_eq!(sum_int_by(&values, |v| *v), 8);
        assert_eq!(sum_by(&values, |v| *v as f64 / 2.0), 4.0);
        assert_eq!(min_max(&[2.0, -1.0, 7.5]), Some((-1.0, 7.5)));
    }
}
