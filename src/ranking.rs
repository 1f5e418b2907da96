//! Stable top-N selection.

use std::cmp::Ordering;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Ascending,
    Descending,
}

/// The first `n` items ordered by `metric`, leaving `items` untouched.
///
/// The sort is stable: items with equal metrics keep their input order, in
/// both directions.
pub fn top_n<T: Clone>(items: &[T], metric: impl Fn(&T) -> f64, n: usize, direction: Direction) -> Vec<T> {
    let mut keyed: Vec<(f64, &T)> = items.iter().map(|item| (metric(item), item)).collect();
    keyed.sort_by(|a, b| {
        let ord = a.0.partial_cmp(&b.0).unwrap_or(Ordering::Equal);
        match direction {
            Direction::Ascending => ord,
            Direction::Descending => ord.reverse(),
        }
    });
    keyed.into_iter().take(n).map(|(_, item)| item.clone()).collect()
}

/// Highest first.
pub fn top<T: Clone>(items: &[T], metric: impl Fn(&T) -> f64, n: usize) -> Vec<T> {
    top_n(items, metric, n, Direction::Descending)
}

/// Lowest first.
pub fn bottom<T: Clone>(items: &[T], metric: impl Fn(&T) -> f64, n: usize) -> Vec<T> {
    top_n(items, metric, n, Direction::Ascending)
}
