// Core Type Definitions for Slidepack
// Items, selections and the canonical preference order between selections

use std::cmp::Ordering;
use std::fmt;

// ============================================================================
// ItemId
// ============================================================================

/// Identity of an arrival record. Assigned from 1 upward in record order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ItemId(pub u64);

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ============================================================================
// Item
// ============================================================================

/// One candidate item. Immutable once created.
#[derive(Debug, Clone, PartialEq)]
pub struct Item {
    pub id: ItemId,
    pub arrival_time: i64,
    pub value: u64,
    pub weight: u64,
    pub ratio: f64, // value / weight, informational; ordering uses exact arithmetic
}

impl Item {
    pub fn new(id: ItemId, arrival_time: i64, value: u64, weight: u64) -> Self {
        let ratio = if weight > 0 {
            value as f64 / weight as f64
        } else {
            f64::INFINITY
        };

        Self {
            id,
            arrival_time,
            value,
            weight,
            ratio,
        }
    }

    /// Exact value-density comparison: `self.value / self.weight` against
    /// `other.value / other.weight`, cross-multiplied in 128 bits.
    pub fn density_cmp(&self, other: &Item) -> Ordering {
        let lhs = self.value as u128 * other.weight as u128;
        let rhs = other.value as u128 * self.weight as u128;
        lhs.cmp(&rhs)
    }

    /// True when the item has fallen out of the trailing window at `query_time`.
    /// An item is kept iff `arrival_time >= query_time - window`, evaluated
    /// in 128 bits so no combination of times and window can wrap.
    pub fn is_stale(&self, query_time: i64, window: u64) -> bool {
        let cutoff = i128::from(query_time) - i128::from(window);
        i128::from(self.arrival_time) < cutoff
    }
}

impl fmt::Display for Item {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Item(id={}, t={}, value={}, weight={}, ratio={:.4})",
            self.id, self.arrival_time, self.value, self.weight, self.ratio
        )
    }
}

// ============================================================================
// Selection
// ============================================================================

/// A feasible subset of the active items together with its aggregates.
///
/// Member ids are kept in ascending order so that the lexicographic
/// tie-break compares the stored slices directly.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    total_value: u64,
    total_weight: u64,
    ids: Vec<ItemId>,
}

impl Selection {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn from_items<'a, I>(items: I) -> Self
    where
        I: IntoIterator<Item = &'a Item>,
    {
        let mut selection = Self::empty();
        for item in items {
            selection.total_value += item.value;
            selection.total_weight += item.weight;
            selection.ids.push(item.id);
        }
        selection.ids.sort_unstable();
        selection
    }

    pub fn total_value(&self) -> u64 {
        self.total_value
    }

    pub fn total_weight(&self) -> u64 {
        self.total_weight
    }

    pub fn count(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Member ids, ascending
    pub fn ids(&self) -> &[ItemId] {
        &self.ids
    }

    pub fn contains(&self, id: ItemId) -> bool {
        self.ids.binary_search(&id).is_ok()
    }

    /// Add a member, keeping ids sorted. Returns false if already present.
    pub fn insert(&mut self, item: &Item) -> bool {
        match self.ids.binary_search(&item.id) {
            Ok(_) => false,
            Err(pos) => {
                self.ids.insert(pos, item.id);
                self.total_value += item.value;
                self.total_weight += item.weight;
                true
            }
        }
    }

    /// Drop a member and subtract its aggregates. Returns false if absent.
    pub fn remove(&mut self, item: &Item) -> bool {
        match self.ids.binary_search(&item.id) {
            Ok(pos) => {
                self.ids.remove(pos);
                self.total_value -= item.value;
                self.total_weight -= item.weight;
                true
            }
            Err(_) => false,
        }
    }

    /// Canonical order: `Less` means `self` is preferred.
    ///
    /// Higher value first, then fewer members, then the lexicographically
    /// smaller ascending id sequence.
    pub fn preference(&self, other: &Selection) -> Ordering {
        aggregate_preference(self.total_value, self.count(), other.total_value, other.count())
            .then_with(|| self.ids.cmp(&other.ids))
    }

    pub fn is_preferred_over(&self, other: &Selection) -> bool {
        self.preference(other) == Ordering::Less
    }
}

/// First two keys of the canonical order, usable before member ids are known.
/// `Less` means the `a` side is preferred.
pub fn aggregate_preference(a_value: u64, a_count: usize, b_value: u64, b_count: usize) -> Ordering {
    b_value.cmp(&a_value).then(a_count.cmp(&b_count))
}

impl fmt::Display for Selection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Selection(value={}, weight={}, count={}, ids={:?})",
            self.total_value,
            self.total_weight,
            self.count(),
            self.ids.iter().map(|id| id.0).collect::<Vec<_>>()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(id: u64, value: u64, weight: u64) -> Item {
        Item::new(ItemId(id), 0, value, weight)
    }

    #[test]
    fn test_density_cmp_is_exact() {
        // 1/3 vs 333333333/1000000000 differ only beyond f32 precision
        let a = item(1, 1, 3);
        let b = item(2, 333_333_333, 1_000_000_000);
        assert_eq!(a.density_cmp(&b), Ordering::Greater);
        assert_eq!(b.density_cmp(&a), Ordering::Less);
        assert_eq!(item(3, 2, 4).density_cmp(&item(4, 1, 2)), Ordering::Equal);
    }

    #[test]
    fn test_is_stale_boundary() {
        let it = Item::new(ItemId(1), 5, 1, 1);
        assert!(!it.is_stale(15, 10)); // 15 - 10 = 5, kept
        assert!(it.is_stale(16, 10)); // cutoff 6
        assert!(!it.is_stale(3, 10)); // query earlier than window width
    }

    #[test]
    fn test_is_stale_negative_times() {
        let it = Item::new(ItemId(1), -1, 5, 1);
        assert!(!it.is_stale(0, 10));
        assert!(!it.is_stale(9, 10)); // cutoff -1, kept
        assert!(it.is_stale(10, 10));
        assert!(!Item::new(ItemId(2), i64::MIN, 1, 1).is_stale(i64::MIN, u64::MAX));
        assert!(Item::new(ItemId(3), i64::MIN, 1, 1).is_stale(i64::MAX, 0));
    }

    #[test]
    fn test_selection_insert_remove() {
        let mut sel = Selection::empty();
        assert!(sel.insert(&item(3, 30, 6)));
        assert!(sel.insert(&item(1, 10, 5)));
        assert!(!sel.insert(&item(1, 10, 5)));
        assert_eq!(sel.ids(), &[ItemId(1), ItemId(3)]);
        assert_eq!(sel.total_value(), 40);
        assert_eq!(sel.total_weight(), 11);

        assert!(sel.remove(&item(1, 10, 5)));
        assert!(!sel.remove(&item(7, 1, 1)));
        assert_eq!(sel.count(), 1);
        assert_eq!(sel.total_value(), 30);
        assert!(sel.contains(ItemId(3)));
    }

    #[test]
    fn test_preference_order() {
        let high = Selection::from_items(&[item(1, 50, 1)]);
        let low = Selection::from_items(&[item(2, 40, 1)]);
        assert!(high.is_preferred_over(&low));

        // Same value: fewer members wins
        let single = Selection::from_items(&[item(5, 10, 1)]);
        let pair = Selection::from_items(&[item(1, 5, 1), item(2, 5, 1)]);
        assert!(single.is_preferred_over(&pair));

        // Same value and size: smaller ascending id sequence wins
        let a = Selection::from_items(&[item(4, 5, 1), item(1, 5, 1)]);
        let b = Selection::from_items(&[item(2, 5, 1), item(3, 5, 1)]);
        assert!(a.is_preferred_over(&b));
        assert!(!b.is_preferred_over(&a));
        assert_eq!(a.preference(&a.clone()), Ordering::Equal);
    }
}
