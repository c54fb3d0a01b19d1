// Window Manager - trailing time-window membership over the ratio-ordered index
// Evicts stale items and reports evictions that hit the cached optimum

use tracing::trace;

use crate::core::types::Item;
use super::cached_optimum::CachedOptimum;
use super::ratio_index::RatioIndex;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    Admitted { position: usize, extended: bool },
    Rejected,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EvictionReport {
    pub evicted: usize,
    pub evicted_selected: usize,
}

impl EvictionReport {
    pub fn invalidated(&self) -> bool {
        self.evicted_selected > 0
    }
}

pub struct WindowManager {
    window: u64,
    capacity: u64,
    index: RatioIndex,
    total_value: u64,
    total_weight: u64,
}

impl WindowManager {
    pub fn new(window: u64, capacity: u64) -> Self {
        Self::with_capacity_hint(window, capacity, 0)
    }

    pub fn with_capacity_hint(window: u64, capacity: u64, hint: usize) -> Self {
        Self {
            window,
            capacity,
            index: RatioIndex::with_capacity(hint),
            total_value: 0,
            total_weight: 0,
        }
    }

    /// Insert `item` at its density position unless it can never fit.
    /// Any admission touches the cache: see `CachedOptimum::absorb`.
    pub fn admit(&mut self, item: Item, cache: &mut CachedOptimum) -> Admission {
        if item.weight > self.capacity {
            trace!(id = %item.id, weight = item.weight, capacity = self.capacity, "Item exceeds capacity");
            return Admission::Rejected;
        }

        let extended = cache.absorb(&item, self.capacity);
        self.total_value += item.value;
        self.total_weight += item.weight;
        let position = self.index.insert(item);

        Admission::Admitted { position, extended }
    }

    /// Drop every item older than `query_time - window`.
    pub fn advance(&mut self, query_time: i64, cache: &mut CachedOptimum) -> EvictionReport {
        let mut report = EvictionReport::default();
        let mut position = 0;

        while position < self.index.len() {
            let stale = self
                .index
                .get(position)
                .is_some_and(|item| item.is_stale(query_time, self.window));
            if !stale {
                position += 1;
                continue;
            }

            if let Some(item) = self.index.remove(position) {
                self.total_value -= item.value;
                self.total_weight -= item.weight;
                report.evicted += 1;

                let selected = cache.release(&item);
                if selected {
                    report.evicted_selected += 1;
                }
                trace!(id = %item.id, arrival = item.arrival_time, selected, "Evicted item");
            }
        }

        report
    }

    /// Active items, by descending density
    pub fn active(&self) -> &[Item] {
        self.index.as_slice()
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    pub fn total_value(&self) -> u64 {
        self.total_value
    }

    pub fn total_weight(&self) -> u64 {
        self.total_weight
    }

    pub fn window(&self) -> u64 {
        self.window
    }

    pub fn capacity(&self) -> u64 {
        self.capacity
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::{ItemId, Selection};

    fn item(id: u64, time: i64, value: u64, weight: u64) -> Item {
        Item::new(ItemId(id), time, value, weight)
    }

    #[test]
    fn test_admit_rejects_oversized() {
        let mut wm = WindowManager::new(10, 10);
        let mut cache = CachedOptimum::new(false);

        assert_eq!(wm.admit(item(1, 0, 5, 11), &mut cache), Admission::Rejected);
        assert!(wm.is_empty());
        assert!(cache.is_valid());

        assert!(matches!(wm.admit(item(2, 0, 5, 10), &mut cache), Admission::Admitted { position: 0, .. }));
        assert_eq!(wm.len(), 1);
        assert_eq!(wm.total_weight(), 10);
        assert!(!cache.is_valid());
    }

    #[test]
    fn test_zero_capacity_admits_nothing() {
        let mut wm = WindowManager::new(10, 0);
        let mut cache = CachedOptimum::new(false);
        assert_eq!(wm.admit(item(1, 0, 5, 1), &mut cache), Admission::Rejected);
        assert!(wm.is_empty());
    }

    #[test]
    fn test_window_boundary() {
        let mut wm = WindowManager::new(10, 100);
        let mut cache = CachedOptimum::new(false);
        wm.admit(item(1, 0, 1, 1), &mut cache);
        wm.admit(item(2, 5, 1, 1), &mut cache);

        // 10 - 10 = 0: item at t=0 sits exactly on the boundary and stays
        let report = wm.advance(10, &mut cache);
        assert_eq!(report.evicted, 0);
        assert_eq!(wm.len(), 2);

        let report = wm.advance(11, &mut cache);
        assert_eq!(report.evicted, 1);
        assert_eq!(wm.active()[0].id, ItemId(2));
        assert_eq!(wm.total_value(), 1);
    }

    #[test]
    fn test_eviction_of_unselected_keeps_cache_valid() {
        let mut wm = WindowManager::new(10, 10);
        let mut cache = CachedOptimum::new(false);
        let old = item(1, 0, 1, 10);
        let fresh = item(2, 5, 100, 10);
        wm.admit(old, &mut cache);
        wm.admit(fresh.clone(), &mut cache);
        cache.replace(Selection::from_items(&[fresh]));

        let report = wm.advance(11, &mut cache);
        assert_eq!(report.evicted, 1);
        assert!(!report.invalidated());
        assert!(cache.is_valid());
    }

    #[test]
    fn test_eviction_of_selected_invalidates() {
        let mut wm = WindowManager::new(10, 10);
        let mut cache = CachedOptimum::new(false);
        let old = item(1, 0, 50, 4);
        let fresh = item(2, 5, 10, 4);
        wm.admit(old.clone(), &mut cache);
        wm.admit(fresh.clone(), &mut cache);
        cache.replace(Selection::from_items(&[old, fresh]));

        let report = wm.advance(11, &mut cache);
        assert!(report.invalidated());
        assert!(!cache.is_valid());
        assert_eq!(cache.selection().total_value(), 10);
        assert_eq!(cache.selection().ids(), &[ItemId(2)]);
    }
}
