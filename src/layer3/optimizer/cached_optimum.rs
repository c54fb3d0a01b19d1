// Cached Optimum / Invalidation Controller
// Lazily recomputes the optimum only when a change could have altered it

use std::fmt;
use tracing::{debug, trace};

use crate::core::config::OptimizerConfig;
use crate::core::events::{Event, Header};
use crate::core::types::{Item, ItemId, Selection};
use super::branch_bound::BranchAndBound;
use super::window_manager::{Admission, WindowManager};

// ============================================================================
// CachedOptimum
// ============================================================================

/// Last computed optimum plus a validity flag.
///
/// The held selection is always a feasible subset of the active items, even
/// while invalid, so it can seed the next search.
#[derive(Debug, Clone)]
pub struct CachedOptimum {
    selection: Selection,
    valid: bool,
    extend_on_fit: bool,
}

impl CachedOptimum {
    pub fn new(extend_on_fit: bool) -> Self {
        Self {
            selection: Selection::empty(),
            valid: true,
            extend_on_fit,
        }
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn is_valid(&self) -> bool {
        self.valid
    }

    /// Account for a newly admitted item. Returns true if the item was added
    /// to the held selection.
    ///
    /// A positive-value item that fits next to a valid optimum extends it to
    /// the new optimum: it carries the largest id, so neither the member count
    /// nor the id order among equal-value rivals changes. Validity survives
    /// only when `extend_on_fit` is enabled.
    pub fn absorb(&mut self, item: &Item, capacity: u64) -> bool {
        let fits = item.value > 0 && self.selection.total_weight() + item.weight <= capacity;
        if fits {
            self.selection.insert(item);
        }
        self.valid = self.valid && fits && self.extend_on_fit;
        fits
    }

    /// Account for an evicted item. Returns true if it was a member.
    pub fn release(&mut self, item: &Item) -> bool {
        if self.selection.remove(item) {
            self.valid = false;
            true
        } else {
            false
        }
    }

    pub fn replace(&mut self, selection: Selection) {
        self.selection = selection;
        self.valid = true;
    }
}

// ============================================================================
// OptimizerStats
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OptimizerStats {
    pub admissions: u64,
    pub rejections: u64,
    pub queries: u64,
    pub recomputations: u64,
    pub cache_hits: u64,
    pub evictions: u64,
    pub invalidating_evictions: u64,
    pub extensions: u64,
    pub nodes_explored: u64,
    pub branches_pruned: u64,
}

impl OptimizerStats {
    pub fn cache_hit_rate(&self) -> f64 {
        if self.queries > 0 {
            self.cache_hits as f64 / self.queries as f64
        } else {
            0.0
        }
    }
}

impl fmt::Display for OptimizerStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Optimizer(queries={}, recomputations={}, hits={}, admitted={}, rejected={}, evicted={})",
            self.queries,
            self.recomputations,
            self.cache_hits,
            self.admissions,
            self.rejections,
            self.evictions
        )
    }
}

// ============================================================================
// StreamOptimizer
// ============================================================================

/// Owns the active window, the cached optimum and the search scratch space.
/// Events must be fed in stream order.
pub struct StreamOptimizer {
    window: WindowManager,
    cache: CachedOptimum,
    search: BranchAndBound,
    warm_start: bool,
    last_id: u64,
    stats: OptimizerStats,
}

impl StreamOptimizer {
    pub fn new(window: u64, capacity: u64) -> Self {
        Self::with_config(window, capacity, &OptimizerConfig::default())
    }

    pub fn with_config(window: u64, capacity: u64, config: &OptimizerConfig) -> Self {
        debug!(window, capacity, ?config, "Initializing StreamOptimizer");
        Self {
            window: WindowManager::with_capacity_hint(window, capacity, config.arena_capacity_hint),
            cache: CachedOptimum::new(config.extend_cached_on_fit),
            search: BranchAndBound::with_capacity(config.arena_capacity_hint),
            warm_start: config.warm_start,
            last_id: 0,
            stats: OptimizerStats::default(),
        }
    }

    pub fn from_header(header: &Header, config: &OptimizerConfig) -> Self {
        Self::with_config(header.window, header.capacity, config)
    }

    /// Dispatch one record. Queries return the current optimum.
    pub fn on_event(&mut self, event: &Event) -> Option<Selection> {
        match *event {
            Event::Arrival { time, value, weight } => {
                self.on_arrival(time, value, weight);
                None
            }
            Event::Query { time } => Some(self.on_query(time)),
        }
    }

    /// Assign the next id and offer the item to the window.
    pub fn on_arrival(&mut self, time: i64, value: u32, weight: u32) -> ItemId {
        self.last_id += 1;
        let id = ItemId(self.last_id);
        let item = Item::new(id, time, u64::from(value), u64::from(weight));

        match self.window.admit(item, &mut self.cache) {
            Admission::Admitted { position, extended } => {
                self.stats.admissions += 1;
                if extended {
                    self.stats.extensions += 1;
                }
                trace!(id = %id, position, extended, valid = self.cache.is_valid(), "Admitted item");
            }
            Admission::Rejected => {
                self.stats.rejections += 1;
            }
        }
        id
    }

    /// Advance the window to `time` and return the optimum over what remains.
    pub fn on_query(&mut self, time: i64) -> Selection {
        self.stats.queries += 1;

        let report = self.window.advance(time, &mut self.cache);
        self.stats.evictions += report.evicted as u64;
        self.stats.invalidating_evictions += report.evicted_selected as u64;

        if self.cache.is_valid() {
            self.stats.cache_hits += 1;
            trace!(time, evicted = report.evicted, "Cached optimum still valid");
        } else {
            let seed = if self.warm_start {
                Some(self.cache.selection())
            } else {
                None
            };
            let outcome = self.search.solve(self.window.active(), self.window.capacity(), seed);

            self.stats.recomputations += 1;
            self.stats.nodes_explored += outcome.stats.nodes;
            self.stats.branches_pruned += outcome.stats.pruned;
            debug!(
                time,
                window = self.window.window(),
                active = self.window.len(),
                active_value = self.window.total_value(),
                active_weight = self.window.total_weight(),
                evicted = report.evicted,
                value = outcome.selection.total_value(),
                "Recomputed optimum"
            );
            self.cache.replace(outcome.selection);
        }

        self.cache.selection().clone()
    }

    pub fn active_items(&self) -> &[Item] {
        self.window.active()
    }

    pub fn is_cache_valid(&self) -> bool {
        self.cache.is_valid()
    }

    pub fn stats(&self) -> OptimizerStats {
        self.stats.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(selection: &Selection) -> Vec<u64> {
        selection.ids().iter().map(|id| id.0).collect()
    }

    #[test]
    fn test_single_feasible_item() {
        let mut opt = StreamOptimizer::new(10, 10);
        opt.on_arrival(1, 60, 10);
        opt.on_arrival(2, 100, 20);
        opt.on_arrival(3, 120, 30);

        let best = opt.on_query(5);
        assert_eq!(best.total_value(), 60);
        assert_eq!(ids(&best), vec![1]);
        assert_eq!(opt.stats().rejections, 2);
    }

    #[test]
    fn test_ids_count_rejected_arrivals() {
        let mut opt = StreamOptimizer::new(100, 5);
        assert_eq!(opt.on_arrival(1, 1, 50), ItemId(1));
        assert_eq!(opt.on_arrival(2, 1, 1), ItemId(2));
        assert_eq!(ids(&opt.on_query(3)), vec![2]);
    }

    #[test]
    fn test_negative_times_follow_window_rule() {
        let mut opt = StreamOptimizer::new(10, 10);
        opt.on_arrival(-1, 5, 1);
        opt.on_arrival(-12, 9, 1);

        // Cutoff at query 0 is -10: id 2 is gone, id 1 stays
        let best = opt.on_query(0);
        assert_eq!(ids(&best), vec![1]);
        assert_eq!(opt.stats().evictions, 1);

        // Cutoff -1 keeps the boundary item, cutoff 0 drops it
        assert_eq!(ids(&opt.on_query(9)), vec![1]);
        assert!(opt.on_query(10).is_empty());
    }

    #[test]
    fn test_largest_amounts_do_not_overflow() {
        let mut opt = StreamOptimizer::new(100, u64::MAX);
        for _ in 0..4 {
            opt.on_arrival(1, u32::MAX, u32::MAX);
        }
        let best = opt.on_query(1);
        assert_eq!(best.count(), 4);
        assert_eq!(best.total_value(), 4 * u64::from(u32::MAX));
    }

    #[test]
    fn test_query_without_changes_hits_cache() {
        let mut opt = StreamOptimizer::new(100, 10);
        opt.on_arrival(1, 10, 5);
        opt.on_arrival(2, 40, 4);
        opt.on_arrival(3, 30, 6);

        let first = opt.on_query(10);
        let second = opt.on_query(10);
        assert_eq!(first, second);
        assert_eq!(ids(&first), vec![2, 3]);

        let stats = opt.stats();
        assert_eq!(stats.recomputations, 1);
        assert_eq!(stats.cache_hits, 1);
    }

    #[test]
    fn test_empty_window_yields_empty_selection() {
        let mut opt = StreamOptimizer::new(5, 10);
        let best = opt.on_query(1);
        assert!(best.is_empty());

        opt.on_arrival(1, 7, 3);
        assert_eq!(opt.on_query(2).total_value(), 7);
        assert!(opt.on_query(100).is_empty());
        assert!(opt.active_items().is_empty());
    }

    #[test]
    fn test_absorb_without_extend_invalidates() {
        let mut cache = CachedOptimum::new(false);
        let it = Item::new(ItemId(1), 0, 5, 2);
        assert!(cache.absorb(&it, 10));
        assert!(!cache.is_valid());
        assert_eq!(cache.selection().total_value(), 5);
    }

    #[test]
    fn test_absorb_with_extend_keeps_validity() {
        let mut cache = CachedOptimum::new(true);
        assert!(cache.absorb(&Item::new(ItemId(1), 0, 5, 2), 10));
        assert!(cache.is_valid());

        // Does not fit next to the held selection
        assert!(!cache.absorb(&Item::new(ItemId(2), 0, 50, 9), 10));
        assert!(!cache.is_valid());
        assert_eq!(cache.selection().ids(), &[ItemId(1)]);
    }

    #[test]
    fn test_zero_value_arrival_is_not_absorbed() {
        let mut cache = CachedOptimum::new(true);
        assert!(!cache.absorb(&Item::new(ItemId(1), 0, 0, 1), 10));
        assert!(!cache.is_valid());
        assert!(cache.selection().is_empty());
    }

    #[test]
    fn test_extend_on_fit_skips_recomputation() {
        let config = OptimizerConfig {
            extend_cached_on_fit: true,
            ..OptimizerConfig::default()
        };
        let mut opt = StreamOptimizer::with_config(100, 10, &config);
        opt.on_arrival(1, 10, 3);
        assert_eq!(ids(&opt.on_query(1)), vec![1]);
        opt.on_arrival(2, 20, 3);
        assert!(opt.is_cache_valid());
        assert_eq!(ids(&opt.on_query(2)), vec![1, 2]);

        let stats = opt.stats();
        assert_eq!(stats.extensions, 2);
        assert_eq!(stats.recomputations, 0);
        assert_eq!(stats.cache_hits, 2);
    }

    #[test]
    fn test_cold_start_matches_warm_start() {
        let cold_config = OptimizerConfig {
            warm_start: false,
            ..OptimizerConfig::default()
        };
        let mut warm = StreamOptimizer::new(6, 15);
        let mut cold = StreamOptimizer::with_config(6, 15, &cold_config);

        let arrivals = [(1, 10, 5), (2, 40, 4), (3, 30, 6), (4, 12, 7), (5, 9, 2), (8, 25, 5)];
        for (time, value, weight) in arrivals {
            warm.on_arrival(time, value, weight);
            cold.on_arrival(time, value, weight);
            assert_eq!(warm.on_query(time + 1), cold.on_query(time + 1));
        }
    }
}
