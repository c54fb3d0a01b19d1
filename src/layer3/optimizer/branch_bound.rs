// Bounded Subset Search - depth-first branch and bound over the inclusion tree
// Horowitz-Sahni forward/backtrack moves with the fractional (Dantzig) upper bound

use std::cmp::Ordering;
use tracing::{debug, trace};

use crate::core::types::{aggregate_preference, Item, ItemId, Selection};

/// Counters for a single search
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SearchStats {
    pub nodes: u64,        // forward passes started
    pub pruned: u64,       // subtrees discarded by the bound
    pub candidates: u64,   // complete assignments compared with the incumbent
    pub improvements: u64, // candidates that replaced the incumbent
}

#[derive(Debug, Clone)]
pub struct SearchOutcome {
    pub selection: Selection,
    pub stats: SearchStats,
}

/// Running aggregates of a (partial) assignment
#[derive(Debug, Clone, Copy, Default)]
struct Totals {
    weight: u64,
    value: u64,
    count: usize,
}

impl Totals {
    fn add(&mut self, item: &Item) {
        self.weight += item.weight;
        self.value += item.value;
        self.count += 1;
    }

    fn sub(&mut self, item: &Item) {
        self.weight -= item.weight;
        self.value -= item.value;
        self.count -= 1;
    }
}

/// True when no completion of the current prefix can reach `best_value`.
///
/// Exact form of `value + break.value / break.weight * (capacity - weight) < best_value`.
/// `break_item.weight` is positive: it failed to fit into the remaining room.
fn bound_below(current: &Totals, break_item: &Item, capacity: u64, best_value: u64) -> bool {
    let room = (capacity - current.weight) as u128;
    let w = break_item.weight as u128;
    let scaled_bound = current.value as u128 * w + break_item.value as u128 * room;
    scaled_bound < best_value as u128 * w
}

/// Reusable scratch space for the search.
///
/// Both masks are indexed by position in the ratio-ordered slice and are
/// only resized, never reallocated per branch.
#[derive(Debug, Default)]
pub struct BranchAndBound {
    current: Vec<bool>,
    best: Vec<bool>,
    current_ids: Vec<ItemId>,
    best_ids: Vec<ItemId>,
    best_ids_ready: bool,
}

impl BranchAndBound {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            current: Vec::with_capacity(capacity),
            best: Vec::with_capacity(capacity),
            current_ids: Vec::with_capacity(capacity),
            best_ids: Vec::with_capacity(capacity),
            best_ids_ready: false,
        }
    }

    /// Compute the canonical optimal selection of `items` under `capacity`.
    ///
    /// `items` must be ordered by non-increasing density. `seed`, when given
    /// and still feasible over `items`, is used as the starting incumbent.
    pub fn solve(&mut self, items: &[Item], capacity: u64, seed: Option<&Selection>) -> SearchOutcome {
        let n = items.len();
        let mut stats = SearchStats::default();

        self.reset(n);
        let mut best = self.seed_incumbent(items, capacity, seed);
        let mut current = Totals::default();
        let mut start = 0usize;

        debug!(
            items = n,
            capacity = capacity,
            seed_value = best.value,
            "Starting branch and bound"
        );

        'search: loop {
            // Invariant: every position >= start is unselected here
            while start < n {
                stats.nodes += 1;
                let saved = current;
                let mut pos = start;

                while pos < n && items[pos].weight <= capacity - current.weight {
                    self.current[pos] = true;
                    current.add(&items[pos]);
                    pos += 1;
                }

                if pos == n {
                    start = n;
                    break;
                }

                if bound_below(&current, &items[pos], capacity, best.value) {
                    stats.pruned += 1;
                    self.current[start..pos].fill(false);
                    current = saved;

                    match self.backtrack(items, start, &mut current) {
                        Some(next) => start = next,
                        None => break 'search,
                    }
                } else {
                    // Break item stays excluded on this branch
                    start = pos + 1;
                }
            }

            stats.candidates += 1;
            if self.candidate_wins(items, &current, &best) {
                best = current;
                self.best.copy_from_slice(&self.current);
                self.best_ids_ready = false;
                stats.improvements += 1;
                trace!(value = best.value, count = best.count, weight = best.weight, "New incumbent");
            }

            match self.backtrack(items, n, &mut current) {
                Some(next) => start = next,
                None => break,
            }
        }

        let selection = Selection::from_items(
            items
                .iter()
                .zip(self.best.iter())
                .filter(|(_, selected)| **selected)
                .map(|(item, _)| item),
        );

        debug!(
            value = selection.total_value(),
            count = selection.count(),
            nodes = stats.nodes,
            pruned = stats.pruned,
            candidates = stats.candidates,
            "Branch and bound finished"
        );

        SearchOutcome { selection, stats }
    }

    fn reset(&mut self, n: usize) {
        self.current.clear();
        self.current.resize(n, false);
        self.best.clear();
        self.best.resize(n, false);
        self.best_ids_ready = false;
    }

    /// Mark the seed in the best mask. Falls back to the empty selection if the
    /// seed does not fit or names items that are no longer present.
    fn seed_incumbent(&mut self, items: &[Item], capacity: u64, seed: Option<&Selection>) -> Totals {
        let Some(seed) = seed else {
            return Totals::default();
        };
        if seed.is_empty() || seed.total_weight() > capacity {
            return Totals::default();
        }

        let mut totals = Totals::default();
        for (pos, item) in items.iter().enumerate() {
            if seed.contains(item.id) {
                self.best[pos] = true;
                totals.add(item);
            }
        }

        if totals.count != seed.count() {
            debug!(expected = seed.count(), found = totals.count, "Discarding stale seed");
            self.best.fill(false);
            return Totals::default();
        }
        totals
    }

    /// Deselect the last selected position before `from` and resume right after it.
    /// `None` once no selected position remains: the tree is exhausted.
    fn backtrack(&mut self, items: &[Item], from: usize, current: &mut Totals) -> Option<usize> {
        let pos = self.current[..from].iter().rposition(|selected| *selected)?;
        self.current[pos] = false;
        current.sub(&items[pos]);
        Some(pos + 1)
    }

    fn candidate_wins(&mut self, items: &[Item], candidate: &Totals, best: &Totals) -> bool {
        match aggregate_preference(candidate.value, candidate.count, best.value, best.count) {
            Ordering::Less => true,
            Ordering::Greater => false,
            Ordering::Equal => {
                collect_ids(items, &self.current, &mut self.current_ids);
                if !self.best_ids_ready {
                    collect_ids(items, &self.best, &mut self.best_ids);
                    self.best_ids_ready = true;
                }
                self.current_ids < self.best_ids
            }
        }
    }
}

fn collect_ids(items: &[Item], mask: &[bool], out: &mut Vec<ItemId>) {
    out.clear();
    out.extend(
        items
            .iter()
            .zip(mask.iter())
            .filter(|(_, selected)| **selected)
            .map(|(item, _)| item.id),
    );
    out.sort_unstable();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layer3::optimizer::ratio_index::RatioIndex;

    fn ordered(specs: &[(u64, u64, u64)]) -> Vec<Item> {
        let mut index = RatioIndex::new();
        for &(id, value, weight) in specs {
            index.insert(Item::new(ItemId(id), 0, value, weight));
        }
        index.as_slice().to_vec()
    }

    fn id_list(selection: &Selection) -> Vec<u64> {
        selection.ids().iter().map(|id| id.0).collect()
    }

    #[test]
    fn test_empty_input() {
        let mut bb = BranchAndBound::new();
        let outcome = bb.solve(&[], 10, None);
        assert!(outcome.selection.is_empty());
        assert_eq!(outcome.selection.total_value(), 0);
    }

    #[test]
    fn test_density_greedy_is_not_optimal() {
        // Greedy by density takes id2 + id1 (50); optimum is id2 + id3 (70)
        let items = ordered(&[(1, 10, 5), (2, 40, 4), (3, 30, 6)]);
        let mut bb = BranchAndBound::new();
        let outcome = bb.solve(&items, 10, None);

        assert_eq!(outcome.selection.total_value(), 70);
        assert_eq!(outcome.selection.total_weight(), 10);
        assert_eq!(id_list(&outcome.selection), vec![2, 3]);
        assert!(outcome.stats.candidates >= 1);
    }

    #[test]
    fn test_bound_prunes_hopeless_branches() {
        let items = ordered(&[(1, 100, 10), (2, 1, 10), (3, 1, 10), (4, 1, 10)]);
        let mut bb = BranchAndBound::new();
        let outcome = bb.solve(&items, 10, None);

        assert_eq!(id_list(&outcome.selection), vec![1]);
        assert!(outcome.stats.pruned > 0);
    }

    #[test]
    fn test_fewer_items_win_ties() {
        // {1} and {2,3} both score 10
        let items = ordered(&[(1, 10, 4), (2, 5, 2), (3, 5, 2)]);
        let mut bb = BranchAndBound::new();
        let outcome = bb.solve(&items, 4, None);

        assert_eq!(outcome.selection.total_value(), 10);
        assert_eq!(id_list(&outcome.selection), vec![1]);
    }

    #[test]
    fn test_lexicographic_tie_break() {
        // {1,4} and {2,3} both score 10 with two members; [1,4] < [2,3]
        let items = ordered(&[(1, 6, 4), (2, 5, 3), (3, 5, 3), (4, 4, 2)]);
        let mut bb = BranchAndBound::new();
        let outcome = bb.solve(&items, 6, None);

        assert_eq!(outcome.selection.total_value(), 10);
        assert_eq!(id_list(&outcome.selection), vec![1, 4]);
    }

    #[test]
    fn test_lexicographic_tie_break_replaces_earlier_candidate() {
        // {3,4} is reached first; {1,2} ties on value and size and must replace it
        let items = ordered(&[(1, 5, 3), (2, 5, 3), (3, 6, 4), (4, 4, 2)]);
        let mut bb = BranchAndBound::new();
        let outcome = bb.solve(&items, 6, None);

        assert_eq!(outcome.selection.total_value(), 10);
        assert_eq!(id_list(&outcome.selection), vec![1, 2]);
    }

    #[test]
    fn test_zero_value_items_never_selected() {
        let items = ordered(&[(1, 0, 1), (2, 0, 2), (3, 7, 5)]);
        let mut bb = BranchAndBound::new();
        let outcome = bb.solve(&items, 8, None);
        assert_eq!(id_list(&outcome.selection), vec![3]);

        let items = ordered(&[(1, 0, 1), (2, 0, 2)]);
        let outcome = bb.solve(&items, 8, None);
        assert!(outcome.selection.is_empty());
    }

    #[test]
    fn test_items_heavier_than_capacity_are_skipped() {
        let items = ordered(&[(1, 100, 50), (2, 3, 2)]);
        let mut bb = BranchAndBound::new();
        let outcome = bb.solve(&items, 10, None);
        assert_eq!(id_list(&outcome.selection), vec![2]);
    }

    #[test]
    fn test_seed_matches_unseeded_result() {
        let items = ordered(&[(1, 10, 5), (2, 40, 4), (3, 30, 6), (4, 12, 3), (5, 9, 2)]);
        let mut bb = BranchAndBound::with_capacity(8);
        let cold = bb.solve(&items, 11, None);

        // A feasible but suboptimal seed
        let seed = Selection::from_items(items.iter().filter(|it| it.id == ItemId(1)));
        let warm = bb.solve(&items, 11, Some(&seed));
        assert_eq!(cold.selection, warm.selection);

        // The optimum itself as a seed
        let warm = bb.solve(&items, 11, Some(&cold.selection));
        assert_eq!(cold.selection, warm.selection);
        assert_eq!(warm.stats.improvements, 0);
    }

    #[test]
    fn test_stale_seed_is_ignored() {
        let items = ordered(&[(1, 10, 5), (2, 40, 4)]);
        let gone = Item::new(ItemId(9), 0, 1000, 1);
        let seed = Selection::from_items(&[gone]);

        let mut bb = BranchAndBound::new();
        let outcome = bb.solve(&items, 9, Some(&seed));
        assert_eq!(id_list(&outcome.selection), vec![1, 2]);
        assert_eq!(outcome.selection.total_value(), 50);
    }

    #[test]
    fn test_bound_below_exact() {
        let current = Totals { weight: 4, value: 40, count: 1 };
        let brk = Item::new(ItemId(1), 0, 30, 7);
        // bound = 40 + 30/7 * 6 = 65.71..
        assert!(!bound_below(&current, &brk, 10, 65));
        assert!(bound_below(&current, &brk, 10, 66));
    }
}
