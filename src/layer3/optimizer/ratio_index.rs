// Ratio-Ordered Index - active items sorted by descending value density
// Equal densities keep arrival order, so the layout is deterministic

use std::cmp::Ordering;

use crate::core::types::Item;

#[derive(Debug, Clone, Default)]
pub struct RatioIndex {
    items: Vec<Item>,
}

impl RatioIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            items: Vec::with_capacity(capacity),
        }
    }

    /// Insert before the first item whose density is strictly lower.
    /// Returns the position the item landed at.
    pub fn insert(&mut self, item: Item) -> usize {
        let position = self
            .items
            .partition_point(|existing| existing.density_cmp(&item) != Ordering::Less);
        self.items.insert(position, item);
        position
    }

    pub fn remove(&mut self, position: usize) -> Option<Item> {
        if position < self.items.len() {
            Some(self.items.remove(position))
        } else {
            None
        }
    }

    pub fn get(&self, position: usize) -> Option<&Item> {
        self.items.get(position)
    }

    pub fn as_slice(&self) -> &[Item] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
