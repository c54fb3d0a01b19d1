// Optimizer - exact bounded-subset selection over a sliding time window
// Maintains the active items and answers each query with the canonical optimum

// Module structure:
// - ratio_index.rs: RatioIndex (active items by descending value density)
// - branch_bound.rs: BranchAndBound (depth-first exact search)
// - window_manager.rs: WindowManager (admission and eviction)
// - cached_optimum.rs: CachedOptimum + StreamOptimizer (lazy recomputation)

pub mod ratio_index;
pub mod branch_bound;
pub mod window_manager;

// Controller module
pub mod cached_optimum;

// Re-exports
pub use cached_optimum::{CachedOptimum, OptimizerStats, StreamOptimizer};
pub use branch_bound::{BranchAndBound, SearchOutcome, SearchStats};
pub use window_manager::{Admission, EvictionReport, WindowManager};
pub use ratio_index::RatioIndex;
