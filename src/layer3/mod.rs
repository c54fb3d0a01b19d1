// Layer 3 - Optimization
// Turns the record stream into query answers

// Sliding-window optimizer
pub mod optimizer;

// Optimizer re-exports
pub use optimizer::{OptimizerStats, StreamOptimizer};
