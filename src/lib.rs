// Slidepack - exact best-subset selection over a trailing time window
// core: types/config/logging, layer1: ingestion, layer2: pipeline/output, layer3: optimizer

pub mod core;
pub mod layer1;
pub mod layer2;
pub mod layer3;

pub use crate::core::{Event, Header, Item, ItemId, Selection};
pub use crate::layer2::{Pipeline, PipelineError};
pub use crate::layer3::{StreamOptimizer, OptimizerStats};
