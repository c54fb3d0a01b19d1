// Layer 2 - Stream Processing
// Drives records through the optimizer and renders answer lines

pub mod output;
pub mod pipeline;
pub mod metrics;

// Re-export commonly used items
pub use output::{format_answer, AnswerWriter};
pub use pipeline::{Pipeline, PipelineError, PipelineStats};
pub use metrics::RunMetrics;
