// Core Module - Foundational types, config, logging, events

pub mod types;
pub mod config;
pub mod logger;
pub mod events;

// Re-export commonly used items for convenience
pub use types::{aggregate_preference, Item, ItemId, Selection};
pub use config::{
    ConfigError, ConfigManager, ConfigSummary, InputConfig, MonitoringConfig, OptimizerConfig,
};
pub use logger::setup_logging;
pub use events::{Event, Header};
