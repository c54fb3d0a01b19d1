// Configuration Management for Slidepack
// JSON file + environment overrides, grouped into sections

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, warn};

use crate::core::logger::parse_level;

// ============================================================================
// Error Type
// ============================================================================

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Validation error: {0}")]
    Validation(String),
}

// ============================================================================
// Configuration Structures
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OptimizerConfig {
    /// Keep the cached optimum valid when an admitted item fits alongside it
    pub extend_cached_on_fit: bool,
    /// Seed each search with the cached selection as the incumbent
    pub warm_start: bool,
    /// Initial reservation for the search mask arena
    pub arena_capacity_hint: usize,
}

impl Default for OptimizerConfig {
    fn default() -> Self {
        Self {
            extend_cached_on_fit: false,
            warm_start: true,
            arena_capacity_hint: 1024,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InputConfig {
    pub skip_blank_lines: bool,
    pub reject_excess_records: bool,
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            skip_blank_lines: true,
            reject_excess_records: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitoringConfig {
    pub log_level: String,
    pub json_format: bool,
    pub console_output: bool,
    pub report_metrics: bool,
}

impl Default for MonitoringConfig {
    fn default() -> Self {
        Self {
            log_level: "WARN".to_string(),
            json_format: false,
            console_output: true,
            report_metrics: false,
        }
    }
}

// ============================================================================
// Configuration Summary
// ============================================================================

#[derive(Debug, Clone)]
pub struct ConfigSummary {
    pub extend_cached_on_fit: bool,
    pub warm_start: bool,
    pub skip_blank_lines: bool,
    pub reject_excess_records: bool,
    pub log_level: String,
    pub report_metrics: bool,
}

// ============================================================================
// Configuration Manager
// ============================================================================

pub struct ConfigManager {
    optimizer: Arc<RwLock<OptimizerConfig>>,
    input: Arc<RwLock<InputConfig>>,
    monitoring: Arc<RwLock<MonitoringConfig>>,
}

impl ConfigManager {
    pub fn new(config_path: Option<&str>) -> Result<Self, ConfigError> {
        let mut manager = Self {
            optimizer: Arc::new(RwLock::new(OptimizerConfig::default())),
            input: Arc::new(RwLock::new(InputConfig::default())),
            monitoring: Arc::new(RwLock::new(MonitoringConfig::default())),
        };

        if let Some(path) = config_path {
            manager.load_from_file(path)?;
        }

        manager.load_from_env();

        info!("Configuration initialized");
        Ok(manager)
    }

    /// Load configuration from JSON file. A missing file keeps defaults.
    pub fn load_from_file(&mut self, config_path: &str) -> Result<(), ConfigError> {
        let path = Path::new(config_path);
        if !path.exists() {
            warn!(path = config_path, "Config file not found");
            return Ok(());
        }

        let content = fs::read_to_string(path)?;
        let config_data: HashMap<String, serde_json::Value> = serde_json::from_str(&content)?;

        if let Some(optimizer_data) = config_data.get("optimizer") {
            *self.optimizer.write() = serde_json::from_value(optimizer_data.clone())?;
        }

        if let Some(input_data) = config_data.get("input") {
            *self.input.write() = serde_json::from_value(input_data.clone())?;
        }

        if let Some(monitoring_data) = config_data.get("monitoring") {
            *self.monitoring.write() = serde_json::from_value(monitoring_data.clone())?;
        }

        info!(path = config_path, "Configuration loaded");
        Ok(())
    }

    /// Apply `SLIDEPACK_*` environment overrides
    pub fn load_from_env(&mut self) {
        if let Ok(level) = std::env::var("SLIDEPACK_LOG_LEVEL") {
            self.monitoring.write().log_level = level;
        }
        if let Ok(flag) = std::env::var("SLIDEPACK_EXTEND_ON_FIT") {
            self.optimizer.write().extend_cached_on_fit = parse_flag(&flag);
        }
        if let Ok(flag) = std::env::var("SLIDEPACK_REPORT_METRICS") {
            self.monitoring.write().report_metrics = parse_flag(&flag);
        }
    }

    /// Save configuration to JSON file
    pub fn save_to_file(&self, config_path: &str) -> Result<(), ConfigError> {
        let mut config_map = HashMap::new();
        config_map.insert("optimizer", serde_json::to_value(&*self.optimizer.read())?);
        config_map.insert("input", serde_json::to_value(&*self.input.read())?);
        config_map.insert("monitoring", serde_json::to_value(&*self.monitoring.read())?);

        if let Some(parent) = Path::new(config_path).parent() {
            fs::create_dir_all(parent)?;
        }

        let json = serde_json::to_string_pretty(&config_map)?;
        fs::write(config_path, json)?;

        info!(path = config_path, "Configuration saved");
        Ok(())
    }

    fn collect_errors(&self) -> Vec<String> {
        let mut errors = Vec::new();
        let optimizer = self.optimizer.read();
        let monitoring = self.monitoring.read();

        if parse_level(&monitoring.log_level).is_none() {
            errors.push(format!("unknown log level '{}'", monitoring.log_level));
        }

        if optimizer.arena_capacity_hint == 0 {
            errors.push("arena_capacity_hint must be positive".to_string());
        }

        errors
    }

    /// Validate configuration. `Ok(false)` means at least one value is unusable.
    pub fn validate(&self) -> Result<bool, ConfigError> {
        let errors = self.collect_errors();

        if !errors.is_empty() {
            for error in &errors {
                warn!(error = %error, "Config validation error");
            }
            return Ok(false);
        }

        info!("Configuration validated successfully");
        Ok(true)
    }

    /// Like `validate`, but turns the first problem into an error
    pub fn ensure_valid(&self) -> Result<(), ConfigError> {
        match self.collect_errors().into_iter().next() {
            Some(first) => Err(ConfigError::Validation(first)),
            None => Ok(()),
        }
    }

    pub fn get_summary(&self) -> ConfigSummary {
        let optimizer = self.optimizer.read();
        let input = self.input.read();
        let monitoring = self.monitoring.read();

        ConfigSummary {
            extend_cached_on_fit: optimizer.extend_cached_on_fit,
            warm_start: optimizer.warm_start,
            skip_blank_lines: input.skip_blank_lines,
            reject_excess_records: input.reject_excess_records,
            log_level: monitoring.log_level.clone(),
            report_metrics: monitoring.report_metrics,
        }
    }

    // Getters for each config section
    pub fn optimizer(&self) -> OptimizerConfig {
        self.optimizer.read().clone()
    }

    pub fn input(&self) -> InputConfig {
        self.input.read().clone()
    }

    pub fn monitoring(&self) -> MonitoringConfig {
        self.monitoring.read().clone()
    }

    // Command-line overrides land here
    pub fn update_optimizer<F: FnOnce(&mut OptimizerConfig)>(&self, f: F) {
        f(&mut *self.optimizer.write());
    }

    pub fn update_monitoring<F: FnOnce(&mut MonitoringConfig)>(&self, f: F) {
        f(&mut *self.monitoring.write());
    }
}

fn parse_flag(raw: &str) -> bool {
    matches!(raw.trim().to_lowercase().as_str(), "1" | "true" | "yes" | "on")
}
