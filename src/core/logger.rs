// Structured Logging for Slidepack
// tracing + tracing-subscriber; always writes to stderr since stdout carries answers

use std::sync::Once;
use tracing::Level;
use tracing_subscriber::EnvFilter;

static INIT: Once = Once::new();

/// Map a textual level to a tracing level. Unknown names yield `None`.
pub fn parse_level(log_level: &str) -> Option<Level> {
    match log_level.to_uppercase().as_str() {
        "TRACE" => Some(Level::TRACE),
        "DEBUG" => Some(Level::DEBUG),
        "INFO" => Some(Level::INFO),
        "WARN" | "WARNING" => Some(Level::WARN),
        "ERROR" => Some(Level::ERROR),
        _ => None,
    }
}

/// Setup structured logging for the entire application
pub fn setup_logging(
    log_level: Option<&str>,
    json_format: Option<bool>,
    console_output: Option<bool>,
) {
    let log_level_str = log_level.unwrap_or("WARN");
    let json_format = json_format.unwrap_or(false);
    let console_output = console_output.unwrap_or(true);

    let level = parse_level(log_level_str).unwrap_or(Level::WARN);

    INIT.call_once(|| {
        let filter = EnvFilter::from_default_env().add_directive(level.into());

        if !console_output {
            tracing_subscriber::fmt()
                .with_env_filter(EnvFilter::new("off"))
                .with_writer(std::io::sink)
                .init();
            return;
        }

        if json_format {
            tracing_subscriber::fmt()
                .json()
                .with_target(true)
                .with_writer(std::io::stderr)
                .with_env_filter(filter)
                .init();
        } else {
            tracing_subscriber::fmt()
                .with_target(true)
                .with_writer(std::io::stderr)
                .with_env_filter(filter)
                .init();
        }

        tracing::info!(log_level = %log_level_str, json = json_format, "Logging initialized");
    });
}
