use std::fs::File;
use std::io::{self, BufReader, BufWriter};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;

use slidepack::core::{setup_logging, ConfigManager};
use slidepack::layer2::Pipeline;

#[derive(Parser)]
#[command(name = "slidepack", version, about = "Exact best-value subset over a sliding time window")]
struct Cli {
    /// Event stream to read; stdin when omitted
    #[arg(short, long)]
    input: Option<PathBuf>,

    /// JSON configuration file
    #[arg(short, long)]
    config: Option<String>,

    /// Log level (TRACE, DEBUG, INFO, WARN, ERROR)
    #[arg(long)]
    log_level: Option<String>,

    /// Emit logs as JSON
    #[arg(long)]
    json_logs: bool,

    /// Log a metrics report after the run
    #[arg(long)]
    metrics: bool,

    /// Keep the cached optimum valid when a new item fits alongside it
    #[arg(long)]
    extend_on_fit: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = ConfigManager::new(cli.config.as_deref()).context("failed to load configuration")?;
    config.update_monitoring(|m| {
        if let Some(level) = &cli.log_level {
            m.log_level = level.clone();
        }
        if cli.json_logs {
            m.json_format = true;
        }
        if cli.metrics {
            m.report_metrics = true;
            // The report is logged at info
            if cli.log_level.is_none() {
                m.log_level = "INFO".to_string();
            }
        }
    });
    if cli.extend_on_fit {
        config.update_optimizer(|o| o.extend_cached_on_fit = true);
    }
    config.ensure_valid().context("invalid configuration")?;

    let monitoring = config.monitoring();
    setup_logging(
        Some(&monitoring.log_level),
        Some(monitoring.json_format),
        Some(monitoring.console_output),
    );
    info!(summary = ?config.get_summary(), "Starting slidepack");

    let pipeline = Pipeline::from_config(&config);
    let stdout = io::stdout();
    let output = BufWriter::new(stdout.lock());

    let stats = match &cli.input {
        Some(path) => {
            let file = File::open(path).with_context(|| format!("cannot open {}", path.display()))?;
            pipeline.run(BufReader::new(file), output)
        }
        None => pipeline.run(io::stdin().lock(), output),
    }
    .context("failed to process event stream")?;

    if monitoring.report_metrics {
        Pipeline::collect_metrics(&stats).print_report();
    }
    info!(%stats, "Done");
    Ok(())
}
