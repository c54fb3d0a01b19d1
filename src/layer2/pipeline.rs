// Stream Pipeline - Reader -> StreamOptimizer -> AnswerWriter
// Drives one input stream to completion

use std::fmt;
use std::io::{BufRead, Write};
use std::time::Instant;
use thiserror::Error;
use tracing::{debug, info};

use crate::core::config::{ConfigManager, InputConfig, OptimizerConfig};
use crate::core::events::Header;
use crate::layer1::reader::{InputError, ReaderStats, RecordReader};
use crate::layer2::metrics::RunMetrics;
use crate::layer2::output::AnswerWriter;
use crate::layer3::optimizer::{OptimizerStats, StreamOptimizer};

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Input(#[from] InputError),
    #[error("output error: {0}")]
    Io(#[from] std::io::Error),
}

/// Pipeline statistics
#[derive(Debug, Clone, Default)]
pub struct PipelineStats {
    pub header: Option<Header>,
    pub skipped: bool,
    pub answers_written: u64,
    pub elapsed_ms: f64,
    pub reader: ReaderStats,
    pub optimizer: OptimizerStats,
}

impl fmt::Display for PipelineStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Pipeline(records={}, answers={}, skipped={}, elapsed={:.2}ms)",
            self.reader.records_read, self.answers_written, self.skipped, self.elapsed_ms
        )
    }
}

pub struct Pipeline {
    optimizer_config: OptimizerConfig,
    input_config: InputConfig,
}

impl Pipeline {
    pub fn new(optimizer_config: OptimizerConfig, input_config: InputConfig) -> Self {
        Self {
            optimizer_config,
            input_config,
        }
    }

    pub fn from_config(config: &ConfigManager) -> Self {
        Self::new(config.optimizer(), config.input())
    }

    /// Process the whole stream, writing one answer line per query.
    ///
    /// A header with a zero field produces no output and leaves the rest of
    /// the input unread.
    pub fn run<R: BufRead, W: Write>(&self, input: R, output: W) -> Result<PipelineStats, PipelineError> {
        let started = Instant::now();
        let mut reader = RecordReader::with_config(input, self.input_config.clone());
        let mut writer = AnswerWriter::new(output);
        let mut stats = PipelineStats::default();

        let header = reader.read_header()?;
        stats.header = Some(header);

        if header.is_degenerate() {
            info!(%header, "Degenerate header, nothing to process");
            stats.skipped = true;
            stats.reader = reader.stats();
            stats.elapsed_ms = started.elapsed().as_secs_f64() * 1000.0;
            return Ok(stats);
        }

        let mut optimizer = StreamOptimizer::from_header(&header, &self.optimizer_config);

        while let Some(event) = reader.next_event()? {
            if let Some(selection) = optimizer.on_event(&event) {
                writer.write_answer(&selection)?;
            }
        }
        writer.flush()?;

        stats.answers_written = writer.lines_written();
        stats.reader = reader.stats();
        stats.optimizer = optimizer.stats();
        stats.elapsed_ms = started.elapsed().as_secs_f64() * 1000.0;

        debug!(%stats, "Pipeline finished");
        Ok(stats)
    }

    /// Run over in-memory input and return the answer text
    pub fn run_to_string(&self, input: &str) -> Result<String, PipelineError> {
        let mut out = Vec::new();
        self.run(input.as_bytes(), &mut out)?;
        Ok(String::from_utf8_lossy(&out).into_owned())
    }

    pub fn collect_metrics(stats: &PipelineStats) -> RunMetrics {
        RunMetrics::from_stats(stats)
    }
}

impl Default for Pipeline {
    fn default() -> Self {
        Self::new(OptimizerConfig::default(), InputConfig::default())
    }
}
