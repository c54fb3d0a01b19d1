// Run Metrics - Collects and formats stats from all pipeline components
// Aggregates reader and optimizer stats into a single view

use std::fmt;
use tracing::info;

use crate::layer1::reader::ReaderStats;
use crate::layer2::pipeline::PipelineStats;
use crate::layer3::optimizer::OptimizerStats;

/// Metrics snapshot for one pipeline run
#[derive(Debug, Clone, Default)]
pub struct RunMetrics {
    pub reader: ReaderStats,
    pub optimizer: OptimizerStats,
    pub answers_written: u64,
    pub elapsed_ms: f64,
    pub skipped: bool,
}

impl RunMetrics {
    pub fn from_stats(stats: &PipelineStats) -> Self {
        Self {
            reader: stats.reader.clone(),
            optimizer: stats.optimizer.clone(),
            answers_written: stats.answers_written,
            elapsed_ms: stats.elapsed_ms,
            skipped: stats.skipped,
        }
    }

    /// Share of queries answered by a full search
    pub fn recompute_ratio(&self) -> f64 {
        if self.optimizer.queries > 0 {
            self.optimizer.recomputations as f64 / self.optimizer.queries as f64
        } else {
            0.0
        }
    }

    pub fn avg_nodes_per_search(&self) -> f64 {
        if self.optimizer.recomputations > 0 {
            self.optimizer.nodes_explored as f64 / self.optimizer.recomputations as f64
        } else {
            0.0
        }
    }

    /// Print detailed multi-line report
    pub fn print_report(&self) {
        info!("=== RUN METRICS ===");

        if self.skipped {
            info!("  Input:        degenerate header, stream skipped");
            return;
        }

        let r = &self.reader;
        info!("  Reader:       records={} arrivals={} queries={} blank={} ignored={}",
            r.records_read, r.arrivals, r.queries, r.blank_lines, r.ignored_lines);

        let o = &self.optimizer;
        info!("  Window:       admitted={} rejected={} evicted={} (selected={})",
            o.admissions, o.rejections, o.evictions, o.invalidating_evictions);
        info!("  Cache:        hits={} recomputations={} extensions={} hit_rate={:.1}%",
            o.cache_hits, o.recomputations, o.extensions, o.cache_hit_rate() * 100.0);
        info!("  Search:       nodes={} pruned={} avg_nodes={:.1}",
            o.nodes_explored, o.branches_pruned, self.avg_nodes_per_search());
        info!("  Output:       answers={} elapsed={:.2}ms", self.answers_written, self.elapsed_ms);
    }

    /// Print compact single-line summary
    pub fn print_compact(&self) {
        info!("records={} answers={} | recompute={} hits={} | nodes={} pruned={} | {:.2}ms",
            self.reader.records_read, self.answers_written,
            self.optimizer.recomputations, self.optimizer.cache_hits,
            self.optimizer.nodes_explored, self.optimizer.branches_pruned,
            self.elapsed_ms);
    }
}

impl fmt::Display for RunMetrics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "RunMetrics(records={}, answers={}, recomputations={})",
            self.reader.records_read, self.answers_written, self.optimizer.recomputations
        )
    }
}
