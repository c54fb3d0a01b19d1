// Record Reader - line-oriented ingestion of the event stream
// Header `N W H`, then up to N records `S t v w` / `R t`

use std::fmt;
use std::io::BufRead;
use thiserror::Error;
use tracing::{debug, warn};

use crate::core::config::InputConfig;
use crate::core::events::{Event, Header};

// ============================================================================
// Error Type
// ============================================================================

#[derive(Debug, Error)]
pub enum InputError {
    #[error("missing header line")]
    MissingHeader,
    #[error("malformed header: {0}")]
    MalformedHeader(String),
    #[error("line {line}: malformed record: {reason}")]
    MalformedRecord { line: usize, reason: String },
    #[error("line {line}: unknown record tag '{tag}'")]
    UnknownRecord { line: usize, tag: String },
    #[error("more records than the {expected} announced in the header")]
    ExcessRecords { expected: usize },
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

// ============================================================================
// Line Parsing
// ============================================================================

fn parse_u64_field(token: &str, field_name: &str) -> Result<u64, String> {
    token
        .parse::<u64>()
        .map_err(|_| format!("{} must be a non-negative integer, got '{}'", field_name, token))
}

fn parse_time_field(token: &str) -> Result<i64, String> {
    token
        .parse::<i64>()
        .map_err(|_| format!("time must be an integer, got '{}'", token))
}

fn parse_amount_field(token: &str, field_name: &str) -> Result<u32, String> {
    token.parse::<u32>().map_err(|_| {
        format!(
            "{} must be an integer in 0..={}, got '{}'",
            field_name,
            u32::MAX,
            token
        )
    })
}

/// Parse the `N W H` header line
pub fn parse_header(line: &str) -> Result<Header, InputError> {
    let tokens: Vec<&str> = line.split_whitespace().collect();
    if tokens.len() != 3 {
        return Err(InputError::MalformedHeader(format!(
            "expected 3 fields, found {}",
            tokens.len()
        )));
    }

    let count = parse_u64_field(tokens[0], "event count").map_err(InputError::MalformedHeader)?;
    let window = parse_u64_field(tokens[1], "window").map_err(InputError::MalformedHeader)?;
    let capacity = parse_u64_field(tokens[2], "capacity").map_err(InputError::MalformedHeader)?;
    let event_count = usize::try_from(count)
        .map_err(|_| InputError::MalformedHeader(format!("event count {} too large", count)))?;

    Ok(Header::new(event_count, window, capacity))
}

/// Parse one non-blank record line. `line` is the 1-based line number used in errors.
pub fn parse_record(text: &str, line: usize) -> Result<Event, InputError> {
    let malformed = |reason: String| InputError::MalformedRecord { line, reason };

    let mut tokens = text.split_whitespace();
    let tag = tokens.next().ok_or_else(|| malformed("blank line".to_string()))?;
    let fields: Vec<&str> = tokens.collect();

    match tag {
        "S" => {
            if fields.len() != 3 {
                return Err(malformed(format!("'S' takes 3 fields, found {}", fields.len())));
            }
            let time = parse_time_field(fields[0]).map_err(malformed)?;
            let value = parse_amount_field(fields[1], "value").map_err(malformed)?;
            let weight = parse_amount_field(fields[2], "weight").map_err(malformed)?;
            if weight == 0 {
                return Err(malformed("weight must be positive".to_string()));
            }
            Ok(Event::Arrival { time, value, weight })
        }
        "R" => {
            if fields.len() != 1 {
                return Err(malformed(format!("'R' takes 1 field, found {}", fields.len())));
            }
            let time = parse_time_field(fields[0]).map_err(malformed)?;
            Ok(Event::Query { time })
        }
        other => Err(InputError::UnknownRecord {
            line,
            tag: other.to_string(),
        }),
    }
}

// ============================================================================
// Reader Statistics
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReaderStats {
    pub records_read: u64,
    pub arrivals: u64,
    pub queries: u64,
    pub blank_lines: u64,
    pub ignored_lines: u64,
}

impl fmt::Display for ReaderStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Reader(records={}, arrivals={}, queries={}, blank={}, ignored={})",
            self.records_read, self.arrivals, self.queries, self.blank_lines, self.ignored_lines
        )
    }
}

// ============================================================================
// RecordReader
// ============================================================================

pub struct RecordReader<R: BufRead> {
    source: R,
    config: InputConfig,
    buffer: String,
    line_number: usize,
    header: Option<Header>,
    remaining: usize,
    exhausted: bool,
    stats: ReaderStats,
}

impl<R: BufRead> RecordReader<R> {
    pub fn new(source: R) -> Self {
        Self::with_config(source, InputConfig::default())
    }

    pub fn with_config(source: R, config: InputConfig) -> Self {
        Self {
            source,
            config,
            buffer: String::new(),
            line_number: 0,
            header: None,
            remaining: 0,
            exhausted: false,
            stats: ReaderStats::default(),
        }
    }

    /// Next physical line, without its terminator. `None` at EOF.
    fn next_line(&mut self) -> Result<Option<&str>, InputError> {
        self.buffer.clear();
        if self.source.read_line(&mut self.buffer)? == 0 {
            return Ok(None);
        }
        self.line_number += 1;
        Ok(Some(self.buffer.trim_end_matches(&['\n', '\r'][..])))
    }

    /// Read and parse the header. Must be called once, before any record.
    pub fn read_header(&mut self) -> Result<Header, InputError> {
        if let Some(header) = self.header {
            return Ok(header);
        }

        let skip_blank = self.config.skip_blank_lines;
        loop {
            let line_number = self.line_number + 1;
            let Some(line) = self.next_line()? else {
                return Err(InputError::MissingHeader);
            };
            if line.trim().is_empty() {
                if skip_blank {
                    self.stats.blank_lines += 1;
                    continue;
                }
                return Err(InputError::MalformedHeader(format!("line {} is blank", line_number)));
            }

            let header = parse_header(line)?;
            debug!(%header, "Read header");
            self.header = Some(header);
            self.remaining = header.event_count;
            return Ok(header);
        }
    }

    /// Next record, or `None` once the announced count is consumed or input ends.
    pub fn next_event(&mut self) -> Result<Option<Event>, InputError> {
        if self.header.is_none() {
            self.read_header()?;
        }
        if self.exhausted {
            return Ok(None);
        }
        if self.remaining == 0 {
            self.drain_excess()?;
            return Ok(None);
        }

        loop {
            let line_number = self.line_number + 1;
            let skip_blank = self.config.skip_blank_lines;
            let Some(line) = self.next_line()? else {
                if self.remaining > 0 {
                    debug!(missing = self.remaining, "Input ended before announced record count");
                }
                self.exhausted = true;
                return Ok(None);
            };

            if line.trim().is_empty() && skip_blank {
                self.stats.blank_lines += 1;
                continue;
            }

            let event = parse_record(line, line_number).map_err(|e| {
                warn!(line = line_number, error = %e, "Rejected input record");
                e
            })?;

            self.remaining -= 1;
            self.stats.records_read += 1;
            match event {
                Event::Arrival { .. } => self.stats.arrivals += 1,
                Event::Query { .. } => self.stats.queries += 1,
            }
            return Ok(Some(event));
        }
    }

    /// Consume whatever follows the last announced record.
    fn drain_excess(&mut self) -> Result<(), InputError> {
        self.exhausted = true;
        let expected = self.header.map(|h| h.event_count).unwrap_or_default();
        let reject = self.config.reject_excess_records;

        while let Some(line) = self.next_line()? {
            if line.trim().is_empty() {
                continue;
            }
            if reject {
                return Err(InputError::ExcessRecords { expected });
            }
            self.stats.ignored_lines += 1;
        }

        if self.stats.ignored_lines > 0 {
            debug!(ignored = self.stats.ignored_lines, expected, "Ignored lines past announced record count");
        }
        Ok(())
    }

    pub fn stats(&self) -> ReaderStats {
        self.stats.clone()
    }
}

impl<R: BufRead> Iterator for RecordReader<R> {
    type Item = Result<Event, InputError>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.next_event() {
            Ok(Some(event)) => Some(Ok(event)),
            Ok(None) => None,
            Err(e) => {
                self.exhausted = true;
                Some(Err(e))
            }
        }
    }
}
