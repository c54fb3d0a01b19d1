// Event Types for Slidepack
// Stream header and the two record kinds consumed by the optimizer

use std::fmt;

// ============================================================================
// Header
// ============================================================================

/// First line of a stream: `N W H`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Header {
    pub event_count: usize,
    pub window: u64,
    pub capacity: u64,
}

impl Header {
    pub fn new(event_count: usize, window: u64, capacity: u64) -> Self {
        Self {
            event_count,
            window,
            capacity,
        }
    }

    /// A zero in any field means there is nothing to process
    pub fn is_degenerate(&self) -> bool {
        self.event_count == 0 || self.window == 0 || self.capacity == 0
    }
}

impl fmt::Display for Header {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Header(events={}, window={}, capacity={})",
            self.event_count, self.window, self.capacity
        )
    }
}

// ============================================================================
// Event
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    /// `S <time> <value> <weight>`. Amounts fit in `u32`, so the optimizer's
    /// `u64` running totals cannot overflow.
    Arrival { time: i64, value: u32, weight: u32 },
    /// `R <time>`
    Query { time: i64 },
}

impl Event {
    pub fn time(&self) -> i64 {
        match self {
            Event::Arrival { time, .. } | Event::Query { time } => *time,
        }
    }

    pub fn is_query(&self) -> bool {
        matches!(self, Event::Query { .. })
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Event::Arrival { time, value, weight } => write!(f, "S {} {} {}", time, value, weight),
            Event::Query { time } => write!(f, "R {}", time),
        }
    }
}
