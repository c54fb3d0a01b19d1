// Layer 1 - Ingestion
// Reads the header and the record stream from any buffered source

pub mod reader;

// Re-export commonly used items for convenience
pub use reader::{parse_header, parse_record, InputError, ReaderStats, RecordReader};
