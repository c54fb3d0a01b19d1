// Answer Output - one line per query: `<value> <count> <id_1> ... <id_k>`

use std::io::{self, Write};

use crate::core::types::Selection;

/// Render a selection as an answer line, without the trailing newline
pub fn format_answer(selection: &Selection) -> String {
    let mut line = format!("{} {}", selection.total_value(), selection.count());
    for id in selection.ids() {
        line.push(' ');
        line.push_str(&id.to_string());
    }
    line
}

/// Writes answer lines to any sink and counts them
pub struct AnswerWriter<W: Write> {
    sink: W,
    lines_written: u64,
}

impl<W: Write> AnswerWriter<W> {
    pub fn new(sink: W) -> Self {
        Self {
            sink,
            lines_written: 0,
        }
    }

    pub fn write_answer(&mut self, selection: &Selection) -> io::Result<()> {
        writeln!(self.sink, "{}", format_answer(selection))?;
        self.lines_written += 1;
        Ok(())
    }

    pub fn flush(&mut self) -> io::Result<()> {
        self.sink.flush()
    }

    pub fn lines_written(&self) -> u64 {
        self.lines_written
    }

    pub fn into_inner(self) -> W {
        self.sink
    }
}
