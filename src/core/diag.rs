//! Source positions and diagnostic rendering.

use std::fmt::{Display, Formatter, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Position {
    pub offset: usize,
    pub line: usize,
    pub column: usize,
}

impl Default for Position {
    fn default() -> Self {
        Self {
            offset: 0,
            line: 1,
            column: 1,
        }
    }
}

impl Display for Position {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Span {
    pub start: Position,
    pub end: Position,
}

impl Span {
    pub fn new(start: Position, end: Position) -> Self {
        Self { start, end }
    }

    pub fn len(&self) -> usize {
        self.end.offset.saturating_sub(self.start.offset)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Display for Span {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        write!(f, "{}..{}", self.start, self.end)
    }
}

/// Maps byte offsets of a source text to line/column positions.
#[derive(Debug, Clone)]
pub struct LineIndex {
    line_starts: Vec<usize>,
}

impl LineIndex {
    pub fn new(source: &str) -> Self {
        let mut line_starts = vec![0];
        for (idx, byte) in source.bytes().enumerate() {
            if byte == b'\n' {
                line_starts.push(idx + 1);
            }
        }
        Self { line_starts }
    }

    pub fn position(&self, offset: usize) -> Position {
        let line_idx = match self.line_starts.binary_search(&offset) {
            Ok(idx) => idx,
            Err(idx) => idx - 1,
        };
        Position {
            offset,
            line: line_idx + 1,
            column: offset - self.line_starts[line_idx] + 1,
        }
    }

    pub fn span(&self, range: std::ops::Range<usize>) -> Span {
        Span::new(self.position(range.start), self.position(range.end))
    }
}

fn get_line(source: &str, line: usize) -> &str {
    source.lines().nth(line.saturating_sub(1)).unwrap_or("")
}

/// Formats an error message with a marker line that points to the error location.
///
/// Single-character spans are marked with a caret, longer ones with dashes.
pub fn format_error(source: &str, span: Span, error: impl Display) -> String {
    let line = span.start.line;
    let column = span.start.column;
    let line_contents = get_line(source, line);

    let indent = " ".repeat(column.saturating_sub(1));
    let marker_line = if span.len() <= 1 {
        indent + "^"
    } else {
        // Multi-line spans are clipped at the end of the first line.
        let visible = line_contents.len().saturating_sub(column - 1).max(1);
        indent + &"-".repeat(span.len().min(visible))
    };
    format!("({line}:{column}): {error}\n\n{line_contents}\n{marker_line}")
}

#[cfg(test)]
#[path = "../tests/t_diag.rs"]
mod tests;
