/// Line-by-line view of one decoded monthly report.
///
/// The extractor never sees a structured document, only this stream: an
/// ordered, zero-indexed sequence of text lines read front to back with one
/// line of lookahead. Replaying requires an explicit `rewind`.

/// Decoded report text as an ordered sequence of lines.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LineStream {
    lines: Vec<String>,
    position: usize,
}

impl LineStream {
    pub fn new(lines: Vec<String>) -> Self {
        Self { lines, position: 0 }
    }

    /// Splits decoded text on line terminators. PDF renderers emit a form
    /// feed between pages, which is treated as a line break as well.
    pub fn from_text(text: &str) -> Self {
        let lines = text
            .split(['\n', '\x0c'])
            .map(|line| line.strip_suffix('\r').unwrap_or(line).to_string())
            .collect();
        Self::new(lines)
    }

    /// Returns the next line and advances, or `None` at the end.
    pub fn next_line(&mut self) -> Option<&str> {
        let line = self.lines.get(self.position)?;
        self.position += 1;
        Some(line.as_str())
    }

    /// Returns the next line without advancing.
    pub fn peek(&self) -> Option<&str> {
        self.lines.get(self.position).map(String::as_str)
    }

    /// Index of the line `next_line` would return.
    pub fn position(&self) -> usize {
        self.position
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn is_exhausted(&self) -> bool {
        self.position >= self.lines.len()
    }

    pub fn rewind(&mut self) {
        self.position = 0;
    }
}

impl<S: Into<String>> FromIterator<S> for LineStream {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self::new(iter.into_iter().map(Into::into).collect())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
