use crate::diagnostics::Position;
use crate::span::Span;

/// One compilation unit's text plus a line index.
///
/// Also plays the renderer role: quoting a node back to source text is a
/// span slice of the original buffer, never a pretty-print.
#[derive(Debug, Clone)]
pub struct SourceFile {
    path: String,
    text: String,
    line_starts: Vec<u32>,
}

impl SourceFile {
    pub fn new(path: impl Into<String>, text: impl Into<String>) -> Self {
        let text = text.into();
        let mut line_starts = vec![0u32];
        for (i, b) in text.bytes().enumerate() {
            if b == b'\n' {
                line_starts.push(i as u32 + 1);
            }
        }
        SourceFile {
            path: path.into(),
            text,
            line_starts,
        }
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn len(&self) -> u32 {
        self.text.len() as u32
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    /// Renders the node covered by `span`. Fails closed: out-of-range or
    /// split-character spans yield `None`, never a partial slice.
    pub fn slice(&self, span: Span) -> Option<&str> {
        let start = span.start as usize;
        let end = span.end as usize;
        if start > end || end > self.text.len() {
            return None;
        }
        if !self.text.is_char_boundary(start) || !self.text.is_char_boundary(end) {
            return None;
        }
        Some(&self.text[start..end])
    }

    /// 1-based line/column for a byte offset. Offsets past the end clamp to
    /// the last position.
    pub fn position(&self, offset: u32) -> Position {
        let offset = offset.min(self.len());
        let line_idx = match self.line_starts.binary_search(&offset) {
            Ok(i) => i,
            Err(i) => i - 1,
        };
        let line_start = self.line_starts[line_idx] as usize;
        let col = self.text[line_start..offset as usize].chars().count() as u32 + 1;
        Position {
            line: line_idx as u32 + 1,
            col,
            offset: Some(offset),
        }
    }
}
