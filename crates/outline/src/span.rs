use serde::{Deserialize, Serialize};

/// Half-open byte range `[start, end)` into a file's UTF-8 text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    #[must_use]
    pub const fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    #[must_use]
    pub const fn len(self) -> usize {
        self.end.saturating_sub(self.start)
    }

    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.end <= self.start
    }

    /// Check that `other` lies entirely within this span
    #[must_use]
    pub const fn contains(self, other: Span) -> bool {
        other.start >= self.start && other.end <= self.end
    }
}

/// Line-start table for converting `(row, column)` positions to byte offsets.
///
/// Rows are 0-based and columns are byte columns, matching tree-sitter points.
#[derive(Debug, Clone)]
pub struct LineIndex {
    starts: Vec<usize>,
    len: usize,
}

impl LineIndex {
    pub fn new(text: &str) -> Self {
        let mut starts = vec![0];
        starts.extend(
            text.bytes()
                .enumerate()
                .filter(|(_, b)| *b == b'\n')
                .map(|(idx, _)| idx + 1),
        );
        Self {
            starts,
            len: text.len(),
        }
    }

    /// Absolute byte offset of a position, clamped to the text length
    #[must_use]
    pub fn offset(&self, row: usize, column: usize) -> usize {
        let Some(line_start) = self.starts.get(row) else {
            return self.len;
        };
        (line_start + column).min(self.len)
    }

    /// 1-based line number containing `offset`
    #[must_use]
    pub fn line_of(&self, offset: usize) -> usize {
        match self.starts.binary_search(&offset) {
            Ok(idx) => idx + 1,
            Err(idx) => idx,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_span_contains() {
        let outer = Span::new(0, 10);
        assert!(outer.contains(Span::new(2, 5)));
        assert!(outer.contains(Span::new(0, 10)));
        assert!(!outer.contains(Span::new(5, 11)));
        assert_eq!(Span::new(3, 7).len(), 4);
        assert!(Span::new(4, 4).is_empty());
    }

    #[test]
    fn test_line_index_offsets() {
        let text = "ab\ncde\n\nf";
        let index = LineIndex::new(text);
        assert_eq!(index.line_of(text.len()), 4);
        assert_eq!(index.offset(0, 1), 1);
        assert_eq!(index.offset(1, 0), 3);
        assert_eq!(index.offset(3, 0), 8);
        assert_eq!(index.offset(9, 0), text.len());
    }

    #[test]
    fn test_line_index_multibyte_columns_are_bytes() {
        let text = "é = 1\nx = 2";
        let index = LineIndex::new(text);
        // "é" is two bytes, so the second line starts at byte 7
        assert_eq!(index.offset(1, 0), 7);
        assert_eq!(&text[index.offset(1, 0)..], "x = 2");
    }

    #[test]
    fn test_line_of() {
        let index = LineIndex::new("a\nb\nc");
        assert_eq!(index.line_of(0), 1);
        assert_eq!(index.line_of(1), 1);
        assert_eq!(index.line_of(2), 2);
        assert_eq!(index.line_of(4), 3);
    }
}
