//! Byte ranges into the source text.

use serde::Serialize;

/// A half-open byte range `start..end` in the source text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
pub struct Span {
    /// Start byte offset (inclusive).
    pub start: usize,
    /// End byte offset (exclusive).
    pub end: usize,
}

impl Span {
    /// Creates a new span.
    #[must_use]
    pub const fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    /// An empty span positioned at `offset`.
    #[must_use]
    pub const fn at(offset: usize) -> Self {
        Self::new(offset, offset)
    }

    /// Returns the length of the span in bytes.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.end - self.start
    }

    /// Returns true if the span covers no bytes.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// Smallest span covering both `self` and `other`.
    #[must_use]
    pub const fn merge(self, other: Self) -> Self {
        let start = if self.start < other.start {
            self.start
        } else {
            other.start
        };
        let end = if self.end > other.end {
            self.end
        } else {
            other.end
        };
        Self { start, end }
    }

    /// Slices `source` by this span, or returns `""` when out of range.
    #[must_use]
    pub fn slice<'s>(&self, source: &'s str) -> &'s str {
        source.get(self.start..self.end).unwrap_or_default()
    }
}

impl std::fmt::Display for Span {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}..{}", self.start, self.end)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_span_len_and_empty() {
        assert_eq!(Span::new(5, 10).len(), 5);
        assert!(Span::at(7).is_empty());
        assert!(!Span::new(5, 10).is_empty());
    }

    #[test]
    fn test_span_merge() {
        let merged = Span::new(8, 15).merge(Span::new(5, 10));
        assert_eq!(merged, Span::new(5, 15));
    }

    #[test]
    fn test_span_slice() {
        let sql = "SELECT id FROM t";
        assert_eq!(Span::new(7, 9).slice(sql), "id");
        assert_eq!(Span::new(40, 50).slice(sql), "");
    }

    #[test]
    fn test_span_display() {
        assert_eq!(Span::new(3, 8).to_string(), "3..8");
    }
}
