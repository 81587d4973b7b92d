//! Source location tracking for IR nodes.

use smol_str::SmolStr;

/// A span represents a range of byte offsets in the original source file.
///
/// Declarations synthesized by the compiler may have no meaningful position;
/// those carry [`Span::UNDEFINED`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Span {
    /// Start byte offset (inclusive)
    pub start: u32,
    /// End byte offset (exclusive)
    pub end: u32,
}

impl Span {
    /// Span of a node that does not exist in source code.
    pub const UNDEFINED: Span = Span {
        start: u32::MAX,
        end: u32::MAX,
    };

    /// Create a new span from start and end offsets.
    pub fn new(start: u32, end: u32) -> Self {
        Self { start, end }
    }

    /// Create an empty span at a position.
    pub fn empty(pos: u32) -> Self {
        Self {
            start: pos,
            end: pos,
        }
    }

    /// Whether this span denotes no source position at all.
    pub fn is_undefined(&self) -> bool {
        self.start == u32::MAX
    }

    /// Start offset, unless the span is undefined.
    pub fn start_offset(&self) -> Option<u32> {
        (!self.is_undefined()).then_some(self.start)
    }

    /// Create a span covering two spans.
    pub fn merge(self, other: Span) -> Self {
        if self.is_undefined() {
            return other;
        }
        if other.is_undefined() {
            return self;
        }
        Self {
            start: self.start.min(other.start),
            end: self.end.max(other.end),
        }
    }

    /// Check if this span contains a byte offset.
    pub fn contains(&self, offset: u32) -> bool {
        !self.is_undefined() && self.start <= offset && offset < self.end
    }
}

impl Default for Span {
    fn default() -> Self {
        Span::UNDEFINED
    }
}

/// Line table of one source file, used to turn offsets into positions.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FileEntry {
    /// Path of the source file as recorded by the front-end.
    pub path: SmolStr,
    /// Byte offset at which every line starts. Always begins with `0`.
    line_starts: Vec<u32>,
}

impl FileEntry {
    /// Build the line table from the file's source text.
    pub fn new(path: impl Into<SmolStr>, source: &str) -> Self {
        let line_starts = std::iter::once(0)
            .chain(
                source
                    .char_indices()
                    .filter(|&(_, c)| c == '\n')
                    .map(|(i, _)| i as u32 + 1),
            )
            .collect();

        Self {
            path: path.into(),
            line_starts,
        }
    }

    /// Use a precomputed line table (as stored in serialized libraries).
    pub fn with_line_starts(path: impl Into<SmolStr>, mut line_starts: Vec<u32>) -> Self {
        if line_starts.first() != Some(&0) {
            line_starts.insert(0, 0);
        }
        Self {
            path: path.into(),
            line_starts,
        }
    }

    /// Zero-based line containing `offset`.
    pub fn line_number(&self, offset: u32) -> u32 {
        (self.line_starts.partition_point(|&start| start <= offset) - 1) as u32
    }

    /// Zero-based column of `offset` within its line.
    pub fn column_number(&self, offset: u32) -> u32 {
        offset - self.line_starts[self.line_number(offset) as usize]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_and_column() {
        let entry = FileEntry::new("main.kt", "fun a() {}\nfun b() {}\n\nclass C");

        assert_eq!(entry.line_number(0), 0);
        assert_eq!(entry.column_number(4), 4);
        assert_eq!(entry.line_number(11), 1);
        assert_eq!(entry.column_number(15), 4);
        assert_eq!(entry.line_number(22), 2);
        assert_eq!(entry.line_number(23), 3);
        assert_eq!(entry.column_number(29), 6);
    }

    #[test]
    fn test_precomputed_line_starts() {
        let entry = FileEntry::with_line_starts("lib.kt", vec![10, 20]);
        assert_eq!(entry.line_number(5), 0);
        assert_eq!(entry.line_number(10), 1);
        assert_eq!(entry.column_number(25), 5);
    }

    #[test]
    fn test_undefined_span() {
        let span = Span::UNDEFINED;
        assert!(span.is_undefined());
        assert_eq!(span.start_offset(), None);
        assert!(!span.contains(0));

        let merged = span.merge(Span::new(3, 8));
        assert_eq!(merged, Span::new(3, 8));
        assert_eq!(Span::new(3, 8).merge(Span::new(1, 4)), Span::new(1, 8));
        assert_eq!(Span::empty(7).start_offset(), Some(7));
    }
}
