//! Source position tracking for phrase token trees, heavily adapted from
//! [codemap](https://crates.io/crates/codemap).

use peg::str::LineCol;

/// A range of text within a string.
#[derive(Copy, Clone, Debug, Default, Eq, Hash, PartialEq)]
pub struct Span {
    /// The position in the source of the first byte of the span.
    pub start: usize,

    /// The position after the last byte of the span.
    pub end: usize,
}

impl Span {
    /// Creates a new span.
    #[inline]
    pub fn new(start: usize, end: usize) -> Self {
        Span { start, end }
    }

    /// Creates a span that encloses both `self` and `other`.
    #[inline]
    pub fn merge(self, other: Span) -> Span {
        Span {
            start: self.start.min(other.start),
            end: self.end.max(other.end),
        }
    }

    /// The byte range of the span, for slicing the source text.
    #[inline]
    pub fn into_range(self) -> core::ops::Range<usize> {
        self.start..self.end
    }
}

/// A parsed node together with the source span it was parsed from.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub struct Spanned<T> {
    /// The value.
    pub node: T,
    /// The span.
    pub span: Span,
}

impl<T> Spanned<T> {
    /// Creates a new [`Spanned`].
    #[inline]
    pub fn new(node: T, start: usize, end: usize) -> Self {
        Self {
            node,
            span: Span { start, end },
        }
    }
}

impl<T> core::ops::Deref for Spanned<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.node
    }
}

/// Line start positions of a source text, used to report token positions.
#[derive(Debug)]
pub struct FileMap<'a> {
    /// The source text.
    source: &'a str,

    /// Byte positions of line beginnings.
    lines: Vec<usize>,
}

impl core::ops::Deref for FileMap<'_> {
    type Target = str;

    fn deref(&self) -> &Self::Target {
        self.source
    }
}

impl<'a> FileMap<'a> {
    /// Creates a new line map for the given source.
    pub fn new(source: &'a str) -> Self {
        let lines = core::iter::once(0)
            .chain(source.match_indices('\n').map(|(p, _)| p + 1))
            .collect();

        Self { source, lines }
    }

    /// Gets the 1-indexed line and column of a byte position.
    ///
    /// Positions past the end of the source are clamped to the end, and
    /// positions inside a UTF-8 sequence count the partial character as a
    /// column.
    pub fn find_line_col(&self, pos: usize) -> LineCol {
        let pos = pos.min(self.source.len());
        let line = self.find_line(pos);
        let line_start = self.lines.get(line).copied().unwrap_or_default();
        let column = self
            .source
            .get(line_start..pos)
            .map_or(pos - line_start, |text| text.chars().count());
        LineCol {
            line: line + 1,
            column: column + 1,
            offset: pos,
        }
    }

    /// Gets the 0-indexed line number of a byte position.
    fn find_line(&self, pos: usize) -> usize {
        match self.lines.binary_search(&pos) {
            Ok(i) => i,
            Err(i) => i.saturating_sub(1),
        }
    }
}
