//! Source spans: half-open byte ranges within a named source unit.
//!
//! Every Sass AST node, CSS AST node, and runtime value carries the span of
//! the text that produced it. Line/column are derived on demand from the
//! byte offset rather than stored eagerly, mirroring how the tokenizer this
//! module replaces tracked `Location`.

use std::fmt;
use std::rc::Rc;

/// Identifies the source text a span belongs to. Cheaply cloneable since
/// every node in a stylesheet shares the same source.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SourceFile {
    /// Display URL: a file path, `stdin`, or a synthetic name for
    /// strings compiled without a URL.
    pub url: Rc<str>,
    text: Rc<str>,
    /// Byte offset of the start of each line, used to derive line/column.
    line_starts: Rc<[u32]>,
}

impl SourceFile {
    pub fn new(url: impl Into<Rc<str>>, text: impl Into<Rc<str>>) -> Self {
        let text = text.into();
        let mut line_starts = vec![0u32];
        for (i, b) in text.bytes().enumerate() {
            if b == b'\n' {
                line_starts.push((i + 1) as u32);
            }
        }
        Self {
            url: url.into(),
            text,
            line_starts: line_starts.into(),
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// 1-based line and column for a byte offset.
    pub fn line_col(&self, offset: u32) -> (u32, u32) {
        let line_idx = match self.line_starts.binary_search(&offset) {
            Ok(i) => i,
            Err(i) => i.saturating_sub(1),
        };
        let line_start = self.line_starts[line_idx];
        (line_idx as u32 + 1, offset - line_start + 1)
    }

    pub fn slice(&self, span: Span) -> &str {
        &self.text[span.start as usize..span.end as usize]
    }
}

/// A half-open byte range `[start, end)` within a [`SourceFile`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub struct Span {
    pub start: u32,
    pub end: u32,
}

impl Span {
    pub fn new(start: u32, end: u32) -> Self {
        debug_assert!(start <= end);
        Self { start, end }
    }

    pub fn point(at: u32) -> Self {
        Self { start: at, end: at }
    }

    pub fn merge(self, other: Span) -> Span {
        Span::new(self.start.min(other.start), self.end.max(other.end))
    }

    pub fn len(&self) -> u32 {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.end == self.start
    }
}

/// A span paired with the source it refers into; what diagnostics print.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FileSpan {
    pub file: SourceFile,
    pub span: Span,
}

impl FileSpan {
    pub fn new(file: SourceFile, span: Span) -> Self {
        Self { file, span }
    }

    pub fn text(&self) -> &str {
        self.file.slice(self.span)
    }

    pub fn start_line_col(&self) -> (u32, u32) {
        self.file.line_col(self.span.start)
    }
}

impl fmt::Display for FileSpan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (line, col) = self.start_line_col();
        write!(f, "{}:{}:{}", self.file.url(), line, col)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn line_col_is_one_based_on_the_first_line() {
        let file = SourceFile::new("a.scss", "abc");
        assert_eq!(file.line_col(0), (1, 1));
        assert_eq!(file.line_col(2), (1, 3));
    }

    #[test]
    fn line_col_advances_past_each_newline() {
        let file = SourceFile::new("a.scss", "one\ntwo\nthree");
        assert_eq!(file.line_col(0), (1, 1));
        assert_eq!(file.line_col(4), (2, 1));
        assert_eq!(file.line_col(8), (3, 1));
        assert_eq!(file.line_col(10), (3, 3));
    }

    #[test]
    fn slice_returns_the_exact_text_of_a_span() {
        let file = SourceFile::new("a.scss", "a { color: red; }");
        let span = Span::new(4, 9);
        assert_eq!(file.slice(span), "color");
    }

    #[test]
    fn merge_covers_the_union_of_both_spans_regardless_of_order() {
        let a = Span::new(5, 10);
        let b = Span::new(2, 7);
        assert_eq!(a.merge(b), Span::new(2, 10));
        assert_eq!(b.merge(a), Span::new(2, 10));
    }

    #[test]
    fn a_point_span_is_empty() {
        assert!(Span::point(3).is_empty());
        assert_eq!(Span::point(3).len(), 0);
    }

    #[test]
    fn file_span_display_renders_url_colon_line_colon_column() {
        let file = SourceFile::new("style.scss", "a\nb");
        let fs = FileSpan::new(file, Span::point(2));
        assert_eq!(fs.to_string(), "style.scss:2:1");
    }
}
