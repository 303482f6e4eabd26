//! Offset spans and line/column helpers.
//!
//! Offsets count UTF-16 code units of the original text, the unit editors
//! address documents in. After the parser blanks illegal characters the
//! working text is pure ASCII with one blank per unit, so unit and byte
//! offsets agree for everything it slices.

use core::fmt;

use serde::Serialize;

/// An inclusive `[start, end]` pair of UTF-16 offsets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    #[inline]
    pub fn new(start: usize, end: usize) -> Self {
        Span { start, end }
    }

    /// A single-unit span.
    #[inline]
    pub fn point(at: usize) -> Self {
        Span { start: at, end: at }
    }

    #[inline]
    pub fn len(self) -> usize {
        self.end + 1 - self.start
    }

    #[inline]
    pub fn contains(self, offset: usize) -> bool {
        offset >= self.start && offset <= self.end
    }

    #[inline]
    pub fn contains_span(self, other: Span) -> bool {
        other.start >= self.start && other.end <= self.end
    }

    #[inline]
    pub fn overlaps(self, other: Span) -> bool {
        self.start <= other.end && other.start <= self.end
    }

    /// Move both ends forward by `by`.
    #[inline]
    pub fn shift(self, by: usize) -> Self {
        Span {
            start: self.start + by,
            end: self.end + by,
        }
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}]", self.start, self.end)
    }
}

/// Zero-based line and column of `offset` in `text`, both in UTF-16
/// units.
///
/// Offsets past the end land on the position just after the last char.
/// An offset inside a surrogate pair lands on that char.
pub fn line_col(text: &str, offset: usize) -> (usize, usize) {
    let mut line = 0;
    let mut column = 0;
    let mut at = 0;
    for ch in text.chars() {
        at += ch.len_utf16();
        if at > offset {
            break;
        }
        if ch == '\n' {
            line += 1;
            column = 0;
        } else {
            column += ch.len_utf16();
        }
    }
    (line, column)
}

/// Inverse of [`line_col`]. Columns past the end of a line clamp to
/// the line's newline.
pub fn offset_at(text: &str, line: usize, column: usize) -> usize {
    let mut current_line = 0;
    let mut current_column = 0;
    let mut at = 0;
    for ch in text.chars() {
        if current_line == line && (current_column >= column || ch == '\n') {
            return at;
        }
        if ch == '\n' {
            current_line += 1;
            current_column = 0;
        } else {
            current_column += ch.len_utf16();
        }
        at += ch.len_utf16();
    }
    at
}

/// The chars of `text` whose first UTF-16 unit lies inside `span`.
pub fn slice(text: &str, span: Span) -> String {
    let mut at = 0;
    let mut sliced = String::new();
    for ch in text.chars() {
        if at > span.end {
            break;
        }
        if at >= span.start {
            sliced.push(ch);
        }
        at += ch.len_utf16();
    }
    sliced
}

/// Length of `text` in UTF-16 units.
#[inline]
pub fn utf16_len(text: &str) -> usize {
    text.chars().map(char::len_utf16).sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn line_col_round_trips() {
        let text = "ab\ncde\n\nf";
        for offset in 0..utf16_len(text) {
            let (line, column) = line_col(text, offset);
            assert_eq!(offset_at(text, line, column), offset, "offset {offset}");
        }
        assert_eq!(line_col(text, 4), (1, 1));
        assert_eq!(line_col(text, 8), (3, 0));
    }

    #[test]
    fn slice_is_inclusive() {
        assert_eq!(slice("hello world", Span::new(6, 10)), "world");
        assert_eq!(slice("héllo", Span::new(1, 2)), "él");
        assert_eq!(slice("a😀b", Span::new(1, 2)), "😀");
        assert_eq!(slice("a😀b", Span::new(3, 3)), "b");
    }

    #[test]
    fn offsets_count_utf16_units() {
        let text = "😀x\né😀y";
        assert_eq!(utf16_len(text), 8);
        assert_eq!(line_col(text, 2), (0, 2));
        assert_eq!(line_col(text, 7), (1, 3));
        // the low surrogate belongs to the same char
        assert_eq!(line_col(text, 1), (0, 0));
        assert_eq!(offset_at(text, 1, 3), 7);
        assert_eq!(offset_at(text, 0, 9), 3);
    }

    #[test]
    fn span_helpers() {
        let span = Span::new(3, 7);
        assert_eq!(span.len(), 5);
        assert!(span.contains(3) && span.contains(7) && !span.contains(8));
        assert!(span.contains_span(Span::new(4, 6)));
        assert!(span.overlaps(Span::new(7, 9)));
        assert!(!span.overlaps(Span::new(8, 9)));
        assert_eq!(span.shift(2), Span::new(5, 9));
    }
}
